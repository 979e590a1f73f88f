use crate::sink::SharedSink;

/// Largest frequency value representable in the two frequency registers.
const FREQUENCY_MAX: u16 = 2047;
/// Length counter reload when a trigger finds it at zero.
const LENGTH_MAX: u8 = 64;

/// Frequency sweep unit, present only on pulse 1.
#[derive(Default)]
struct Sweep {
    period: u8,
    negate: bool,
    shift: u8,
    /// 128 Hz ticks remaining until the next sweep iteration.
    timer: u8,
    /// Working copy of the frequency, reloaded on trigger.
    shadow: u16,
}

impl Sweep {
    fn calculate(&self) -> u16 {
        let delta = self.shadow >> self.shift;
        if self.negate {
            self.shadow.wrapping_sub(delta)
        } else {
            self.shadow.wrapping_add(delta)
        }
    }
}

/// One square-wave channel of the APU.
///
/// All mutation comes from two directions: register writes dispatched by
/// the APU facade, and the frame sequencer's 256/128/64 Hz clocks.
/// Derived values (amplitude, tone frequency, duty) are pushed to the
/// audio sink whenever they change.
pub struct PulseChannel {
    duty: u8,
    length_load: u8,
    length_counter: u8,
    length_enable: bool,
    starting_volume: u8,
    envelope_add: bool,
    envelope_period: u8,
    envelope_timer: u8,
    frequency: u16,
    volume: u8,
    enabled: bool,
    sweep: Option<Sweep>,
    sink: SharedSink,
    /// Last values pushed to the sink, so updates fire only on change.
    sent_amplitude: f32,
    sent_frequency: f32,
    sent_duty: u8,
}

impl PulseChannel {
    pub(crate) fn new(sink: SharedSink, with_sweep: bool) -> Self {
        Self {
            duty: 0,
            length_load: 0,
            length_counter: 0,
            length_enable: false,
            starting_volume: 0,
            envelope_add: false,
            envelope_period: 0,
            envelope_timer: 0,
            frequency: 0,
            volume: 0,
            enabled: false,
            sweep: with_sweep.then(Sweep::default),
            sink,
            sent_amplitude: 0.0,
            sent_frequency: 0.0,
            sent_duty: 0,
        }
    }

    pub fn duty(&self) -> u8 {
        self.duty
    }

    pub fn frequency(&self) -> u16 {
        self.frequency
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn length_counter(&self) -> u8 {
        self.length_counter
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    fn check_invariants(&self) {
        debug_assert!(self.duty <= 3, "duty out of range: {}", self.duty);
        debug_assert!(
            self.length_counter <= LENGTH_MAX,
            "length counter out of range: {}",
            self.length_counter
        );
        debug_assert!(self.volume <= 15, "volume out of range: {}", self.volume);
    }

    // Register decode: the APU facade has already stored the raw byte in
    // shadow RAM; these apply the unpacked fields.

    /// NRx0 `-PPP NSSS`: sweep period, negate, shift (pulse 1 only).
    pub(crate) fn write_sweep(&mut self, value: u8) {
        let Some(sweep) = self.sweep.as_mut() else {
            log::warn!("sweep register write on a channel without a sweep unit");
            return;
        };
        sweep.period = (value >> 4) & 0x07;
        sweep.negate = value & 0x08 != 0;
        sweep.shift = value & 0x07;
    }

    /// NRx1 `DDLL LLLL`: duty and length load. Writing reloads the
    /// length counter to `64 - load`.
    pub(crate) fn write_duty_length(&mut self, value: u8) {
        self.duty = value >> 6;
        self.length_load = value & 0x3F;
        self.length_counter = LENGTH_MAX - self.length_load;
        self.check_invariants();
        self.sync_sink();
    }

    /// NRx2 `VVVV APPP`: starting volume, envelope direction and period.
    pub(crate) fn write_envelope(&mut self, value: u8) {
        self.starting_volume = value >> 4;
        self.envelope_add = value & 0x08 != 0;
        self.envelope_period = value & 0x07;
    }

    /// Full 11-bit frequency, recomposed by the APU facade from the two
    /// frequency registers.
    pub(crate) fn write_frequency(&mut self, frequency: u16) {
        debug_assert!(frequency <= FREQUENCY_MAX);
        self.frequency = frequency;
        self.sync_sink();
    }

    pub(crate) fn write_length_enable(&mut self, enable: bool) {
        self.length_enable = enable;
    }

    /// Channel trigger (NRx4 bit 7).
    pub(crate) fn trigger(&mut self) {
        self.enabled = true;
        if self.length_counter == 0 {
            self.length_counter = LENGTH_MAX;
        }
        self.envelope_timer = self.envelope_period;
        self.volume = self.starting_volume;
        if let Some(sweep) = self.sweep.as_mut() {
            sweep.shadow = self.frequency;
            sweep.timer = sweep.period;
        }
        self.check_invariants();
        self.sync_sink();
        // Restart the waveform phase; sinks that cannot express this
        // treat start() as a no-op.
        self.sink.borrow_mut().start();
    }

    // Frame sequencer clocks.

    /// 256 Hz: length counter countdown.
    pub(crate) fn clock_length(&mut self) {
        if self.length_enable && self.length_counter > 0 {
            self.length_counter -= 1;
            if self.length_counter == 0 {
                self.disable();
            }
        }
    }

    /// 128 Hz: frequency sweep (pulse 1 only).
    pub(crate) fn clock_sweep(&mut self) {
        let Some(sweep) = self.sweep.as_mut() else {
            return;
        };
        if sweep.period == 0 {
            return;
        }
        sweep.timer = sweep.timer.saturating_sub(1);
        if sweep.timer > 0 {
            return;
        }
        sweep.timer = sweep.period;
        if sweep.shift == 0 {
            return;
        }

        let new_freq = sweep.calculate();
        if new_freq > FREQUENCY_MAX {
            // Overflow kills the channel; the stale frequency is never
            // pushed to the sink.
            self.disable();
            return;
        }
        sweep.shadow = new_freq;
        self.frequency = new_freq;
        // The overflow check runs a second time against the updated
        // frequency, without applying the result.
        let overflow_check = self.sweep.as_ref().map(Sweep::calculate);
        self.sync_sink();
        if overflow_check.is_some_and(|f| f > FREQUENCY_MAX) {
            self.disable();
        }
    }

    /// 64 Hz: volume envelope.
    pub(crate) fn clock_envelope(&mut self) {
        if self.envelope_period == 0 {
            return;
        }
        self.envelope_timer = self.envelope_timer.saturating_sub(1);
        if self.envelope_timer > 0 {
            return;
        }
        self.envelope_timer = self.envelope_period;
        let volume = if self.envelope_add {
            (self.volume + 1).min(15)
        } else {
            self.volume.saturating_sub(1)
        };
        if volume != self.volume {
            self.volume = volume;
            self.check_invariants();
            self.sync_sink();
        }
    }

    fn disable(&mut self) {
        self.enabled = false;
        // Amplitude drops to zero; every other parameter is retained so
        // a re-trigger resumes cleanly.
        self.sync_sink();
        self.sink.borrow_mut().stop();
    }

    /// Tone frequency in hertz for the current 11-bit register value.
    pub fn frequency_hz(&self) -> f32 {
        131_072.0 / (2048 - self.frequency) as f32
    }

    /// Push derived values to the sink for anything that changed.
    fn sync_sink(&mut self) {
        let amplitude = if self.enabled {
            self.volume as f32 / 15.0
        } else {
            0.0
        };
        let frequency = self.frequency_hz();

        let mut sink = self.sink.borrow_mut();
        if amplitude != self.sent_amplitude {
            sink.set_amplitude(amplitude);
            self.sent_amplitude = amplitude;
        }
        if frequency != self.sent_frequency {
            sink.set_frequency(frequency);
            self.sent_frequency = frequency;
        }
        if self.duty != self.sent_duty {
            sink.set_waveform_index(self.duty);
            self.sent_duty = self.duty;
        }
    }
}
