use zwei_bus::{Peripheral, Ram};

use crate::pulse::PulseChannel;
use crate::sink::SharedSink;

/// First address of the APU register window (NR10).
pub const APU_FIRST_ADDRESS: u16 = 0xFF10;
/// Last address of the APU register window, inclusive.
pub const APU_LAST_ADDRESS: u16 = 0xFF3F;
/// 0xFF10..=0xFF3F inclusive is exactly 0x30 bytes.
const WINDOW_SIZE: usize = (APU_LAST_ADDRESS - APU_FIRST_ADDRESS + 1) as usize;

/// The APU register file and its two pulse channels.
///
/// Registers itself on the data bus at 0xFF10..=0xFF3F. Every write
/// lands in shadow RAM and, for the channel registers, re-decodes the
/// affected channel parameter. Reads return the shadow byte. The host
/// drives `clock_256hz` from its frame clock.
pub struct Apu {
    shadow: Ram,
    pulse1: PulseChannel,
    pulse2: PulseChannel,
    /// Frame sequencer index, 0..=3.
    frame: u8,
}

impl Apu {
    pub fn new(pulse1_sink: SharedSink, pulse2_sink: SharedSink) -> Self {
        Self {
            shadow: Ram::new(APU_FIRST_ADDRESS, WINDOW_SIZE),
            pulse1: PulseChannel::new(pulse1_sink, true),
            pulse2: PulseChannel::new(pulse2_sink, false),
            frame: 0,
        }
    }

    pub fn channel1(&self) -> &PulseChannel {
        &self.pulse1
    }

    pub fn channel2(&self) -> &PulseChannel {
        &self.pulse2
    }

    /// Current frame sequencer index.
    pub fn sequencer_step(&self) -> u8 {
        self.frame
    }

    /// External 256 Hz frame clock.
    ///
    /// Length counters tick on every call; the sweep runs at 128 Hz
    /// (indices 1 and 3) and the envelopes at 64 Hz (index 3).
    pub fn clock_256hz(&mut self) {
        let index = self.frame;
        self.frame = (self.frame + 1) & 0x03;

        self.pulse1.clock_length();
        self.pulse2.clock_length();
        if index == 1 || index == 3 {
            self.pulse1.clock_sweep();
        }
        if index == 3 {
            self.pulse1.clock_envelope();
            self.pulse2.clock_envelope();
        }
    }

    fn shadow_byte(&mut self, addr: u16) -> u8 {
        self.shadow.read(addr)
    }

    /// 11-bit frequency recomposed from the shadow copies of the two
    /// frequency registers. `low`/`high` are the register addresses.
    fn frequency_from_shadow(&mut self, low: u16, high: u16) -> u16 {
        let low = self.shadow_byte(low) as u16;
        let high = (self.shadow_byte(high) as u16 & 0x07) << 8;
        high | low
    }

    fn dispatch(&mut self, addr: u16, value: u8) {
        match addr {
            // Pulse 1: NR10..NR14.
            0xFF10 => self.pulse1.write_sweep(value),
            0xFF11 => self.pulse1.write_duty_length(value),
            0xFF12 => self.pulse1.write_envelope(value),
            0xFF13 => {
                let freq = self.frequency_from_shadow(0xFF13, 0xFF14);
                self.pulse1.write_frequency(freq);
            }
            0xFF14 => {
                let freq = self.frequency_from_shadow(0xFF13, 0xFF14);
                self.pulse1.write_length_enable(value & 0x40 != 0);
                self.pulse1.write_frequency(freq);
                if value & 0x80 != 0 {
                    self.pulse1.trigger();
                }
            }

            // 0xFF15 has no channel behind it.

            // Pulse 2: NR21..NR24 (no sweep).
            0xFF16 => self.pulse2.write_duty_length(value),
            0xFF17 => self.pulse2.write_envelope(value),
            0xFF18 => {
                let freq = self.frequency_from_shadow(0xFF18, 0xFF19);
                self.pulse2.write_frequency(freq);
            }
            0xFF19 => {
                let freq = self.frequency_from_shadow(0xFF18, 0xFF19);
                self.pulse2.write_length_enable(value & 0x40 != 0);
                self.pulse2.write_frequency(freq);
                if value & 0x80 != 0 {
                    self.pulse2.trigger();
                }
            }

            // Everything else in the window is shadow storage only.
            _ => {}
        }
    }
}

impl Peripheral for Apu {
    fn first_address(&self) -> u16 {
        APU_FIRST_ADDRESS
    }

    fn last_address(&self) -> u16 {
        APU_LAST_ADDRESS
    }

    fn read(&mut self, addr: u16) -> u8 {
        self.shadow.read(addr)
    }

    fn write(&mut self, addr: u16, value: u8) {
        // Shadow first: the dispatcher recomposes multi-register values
        // from the freshly written state.
        self.shadow.write(addr, value);
        self.dispatch(addr, value);
    }
}

#[cfg(test)]
mod tests;
