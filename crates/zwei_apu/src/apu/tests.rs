use std::cell::RefCell;
use std::rc::Rc;

use zwei_bus::Peripheral;

use super::*;
use crate::sink::AudioSink;

/// Sink that records every call, for asserting on the update stream.
#[derive(Default)]
struct RecordingSink {
    amplitudes: Vec<f32>,
    frequencies: Vec<f32>,
    waveforms: Vec<u8>,
    starts: u32,
    stops: u32,
}

impl AudioSink for RecordingSink {
    fn set_amplitude(&mut self, amplitude: f32) {
        self.amplitudes.push(amplitude);
    }

    fn set_frequency(&mut self, hz: f32) {
        self.frequencies.push(hz);
    }

    fn set_waveform_index(&mut self, index: u8) {
        self.waveforms.push(index);
    }

    fn start(&mut self) {
        self.starts += 1;
    }

    fn stop(&mut self) {
        self.stops += 1;
    }
}

fn apu_with_sinks() -> (Apu, Rc<RefCell<RecordingSink>>, Rc<RefCell<RecordingSink>>) {
    let sink1 = Rc::new(RefCell::new(RecordingSink::default()));
    let sink2 = Rc::new(RefCell::new(RecordingSink::default()));
    let apu = Apu::new(sink1.clone(), sink2.clone());
    (apu, sink1, sink2)
}

#[test]
fn window_covers_the_documented_range() {
    let (apu, _, _) = apu_with_sinks();
    assert_eq!(apu.first_address(), 0xFF10);
    assert_eq!(apu.last_address(), 0xFF3F);
    // 48 bytes, inclusive of both ends.
    assert_eq!(WINDOW_SIZE, 0x30);
}

#[test]
fn reads_return_the_shadow_byte() {
    let (mut apu, _, _) = apu_with_sinks();
    apu.write(0xFF11, 0xA7);
    assert_eq!(apu.read(0xFF11), 0xA7);
    // Unrecognized addresses inside the window still shadow.
    apu.write(0xFF3C, 0x5A);
    assert_eq!(apu.read(0xFF3C), 0x5A);
}

#[test]
fn frequency_recomposes_from_both_registers() {
    let (mut apu, _, _) = apu_with_sinks();
    apu.write(0xFF13, 0xFF);
    apu.write(0xFF14, 0x07);
    assert_eq!(apu.channel1().frequency(), 0x7FF);

    // Writing the low byte again picks up the current high bits.
    apu.write(0xFF13, 0x00);
    assert_eq!(apu.channel1().frequency(), 0x700);
}

#[test]
fn trigger_bit_starts_the_channel() {
    let (mut apu, sink1, _) = apu_with_sinks();
    apu.write(0xFF13, 0xFF);
    apu.write(0xFF14, 0x07);
    assert!(!apu.channel1().enabled());

    apu.write(0xFF14, 0x87);
    assert!(apu.channel1().enabled());
    assert_eq!(apu.channel1().frequency(), 0x7FF);
    assert_eq!(sink1.borrow().starts, 1);
}

#[test]
fn trigger_reloads_volume_and_expired_length() {
    let (mut apu, _, _) = apu_with_sinks();
    apu.write(0xFF12, 0xA3); // starting volume 10, decrease, period 3
    assert_eq!(apu.channel1().length_counter(), 0);

    apu.write(0xFF14, 0x80);
    assert_eq!(apu.channel1().volume(), 10);
    assert_eq!(apu.channel1().length_counter(), 64);
    assert!(apu.channel1().enabled());
}

#[test]
fn duty_and_length_load_decode() {
    let (mut apu, _sink1, sink2) = apu_with_sinks();
    apu.write(0xFF16, 0xC5); // duty 3, length load 5
    assert_eq!(apu.channel2().duty(), 3);
    assert_eq!(apu.channel2().length_counter(), 64 - 5);
    assert_eq!(sink2.borrow().waveforms.as_slice(), &[3]);
}

#[test]
fn length_expiry_disables_the_channel() {
    // length_enable=1 with a counter of 1: one 256 Hz tick kills it.
    let (mut apu, sink1, _) = apu_with_sinks();
    apu.write(0xFF11, 0x3F); // length load 63 -> counter 1
    apu.write(0xFF12, 0xF0); // full volume so the trigger is audible
    apu.write(0xFF14, 0xC0); // trigger + length enable
    assert!(apu.channel1().enabled());
    assert_eq!(apu.channel1().length_counter(), 1);

    apu.clock_256hz();
    assert_eq!(apu.channel1().length_counter(), 0);
    assert!(!apu.channel1().enabled());
    assert_eq!(sink1.borrow().stops, 1);
    assert_eq!(sink1.borrow().amplitudes.last(), Some(&0.0));
}

#[test]
fn frame_sequencer_schedule() {
    // Counter 3, envelope decreasing from 10 with period 1: length ticks
    // every call, the envelope only on the fourth (index 3).
    let (mut apu, _, _) = apu_with_sinks();
    apu.write(0xFF11, 0x3D); // length load 61 -> counter 3
    apu.write(0xFF12, 0xA1); // volume 10, decrease, period 1
    apu.write(0xFF14, 0xC0); // trigger + length enable

    apu.clock_256hz();
    assert_eq!(apu.channel1().length_counter(), 2);
    assert_eq!(apu.channel1().volume(), 10);

    apu.clock_256hz();
    assert_eq!(apu.channel1().length_counter(), 1);
    assert_eq!(apu.channel1().volume(), 10);

    apu.clock_256hz();
    assert_eq!(apu.channel1().length_counter(), 0);
    assert!(!apu.channel1().enabled());

    apu.clock_256hz();
    assert_eq!(apu.channel1().volume(), 9, "envelope fires on index 3");
}

#[test]
fn envelope_clamps_at_the_rails() {
    let (mut apu, _, _) = apu_with_sinks();
    apu.write(0xFF17, 0xE9); // volume 14, increase, period 1
    apu.write(0xFF19, 0x80);
    // Two full sequencer rounds = two envelope ticks.
    for _ in 0..8 {
        apu.clock_256hz();
    }
    assert_eq!(apu.channel2().volume(), 15, "clamped at 15");
}

#[test]
fn sweep_adjusts_frequency_upward() {
    let (mut apu, sink1, _) = apu_with_sinks();
    apu.write(0xFF10, 0x11); // period 1, add, shift 1
    apu.write(0xFF13, 0x00);
    apu.write(0xFF14, 0x01); // frequency 0x100
    apu.write(0xFF14, 0x81); // trigger
    assert_eq!(apu.channel1().frequency(), 0x100);

    apu.clock_256hz(); // index 0
    apu.clock_256hz(); // index 1: sweep tick
    assert_eq!(apu.channel1().frequency(), 0x180);
    assert!(apu.channel1().enabled());
    let last = *sink1.borrow().frequencies.last().unwrap();
    assert!((last - 131_072.0 / (2048.0 - 0x180 as f32)).abs() < 1e-3);
}

#[test]
fn sweep_overflow_disables_without_frequency_update() {
    let (mut apu, sink1, _) = apu_with_sinks();
    apu.write(0xFF10, 0x11); // period 1, add, shift 1
    apu.write(0xFF12, 0xF0); // full volume
    apu.write(0xFF13, 0xFF);
    apu.write(0xFF14, 0x07); // frequency 0x7FF
    apu.write(0xFF14, 0x87); // trigger
    let updates_before = sink1.borrow().frequencies.len();

    apu.clock_256hz();
    apu.clock_256hz(); // sweep tick: 0x7FF + 0x3FF overflows immediately
    assert!(!apu.channel1().enabled());
    assert_eq!(apu.channel1().frequency(), 0x7FF, "frequency retained");
    assert_eq!(
        sink1.borrow().frequencies.len(),
        updates_before,
        "no frequency update reached the sink"
    );
    assert_eq!(sink1.borrow().amplitudes.last(), Some(&0.0));
}

#[test]
fn sweep_overflow_check_runs_twice() {
    // 0x400 sweeps to 0x600, which is in range, but the repeated check
    // against the new frequency (0x600 + 0x300) overflows, so the
    // channel dies with the first step applied.
    let (mut apu, _, _) = apu_with_sinks();
    apu.write(0xFF10, 0x11); // period 1, add, shift 1
    apu.write(0xFF13, 0x00);
    apu.write(0xFF14, 0x04); // frequency 0x400
    apu.write(0xFF14, 0x84); // trigger

    apu.clock_256hz();
    apu.clock_256hz();
    assert_eq!(apu.channel1().frequency(), 0x600);
    assert!(!apu.channel1().enabled());
}

#[test]
fn pulse_two_has_no_sweep() {
    let (mut apu, _, _) = apu_with_sinks();
    apu.write(0xFF17, 0xF0);
    apu.write(0xFF18, 0x00);
    apu.write(0xFF19, 0x84); // trigger, frequency 0x400
    for _ in 0..8 {
        apu.clock_256hz();
    }
    assert_eq!(apu.channel2().frequency(), 0x400, "frequency never swept");
    assert!(apu.channel2().enabled());
}

#[test]
fn disabled_channel_retains_parameters_for_retrigger() {
    let (mut apu, _, _) = apu_with_sinks();
    apu.write(0xFF12, 0x70); // volume 7
    apu.write(0xFF11, 0x3F); // counter 1
    apu.write(0xFF14, 0xC0); // trigger + length enable
    apu.clock_256hz();
    assert!(!apu.channel1().enabled());

    apu.write(0xFF14, 0xC0); // re-trigger
    assert!(apu.channel1().enabled());
    assert_eq!(apu.channel1().volume(), 7);
    assert_eq!(apu.channel1().length_counter(), 64);
}
