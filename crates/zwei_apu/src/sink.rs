use std::cell::RefCell;
use std::rc::Rc;

/// Capability set a pulse channel needs from the audio backend.
///
/// The APU is a pure state engine; whatever actually makes sound lives
/// behind this trait. An amplitude of 0 must be indistinguishable from
/// `stop`.
pub trait AudioSink {
    /// Output level in `[0, 1]`.
    fn set_amplitude(&mut self, amplitude: f32);
    /// Tone frequency in hertz, always positive.
    fn set_frequency(&mut self, hz: f32);
    /// Duty selector, 0..=3 (12.5% / 25% / 50% / 75%).
    fn set_waveform_index(&mut self, index: u8);
    /// Restart the waveform from its initial phase.
    fn start(&mut self);
    fn stop(&mut self);
}

/// Non-owning handle to a sink. Channels hold one of these; the host
/// owns the backend and must keep it alive for the channel's lifetime.
pub type SharedSink = Rc<RefCell<dyn AudioSink>>;

/// Sink that discards every update. Useful for headless hosts and tests
/// that only care about channel state.
#[derive(Default)]
pub struct NullSink;

impl AudioSink for NullSink {
    fn set_amplitude(&mut self, _amplitude: f32) {}
    fn set_frequency(&mut self, _hz: f32) {}
    fn set_waveform_index(&mut self, _index: u8) {}
    fn start(&mut self) {}
    fn stop(&mut self) {}
}
