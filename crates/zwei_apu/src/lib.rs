pub mod apu;
pub mod pulse;
pub mod sink;

pub use apu::{Apu, APU_FIRST_ADDRESS, APU_LAST_ADDRESS};
pub use pulse::PulseChannel;
pub use sink::{AudioSink, NullSink, SharedSink};
