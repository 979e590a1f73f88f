//! Emulation cores for two closely related 8-bit CPUs, the Zilog Z80 and
//! the Sharp LR35902, plus the Game Boy's pulse-channel APU.
//!
//! The sub-crates are re-exported here; [`System`] wires a CPU, the data
//! bus, work RAM and the APU into a steppable machine for hosts that do
//! not need a custom memory map.

pub use zwei_apu as apu;
pub use zwei_bus as bus;
pub use zwei_cpu as cpu;

pub mod system;

pub use system::System;
