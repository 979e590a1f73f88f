pub mod cpu;

pub use cpu::decode::DecodeError;
pub use cpu::instr::{Cond, Instruction, Op};
pub use cpu::operand::{Addr, HighAddr, Operand8, Operand16, Reg8, Reg16};
pub use cpu::regs::{Flag, Registers, ShadowRegisters};
pub use cpu::{Bus, Cpu, Model};
