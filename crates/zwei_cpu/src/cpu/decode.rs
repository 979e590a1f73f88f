use super::instr::{Cond, Instruction, Op};
use super::operand::{Addr, HighAddr, Operand8, Operand16, Reg8, Reg16};
use super::{Bus, Cpu, Model};

/// An opcode the active variant does not implement.
///
/// `pc` is the address of the first opcode byte; `prefix` is set for the
/// 0xCB and 0xED pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeError {
    pub pc: u16,
    pub opcode: u8,
    pub prefix: Option<u8>,
}

impl std::error::Error for DecodeError {}

impl std::fmt::Display for DecodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.prefix {
            Some(prefix) => write!(
                f,
                "unrecognized opcode {prefix:#04X} {:#04X} at PC={:#06X}",
                self.opcode, self.pc
            ),
            None => write!(
                f,
                "unrecognized opcode {:#04X} at PC={:#06X}",
                self.opcode, self.pc
            ),
        }
    }
}

/// Register order used by the 0x40..=0xBF quadrants and the CB page:
/// 0=B, 1=C, 2=D, 3=E, 4=H, 5=L, 6=(HL), 7=A.
fn reg_operand(index: u8) -> Operand8 {
    match index & 0x07 {
        0 => Operand8::Reg(Reg8::B),
        1 => Operand8::Reg(Reg8::C),
        2 => Operand8::Reg(Reg8::D),
        3 => Operand8::Reg(Reg8::E),
        4 => Operand8::Reg(Reg8::H),
        5 => Operand8::Reg(Reg8::L),
        6 => Operand8::Mem(Addr::Hl),
        _ => Operand8::Reg(Reg8::A),
    }
}

fn is_mem(op: Operand8) -> bool {
    matches!(op, Operand8::Mem(_))
}

impl Cpu {
    /// Variant-dependent cycle count: the LR35902 column uses DMG T-cycle
    /// timings, the Z80 column the Zilog datasheet timings.
    fn cyc(&self, lr: u32, z80: u32) -> u32 {
        match self.model {
            Model::Lr35902 => lr,
            Model::Z80 => z80,
        }
    }

    /// Fetch, decode and consume one instruction encoding at PC.
    ///
    /// Operand bytes are captured into the returned instruction and PC is
    /// left pointing at the next instruction.
    pub(crate) fn decode<B: Bus>(&mut self, bus: &mut B) -> Result<Instruction, DecodeError> {
        let pc = self.regs.pc;
        let opcode = self.fetch8(bus);
        self.bump_refresh();

        match opcode {
            0xCB => {
                let inner = self.fetch8(bus);
                self.bump_refresh();
                self.decode_cb(pc, inner)
            }
            0xED if self.model == Model::Z80 => {
                let inner = self.fetch8(bus);
                self.bump_refresh();
                self.decode_ed(pc, inner)
            }
            _ => match self.decode_variant(bus, opcode) {
                Some(instr) => Ok(instr),
                None => self.decode_common(bus, pc, opcode),
            },
        }
    }

    /// Per-variant override table. Consulted before the shared table so a
    /// variant can claim opcodes whose meaning differs between the two
    /// CPUs or which exist on only one of them.
    fn decode_variant<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> Option<Instruction> {
        match self.model {
            Model::Lr35902 => self.decode_lr35902(bus, opcode),
            Model::Z80 => self.decode_z80(bus, opcode),
        }
    }

    fn decode_lr35902<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> Option<Instruction> {
        let instr = |op, cycles| Some(Instruction { op, cycles });
        match opcode {
            0x08 => {
                let addr = self.fetch16(bus);
                instr(Op::StoreSp { addr }, 20)
            }
            0x10 => {
                // STOP is encoded as two bytes; the padding byte is
                // discarded.
                let _ = self.fetch8(bus);
                instr(Op::Stop, 4)
            }
            0x22 => instr(
                Op::Ld8 {
                    dst: Operand8::Mem(Addr::HlInc),
                    src: Operand8::Reg(Reg8::A),
                },
                8,
            ),
            0x2A => instr(
                Op::Ld8 {
                    dst: Operand8::Reg(Reg8::A),
                    src: Operand8::Mem(Addr::HlInc),
                },
                8,
            ),
            0x32 => instr(
                Op::Ld8 {
                    dst: Operand8::Mem(Addr::HlDec),
                    src: Operand8::Reg(Reg8::A),
                },
                8,
            ),
            0x3A => instr(
                Op::Ld8 {
                    dst: Operand8::Reg(Reg8::A),
                    src: Operand8::Mem(Addr::HlDec),
                },
                8,
            ),
            0xD9 => instr(Op::Reti, 16),
            0xE0 => {
                let offset = self.fetch8(bus);
                instr(
                    Op::Ld8 {
                        dst: Operand8::High(HighAddr::Imm(offset)),
                        src: Operand8::Reg(Reg8::A),
                    },
                    12,
                )
            }
            0xE2 => instr(
                Op::Ld8 {
                    dst: Operand8::High(HighAddr::C),
                    src: Operand8::Reg(Reg8::A),
                },
                8,
            ),
            0xE8 => {
                let offset = self.fetch8(bus) as i8;
                instr(Op::AddSp { offset }, 16)
            }
            0xEA => {
                let addr = self.fetch16(bus);
                instr(
                    Op::Ld8 {
                        dst: Operand8::Mem(Addr::Abs(addr)),
                        src: Operand8::Reg(Reg8::A),
                    },
                    16,
                )
            }
            0xF0 => {
                let offset = self.fetch8(bus);
                instr(
                    Op::Ld8 {
                        dst: Operand8::Reg(Reg8::A),
                        src: Operand8::High(HighAddr::Imm(offset)),
                    },
                    12,
                )
            }
            0xF2 => instr(
                Op::Ld8 {
                    dst: Operand8::Reg(Reg8::A),
                    src: Operand8::High(HighAddr::C),
                },
                8,
            ),
            0xF8 => {
                let offset = self.fetch8(bus) as i8;
                instr(Op::LdHlSp { offset }, 12)
            }
            0xFA => {
                let addr = self.fetch16(bus);
                instr(
                    Op::Ld8 {
                        dst: Operand8::Reg(Reg8::A),
                        src: Operand8::Mem(Addr::Abs(addr)),
                    },
                    16,
                )
            }
            _ => None,
        }
    }

    fn decode_z80<B: Bus>(&mut self, bus: &mut B, opcode: u8) -> Option<Instruction> {
        let instr = |op, cycles| Some(Instruction { op, cycles });
        match opcode {
            0x08 => instr(Op::ExAfAf, 4),
            0x10 => {
                let offset = self.fetch8(bus) as i8;
                instr(Op::Djnz { offset }, 8)
            }
            0x22 => {
                let addr = self.fetch16(bus);
                instr(Op::StoreHl { addr }, 16)
            }
            0x2A => {
                let addr = self.fetch16(bus);
                instr(Op::LoadHl { addr }, 16)
            }
            0x32 => {
                let addr = self.fetch16(bus);
                instr(
                    Op::Ld8 {
                        dst: Operand8::Mem(Addr::Abs(addr)),
                        src: Operand8::Reg(Reg8::A),
                    },
                    13,
                )
            }
            0x3A => {
                let addr = self.fetch16(bus);
                instr(
                    Op::Ld8 {
                        dst: Operand8::Reg(Reg8::A),
                        src: Operand8::Mem(Addr::Abs(addr)),
                    },
                    13,
                )
            }
            0xD9 => instr(Op::Exx, 4),
            0xE0 => instr(Op::Ret { cond: Cond::Po }, 5),
            0xE8 => instr(Op::Ret { cond: Cond::Pe }, 5),
            0xF0 => instr(Op::Ret { cond: Cond::P }, 5),
            0xF8 => instr(Op::Ret { cond: Cond::M }, 5),
            0xE2 | 0xEA | 0xF2 | 0xFA => {
                let cond = match opcode {
                    0xE2 => Cond::Po,
                    0xEA => Cond::Pe,
                    0xF2 => Cond::P,
                    _ => Cond::M,
                };
                let target = self.fetch16(bus);
                instr(Op::Jp { cond, target }, 10)
            }
            0xE4 | 0xEC | 0xF4 | 0xFC => {
                let cond = match opcode {
                    0xE4 => Cond::Po,
                    0xEC => Cond::Pe,
                    0xF4 => Cond::P,
                    _ => Cond::M,
                };
                let target = self.fetch16(bus);
                instr(Op::Call { cond, target }, 10)
            }
            0xE3 => instr(Op::ExSpHl, 19),
            0xEB => instr(Op::ExDeHl, 4),
            _ => None,
        }
    }

    /// Z80 0xED page. Only the portion of the page this core implements
    /// is decoded; the rest is a decode error (notably the I/O-port block,
    /// which has no counterpart on this bus).
    fn decode_ed(&mut self, pc: u16, opcode: u8) -> Result<Instruction, DecodeError> {
        let instr = |op, cycles| Ok(Instruction { op, cycles });
        match opcode {
            0x44 => instr(Op::Neg, 8),
            0x45 => instr(Op::Retn, 14),
            // RETI shares the RETN datapath, IFF2 copy included.
            0x4D => instr(Op::Retn, 14),
            0xA0 => instr(Op::Ldi, 16),
            0xA8 => instr(Op::Ldd, 16),
            _ => Err(DecodeError {
                pc,
                opcode,
                prefix: Some(0xED),
            }),
        }
    }

    /// Shared decode table for the 8080-derived core common to both
    /// variants. Opcodes claimed by a variant override never reach this.
    fn decode_common<B: Bus>(
        &mut self,
        bus: &mut B,
        pc: u16,
        opcode: u8,
    ) -> Result<Instruction, DecodeError> {
        let instr = |op, cycles| Ok(Instruction { op, cycles });
        match opcode {
            0x00 => instr(Op::Nop, 4),

            // LD rr,nn
            0x01 | 0x11 | 0x21 | 0x31 => {
                let dst = match opcode {
                    0x01 => Reg16::Bc,
                    0x11 => Reg16::De,
                    0x21 => Reg16::Hl,
                    _ => Reg16::Sp,
                };
                let value = self.fetch16(bus);
                instr(
                    Op::Ld16 {
                        dst,
                        src: Operand16::Imm(value),
                    },
                    self.cyc(12, 10),
                )
            }

            // LD (BC)/(DE),A and LD A,(BC)/(DE)
            0x02 => instr(
                Op::Ld8 {
                    dst: Operand8::Mem(Addr::Bc),
                    src: Operand8::Reg(Reg8::A),
                },
                self.cyc(8, 7),
            ),
            0x12 => instr(
                Op::Ld8 {
                    dst: Operand8::Mem(Addr::De),
                    src: Operand8::Reg(Reg8::A),
                },
                self.cyc(8, 7),
            ),
            0x0A => instr(
                Op::Ld8 {
                    dst: Operand8::Reg(Reg8::A),
                    src: Operand8::Mem(Addr::Bc),
                },
                self.cyc(8, 7),
            ),
            0x1A => instr(
                Op::Ld8 {
                    dst: Operand8::Reg(Reg8::A),
                    src: Operand8::Mem(Addr::De),
                },
                self.cyc(8, 7),
            ),

            // INC rr / DEC rr
            0x03 | 0x13 | 0x23 | 0x33 => {
                let reg = match opcode {
                    0x03 => Reg16::Bc,
                    0x13 => Reg16::De,
                    0x23 => Reg16::Hl,
                    _ => Reg16::Sp,
                };
                instr(Op::Inc16(reg), self.cyc(8, 6))
            }
            0x0B | 0x1B | 0x2B | 0x3B => {
                let reg = match opcode {
                    0x0B => Reg16::Bc,
                    0x1B => Reg16::De,
                    0x2B => Reg16::Hl,
                    _ => Reg16::Sp,
                };
                instr(Op::Dec16(reg), self.cyc(8, 6))
            }

            // INC r / DEC r (the y field selects the register; 6 = (HL))
            0x04 | 0x0C | 0x14 | 0x1C | 0x24 | 0x2C | 0x34 | 0x3C => {
                let target = reg_operand(opcode >> 3);
                let cycles = if is_mem(target) {
                    self.cyc(12, 11)
                } else {
                    4
                };
                instr(Op::Inc8(target), cycles)
            }
            0x05 | 0x0D | 0x15 | 0x1D | 0x25 | 0x2D | 0x35 | 0x3D => {
                let target = reg_operand(opcode >> 3);
                let cycles = if is_mem(target) {
                    self.cyc(12, 11)
                } else {
                    4
                };
                instr(Op::Dec8(target), cycles)
            }

            // LD r,n
            0x06 | 0x0E | 0x16 | 0x1E | 0x26 | 0x2E | 0x36 | 0x3E => {
                let dst = reg_operand(opcode >> 3);
                let value = self.fetch8(bus);
                let cycles = if is_mem(dst) { self.cyc(12, 10) } else { self.cyc(8, 7) };
                instr(
                    Op::Ld8 {
                        dst,
                        src: Operand8::Imm(value),
                    },
                    cycles,
                )
            }

            // Accumulator rotates
            0x07 => instr(Op::Rlca, 4),
            0x0F => instr(Op::Rrca, 4),
            0x17 => instr(Op::Rla, 4),
            0x1F => instr(Op::Rra, 4),

            // ADD HL,rr
            0x09 | 0x19 | 0x29 | 0x39 => {
                let src = match opcode {
                    0x09 => Reg16::Bc,
                    0x19 => Reg16::De,
                    0x29 => Reg16::Hl,
                    _ => Reg16::Sp,
                };
                instr(Op::AddHl(src), self.cyc(8, 11))
            }

            // Relative jumps
            0x18 => {
                let offset = self.fetch8(bus) as i8;
                instr(Op::Jr { cond: Cond::Always, offset }, 12)
            }
            0x20 | 0x28 | 0x30 | 0x38 => {
                let cond = match opcode {
                    0x20 => Cond::Nz,
                    0x28 => Cond::Z,
                    0x30 => Cond::Nc,
                    _ => Cond::C,
                };
                let offset = self.fetch8(bus) as i8;
                instr(Op::Jr { cond, offset }, self.cyc(8, 7))
            }

            0x27 => instr(Op::Daa, 4),
            0x2F => instr(Op::Cpl, 4),
            0x37 => instr(Op::Scf, 4),
            0x3F => instr(Op::Ccf, 4),

            0x76 => instr(Op::Halt, 4),

            // LD r,r'
            0x40..=0x7F => {
                let dst = reg_operand(opcode >> 3);
                let src = reg_operand(opcode);
                let cycles = if is_mem(dst) || is_mem(src) {
                    self.cyc(8, 7)
                } else {
                    4
                };
                instr(Op::Ld8 { dst, src }, cycles)
            }

            // ALU A,r
            0x80..=0xBF => {
                let src = reg_operand(opcode);
                let cycles = if is_mem(src) { self.cyc(8, 7) } else { 4 };
                let op = match (opcode >> 3) & 0x07 {
                    0 => Op::Add { src, with_carry: false },
                    1 => Op::Add { src, with_carry: true },
                    2 => Op::Sub { src, with_carry: false },
                    3 => Op::Sub { src, with_carry: true },
                    4 => Op::And(src),
                    5 => Op::Xor(src),
                    6 => Op::Or(src),
                    _ => Op::Cp(src),
                };
                instr(op, cycles)
            }

            // ALU A,n
            0xC6 | 0xCE | 0xD6 | 0xDE | 0xE6 | 0xEE | 0xF6 | 0xFE => {
                let src = Operand8::Imm(self.fetch8(bus));
                let op = match (opcode >> 3) & 0x07 {
                    0 => Op::Add { src, with_carry: false },
                    1 => Op::Add { src, with_carry: true },
                    2 => Op::Sub { src, with_carry: false },
                    3 => Op::Sub { src, with_carry: true },
                    4 => Op::And(src),
                    5 => Op::Xor(src),
                    6 => Op::Or(src),
                    _ => Op::Cp(src),
                };
                instr(op, self.cyc(8, 7))
            }

            // Returns
            0xC0 | 0xC8 | 0xD0 | 0xD8 => {
                let cond = match opcode {
                    0xC0 => Cond::Nz,
                    0xC8 => Cond::Z,
                    0xD0 => Cond::Nc,
                    _ => Cond::C,
                };
                instr(Op::Ret { cond }, self.cyc(8, 5))
            }
            0xC9 => instr(Op::Ret { cond: Cond::Always }, self.cyc(16, 10)),

            // PUSH / POP
            0xC1 | 0xD1 | 0xE1 | 0xF1 => {
                let reg = match opcode {
                    0xC1 => Reg16::Bc,
                    0xD1 => Reg16::De,
                    0xE1 => Reg16::Hl,
                    _ => Reg16::Af,
                };
                instr(Op::Pop(reg), self.cyc(12, 10))
            }
            0xC5 | 0xD5 | 0xE5 | 0xF5 => {
                let reg = match opcode {
                    0xC5 => Reg16::Bc,
                    0xD5 => Reg16::De,
                    0xE5 => Reg16::Hl,
                    _ => Reg16::Af,
                };
                instr(Op::Push(reg), self.cyc(16, 11))
            }

            // Absolute jumps
            0xC3 => {
                let target = self.fetch16(bus);
                instr(Op::Jp { cond: Cond::Always, target }, self.cyc(16, 10))
            }
            0xC2 | 0xCA | 0xD2 | 0xDA => {
                let cond = match opcode {
                    0xC2 => Cond::Nz,
                    0xCA => Cond::Z,
                    0xD2 => Cond::Nc,
                    _ => Cond::C,
                };
                let target = self.fetch16(bus);
                instr(Op::Jp { cond, target }, self.cyc(12, 10))
            }
            0xE9 => instr(Op::JpHl, 4),

            // Calls
            0xCD => {
                let target = self.fetch16(bus);
                instr(Op::Call { cond: Cond::Always, target }, self.cyc(24, 17))
            }
            0xC4 | 0xCC | 0xD4 | 0xDC => {
                let cond = match opcode {
                    0xC4 => Cond::Nz,
                    0xCC => Cond::Z,
                    0xD4 => Cond::Nc,
                    _ => Cond::C,
                };
                let target = self.fetch16(bus);
                instr(Op::Call { cond, target }, self.cyc(12, 10))
            }

            // Restarts
            0xC7 | 0xCF | 0xD7 | 0xDF | 0xE7 | 0xEF | 0xF7 | 0xFF => {
                let target = (opcode & 0x38) as u16;
                instr(Op::Rst(target), self.cyc(16, 11))
            }

            0xF3 => instr(Op::Di, 4),
            0xFB => instr(Op::Ei, 4),
            0xF9 => instr(Op::LdSpHl, self.cyc(8, 6)),

            _ => Err(DecodeError {
                pc,
                opcode,
                prefix: None,
            }),
        }
    }

    /// 0xCB bit-operation page, shared by both variants apart from the
    /// 0x30..=0x37 row (SWAP on the LR35902, unimplemented undocumented
    /// shifts on the Z80).
    fn decode_cb(&mut self, pc: u16, opcode: u8) -> Result<Instruction, DecodeError> {
        let target = reg_operand(opcode);
        let mem = is_mem(target);
        let instr = |op, cycles| Ok(Instruction { op, cycles });

        match opcode >> 6 {
            0 => {
                let cycles = if mem { self.cyc(16, 15) } else { 8 };
                let op = match (opcode >> 3) & 0x07 {
                    0 => Op::Rlc(target),
                    1 => Op::Rrc(target),
                    2 => Op::Rl(target),
                    3 => Op::Rr(target),
                    4 => Op::Sla(target),
                    5 => Op::Sra(target),
                    6 => {
                        if self.model != Model::Lr35902 {
                            return Err(DecodeError {
                                pc,
                                opcode,
                                prefix: Some(0xCB),
                            });
                        }
                        Op::Swap(target)
                    }
                    _ => Op::Srl(target),
                };
                instr(op, cycles)
            }
            1 => {
                let bit = (opcode >> 3) & 0x07;
                let cycles = if mem { 12 } else { 8 };
                instr(Op::Bit { bit, src: target }, cycles)
            }
            2 => {
                let bit = (opcode >> 3) & 0x07;
                let cycles = if mem { self.cyc(16, 15) } else { 8 };
                instr(Op::Res { bit, src: target }, cycles)
            }
            _ => {
                let bit = (opcode >> 3) & 0x07;
                let cycles = if mem { self.cyc(16, 15) } else { 8 };
                instr(Op::Set { bit, src: target }, cycles)
            }
        }
    }
}
