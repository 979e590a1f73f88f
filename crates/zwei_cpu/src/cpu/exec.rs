use super::instr::{Cond, Instruction, Op};
use super::regs::Flag;
use super::{Bus, Cpu, Model};

mod alu;

impl Cpu {
    fn cond_met(&self, cond: Cond) -> bool {
        match cond {
            Cond::Always => true,
            Cond::Nz => !self.flag(Flag::Z),
            Cond::Z => self.flag(Flag::Z),
            Cond::Nc => !self.flag(Flag::C),
            Cond::C => self.flag(Flag::C),
            Cond::Po => !self.flag(Flag::PV),
            Cond::Pe => self.flag(Flag::PV),
            Cond::P => !self.flag(Flag::S),
            Cond::M => self.flag(Flag::S),
        }
    }

    /// Execute one decoded instruction. Returns the cycles actually
    /// consumed: the decoded base plus the branch-taken surcharge where
    /// applicable.
    pub(crate) fn execute<B: Bus>(&mut self, bus: &mut B, instr: Instruction) -> u32 {
        let mut cycles = instr.cycles;
        match instr.op {
            Op::Nop => {}
            Op::Halt => self.halted = true,
            Op::Stop => self.stopped = true,

            Op::Ld8 { dst, src } => {
                let value = self.read_operand8(bus, src);
                self.write_operand8(bus, dst, value);
            }
            Op::Ld16 { dst, src } => {
                let value = self.read_operand16(src);
                self.write_reg16(dst, value);
            }
            Op::StoreSp { addr } => {
                let sp = self.regs.sp;
                self.write16(bus, addr, sp);
            }
            Op::StoreHl { addr } => {
                let hl = self.regs.hl();
                self.write16(bus, addr, hl);
            }
            Op::LoadHl { addr } => {
                let value = self.read16(bus, addr);
                self.regs.set_hl(value);
            }
            Op::LdSpHl => self.regs.sp = self.regs.hl(),

            Op::Inc8(target) => {
                let value = self.read_operand8(bus, target);
                let result = self.alu_inc8(value);
                self.write_operand8(bus, target, result);
            }
            Op::Dec8(target) => {
                let value = self.read_operand8(bus, target);
                let result = self.alu_dec8(value);
                self.write_operand8(bus, target, result);
            }
            Op::Inc16(reg) => {
                let value = self.read_reg16(reg).wrapping_add(1);
                self.write_reg16(reg, value);
            }
            Op::Dec16(reg) => {
                let value = self.read_reg16(reg).wrapping_sub(1);
                self.write_reg16(reg, value);
            }

            Op::Add { src, with_carry } => {
                let value = self.read_operand8(bus, src);
                self.alu_add(value, with_carry);
            }
            Op::Sub { src, with_carry } => {
                let value = self.read_operand8(bus, src);
                self.alu_sub(value, with_carry);
            }
            Op::And(src) => {
                let value = self.read_operand8(bus, src);
                self.alu_and(value);
            }
            Op::Xor(src) => {
                let value = self.read_operand8(bus, src);
                self.alu_xor(value);
            }
            Op::Or(src) => {
                let value = self.read_operand8(bus, src);
                self.alu_or(value);
            }
            Op::Cp(src) => {
                let value = self.read_operand8(bus, src);
                self.alu_cp(value);
            }
            Op::AddHl(src) => {
                let value = self.read_reg16(src);
                self.alu_add16_hl(value);
            }
            Op::AddSp { offset } => {
                let result = self.alu_add16_signed(self.regs.sp, offset);
                self.regs.sp = result;
            }
            Op::LdHlSp { offset } => {
                let result = self.alu_add16_signed(self.regs.sp, offset);
                self.regs.set_hl(result);
            }

            Op::Rlca => self.alu_rlca(),
            Op::Rrca => self.alu_rrca(),
            Op::Rla => self.alu_rla(),
            Op::Rra => self.alu_rra(),
            Op::Daa => self.alu_daa(),
            Op::Cpl => {
                self.regs.a ^= 0xFF;
                self.set_flag(Flag::H, true);
                self.set_flag(Flag::N, true);
            }
            Op::Scf => {
                self.set_flag(Flag::C, true);
                self.set_flag(Flag::N, false);
                self.set_flag(Flag::H, false);
            }
            Op::Ccf => {
                let carry = self.flag(Flag::C);
                if self.model == Model::Z80 {
                    // Z80 CCF copies the old carry into H.
                    self.set_flag(Flag::H, carry);
                } else {
                    self.set_flag(Flag::H, false);
                }
                self.set_flag(Flag::C, !carry);
                self.set_flag(Flag::N, false);
            }

            Op::Jp { cond, target } => {
                if self.cond_met(cond) {
                    self.regs.pc = target;
                    if cond != Cond::Always {
                        cycles += self.taken_extra_jp();
                    }
                }
            }
            Op::JpHl => self.regs.pc = self.regs.hl(),
            Op::Jr { cond, offset } => {
                if self.cond_met(cond) {
                    self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
                    if cond != Cond::Always {
                        cycles += self.taken_extra_jr();
                    }
                }
            }
            Op::Djnz { offset } => {
                self.regs.b = self.regs.b.wrapping_sub(1);
                if self.regs.b != 0 {
                    self.regs.pc = self.regs.pc.wrapping_add(offset as u16);
                    cycles += 5;
                }
            }
            Op::Call { cond, target } => {
                if self.cond_met(cond) {
                    let ret = self.regs.pc;
                    self.push16(bus, ret);
                    self.regs.pc = target;
                    if cond != Cond::Always {
                        cycles += self.taken_extra_call();
                    }
                }
            }
            Op::Ret { cond } => {
                if self.cond_met(cond) {
                    self.regs.pc = self.pop16(bus);
                    if cond != Cond::Always {
                        cycles += self.taken_extra_ret();
                    }
                }
            }
            Op::Reti => {
                self.regs.pc = self.pop16(bus);
                // Unlike EI, RETI enables interrupts without a delay slot.
                self.iff1 = true;
                self.iff2 = true;
            }
            Op::Retn => {
                self.regs.pc = self.pop16(bus);
                self.iff1 = self.iff2;
            }
            Op::Rst(target) => {
                let ret = self.regs.pc;
                self.push16(bus, ret);
                self.regs.pc = target;
            }
            Op::Push(reg) => {
                let value = self.read_reg16(reg);
                self.push16(bus, value);
            }
            Op::Pop(reg) => {
                let value = self.pop16(bus);
                self.write_reg16(reg, value);
            }

            Op::Ei => {
                // Deferred: interrupts come up only after the *next*
                // instruction completes (see `step`).
                self.ei_pending = true;
            }
            Op::Di => {
                self.iff1 = false;
                self.iff2 = false;
                self.ei_pending = false;
            }

            Op::ExAfAf => {
                std::mem::swap(&mut self.regs.a, &mut self.regs.shadow.a);
                std::mem::swap(&mut self.regs.f, &mut self.regs.shadow.f);
            }
            Op::Exx => {
                std::mem::swap(&mut self.regs.b, &mut self.regs.shadow.b);
                std::mem::swap(&mut self.regs.c, &mut self.regs.shadow.c);
                std::mem::swap(&mut self.regs.d, &mut self.regs.shadow.d);
                std::mem::swap(&mut self.regs.e, &mut self.regs.shadow.e);
                std::mem::swap(&mut self.regs.h, &mut self.regs.shadow.h);
                std::mem::swap(&mut self.regs.l, &mut self.regs.shadow.l);
            }
            Op::ExDeHl => {
                let de = self.regs.de();
                let hl = self.regs.hl();
                self.regs.set_de(hl);
                self.regs.set_hl(de);
            }
            Op::ExSpHl => {
                let sp = self.regs.sp;
                let from_stack = self.read16(bus, sp);
                let hl = self.regs.hl();
                self.write16(bus, sp, hl);
                self.regs.set_hl(from_stack);
            }
            Op::Ldi => self.block_move(bus, true),
            Op::Ldd => self.block_move(bus, false),
            Op::Neg => self.alu_neg(),

            Op::Rlc(target) => self.rmw8(bus, target, Self::alu_rlc),
            Op::Rrc(target) => self.rmw8(bus, target, Self::alu_rrc),
            Op::Rl(target) => self.rmw8(bus, target, Self::alu_rl),
            Op::Rr(target) => self.rmw8(bus, target, Self::alu_rr),
            Op::Sla(target) => self.rmw8(bus, target, Self::alu_sla),
            Op::Sra(target) => self.rmw8(bus, target, Self::alu_sra),
            Op::Swap(target) => self.rmw8(bus, target, Self::alu_swap),
            Op::Srl(target) => self.rmw8(bus, target, Self::alu_srl),
            Op::Bit { bit, src } => {
                let value = self.read_operand8(bus, src);
                self.alu_bit(bit, value);
            }
            Op::Res { bit, src } => {
                let value = self.read_operand8(bus, src);
                self.write_operand8(bus, src, value & !(1 << bit));
            }
            Op::Set { bit, src } => {
                let value = self.read_operand8(bus, src);
                self.write_operand8(bus, src, value | (1 << bit));
            }
        }
        cycles
    }

    /// Read-modify-write helper for the CB page.
    fn rmw8<B: Bus>(
        &mut self,
        bus: &mut B,
        target: super::operand::Operand8,
        f: fn(&mut Self, u8) -> u8,
    ) {
        let value = self.read_operand8(bus, target);
        let result = f(self, value);
        self.write_operand8(bus, target, result);
    }

    /// Z80 LDI/LDD block move step: copy (HL) to (DE), advance both
    /// pointers, decrement BC.
    fn block_move<B: Bus>(&mut self, bus: &mut B, forward: bool) {
        let hl = self.regs.hl();
        let de = self.regs.de();
        let value = bus.read8(hl);
        bus.write8(de, value);
        if forward {
            self.regs.set_hl(hl.wrapping_add(1));
            self.regs.set_de(de.wrapping_add(1));
        } else {
            self.regs.set_hl(hl.wrapping_sub(1));
            self.regs.set_de(de.wrapping_sub(1));
        }
        let bc = self.regs.bc().wrapping_sub(1);
        self.regs.set_bc(bc);
        self.set_flag(Flag::H, false);
        self.set_flag(Flag::N, false);
        self.set_flag(Flag::PV, bc != 0);
    }

    fn taken_extra_jp(&self) -> u32 {
        match self.model {
            Model::Lr35902 => 4,
            Model::Z80 => 0,
        }
    }

    fn taken_extra_jr(&self) -> u32 {
        match self.model {
            Model::Lr35902 => 4,
            Model::Z80 => 5,
        }
    }

    fn taken_extra_call(&self) -> u32 {
        match self.model {
            Model::Lr35902 => 12,
            Model::Z80 => 7,
        }
    }

    fn taken_extra_ret(&self) -> u32 {
        match self.model {
            Model::Lr35902 => 12,
            Model::Z80 => 6,
        }
    }
}
