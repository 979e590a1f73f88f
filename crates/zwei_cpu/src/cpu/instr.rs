use super::operand::{Operand8, Operand16, Reg16};

/// Branch conditions. PO/PE/P/M test parity and sign and exist only on
/// the Z80; the shared decoder never emits them for the LR35902.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cond {
    Always,
    Nz,
    Z,
    Nc,
    C,
    Po,
    Pe,
    P,
    M,
}

/// One decoded instruction: an operation with its operand bindings plus
/// the base cycle count for the active variant.
///
/// Conditional control flow stores the not-taken cost here; `Cpu::step`
/// reports the actual total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub op: Op,
    pub cycles: u32,
}

/// Opcode families. Operands are captured at decode time, immediates
/// included, so executing an `Op` never touches the instruction stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Nop,
    Halt,
    /// LR35902 low-power stop (the padding byte is consumed at decode).
    Stop,

    Ld8 { dst: Operand8, src: Operand8 },
    Ld16 { dst: Reg16, src: Operand16 },
    /// LD (nn),SP -- LR35902.
    StoreSp { addr: u16 },
    /// LD (nn),HL -- Z80.
    StoreHl { addr: u16 },
    /// LD HL,(nn) -- Z80.
    LoadHl { addr: u16 },

    Inc8(Operand8),
    Dec8(Operand8),
    Inc16(Reg16),
    Dec16(Reg16),

    Add { src: Operand8, with_carry: bool },
    Sub { src: Operand8, with_carry: bool },
    And(Operand8),
    Xor(Operand8),
    Or(Operand8),
    Cp(Operand8),
    AddHl(Reg16),
    /// ADD SP,n -- LR35902, signed offset.
    AddSp { offset: i8 },
    /// LD HL,SP+n -- LR35902, signed offset.
    LdHlSp { offset: i8 },
    LdSpHl,

    Rlca,
    Rrca,
    Rla,
    Rra,
    Daa,
    Cpl,
    Scf,
    Ccf,

    Jp { cond: Cond, target: u16 },
    JpHl,
    Jr { cond: Cond, offset: i8 },
    /// DJNZ -- Z80.
    Djnz { offset: i8 },
    Call { cond: Cond, target: u16 },
    Ret { cond: Cond },
    /// LR35902: RET plus immediate interrupt enable.
    Reti,
    /// Z80 (ED page): return from NMI, copying IFF2 back into IFF1.
    Retn,
    Rst(u16),
    Push(Reg16),
    Pop(Reg16),

    Ei,
    Di,

    /// EX AF,AF' -- Z80.
    ExAfAf,
    /// EXX -- Z80.
    Exx,
    /// EX DE,HL -- Z80.
    ExDeHl,
    /// EX (SP),HL -- Z80.
    ExSpHl,
    /// Block move (HL)->(DE) with HL++, DE++, BC-- -- Z80 (ED page).
    Ldi,
    /// Block move variant with HL--, DE-- -- Z80 (ED page).
    Ldd,
    /// NEG -- Z80 (ED page).
    Neg,

    // 0xCB bit-operation page.
    Rlc(Operand8),
    Rrc(Operand8),
    Rl(Operand8),
    Rr(Operand8),
    Sla(Operand8),
    Sra(Operand8),
    /// SWAP -- LR35902 only (CB 0x30..=0x37).
    Swap(Operand8),
    Srl(Operand8),
    Bit { bit: u8, src: Operand8 },
    Res { bit: u8, src: Operand8 },
    Set { bit: u8, src: Operand8 },
}
