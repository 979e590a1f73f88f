use super::{Cpu, Model};
use super::regs::Registers;

// Fallback for the all-zero seed, which xorshift would never leave.
const SEED_FALLBACK: u32 = 0xC0DE_1234;

impl Cpu {
    /// Create a core in its power-on state, with the uninitialized
    /// registers filled from an entropy-derived seed.
    pub fn new(model: Model) -> Self {
        Self::with_seed(model, rand::random())
    }

    /// Create a core with a fixed randomization seed.
    ///
    /// Real hardware comes up with arbitrary junk in most registers.
    /// Production hosts use `new` so software cannot rely on a specific
    /// pattern; tests pass a constant seed to stay reproducible.
    pub fn with_seed(model: Model, seed: u32) -> Self {
        let mut cpu = Self {
            regs: Registers::default(),
            model,
            iff1: false,
            iff2: false,
            ei_pending: false,
            halted: false,
            stopped: false,
            seed,
        };
        cpu.apply_power_on_state();
        cpu
    }

    /// Restore the power-on state, reusing the construction seed.
    pub fn reset(&mut self) {
        self.iff1 = false;
        self.iff2 = false;
        self.ei_pending = false;
        self.halted = false;
        self.stopped = false;
        self.apply_power_on_state();
    }

    fn apply_power_on_state(&mut self) {
        // xorshift32 over the stored seed.
        let mut x = if self.seed == 0 {
            SEED_FALLBACK
        } else {
            self.seed
        };
        let mut next_byte = || {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            x as u8
        };

        self.regs.b = next_byte();
        self.regs.c = next_byte();
        self.regs.d = next_byte();
        self.regs.e = next_byte();
        self.regs.h = next_byte();
        self.regs.l = next_byte();
        self.regs.i = next_byte();
        self.regs.r = next_byte();

        self.regs.shadow.a = next_byte();
        self.regs.shadow.f = next_byte();
        self.regs.shadow.b = next_byte();
        self.regs.shadow.c = next_byte();
        self.regs.shadow.d = next_byte();
        self.regs.shadow.e = next_byte();
        self.regs.shadow.h = next_byte();
        self.regs.shadow.l = next_byte();

        // A and F come up set, SP at the top of memory, PC at the reset
        // vector. F respects the variant's wired-low nibble.
        self.regs.a = 0xFF;
        self.regs.f = 0xFF & self.model.f_mask();
        self.regs.sp = 0xFFFF;
        self.regs.pc = 0x0000;
    }
}
