use std::cell::RefCell;
use std::rc::Rc;

use zwei_apu::{Apu, NullSink, SharedSink};
use zwei_bus::{DataBus, Ram};
use zwei_cpu::{Cpu, Model};

/// Default memory map of the assembled machine.
///
/// Hosts with different needs build their own bus instead; this layout
/// covers program RAM at the reset vector, the classic work-RAM window,
/// high RAM, and the APU register file.
const PROGRAM_RAM_BASE: u16 = 0x0000;
const PROGRAM_RAM_SIZE: usize = 0x4000;
const WORK_RAM_BASE: u16 = 0xC000;
const WORK_RAM_SIZE: usize = 0x2000;
const HIGH_RAM_BASE: u16 = 0xFF80;
const HIGH_RAM_SIZE: usize = 0x7F;

/// A CPU, its bus, RAM windows, and the APU, wired together.
///
/// The host owns the system and interleaves `step` with `clock_256hz`
/// at whatever pace it wants; the core does not own time.
pub struct System {
    pub cpu: Cpu,
    pub bus: DataBus,
    apu: Rc<RefCell<Apu>>,
}

impl System {
    /// Build a machine around the given CPU variant and audio sinks.
    pub fn new(model: Model, pulse1_sink: SharedSink, pulse2_sink: SharedSink) -> Self {
        Self::assemble(Cpu::new(model), pulse1_sink, pulse2_sink)
    }

    /// Build a machine with no audio backend and a fixed register
    /// randomization seed. Intended for tests and headless tooling.
    pub fn headless(model: Model, seed: u32) -> Self {
        Self::assemble(
            Cpu::with_seed(model, seed),
            Rc::new(RefCell::new(NullSink)),
            Rc::new(RefCell::new(NullSink)),
        )
    }

    fn assemble(cpu: Cpu, pulse1_sink: SharedSink, pulse2_sink: SharedSink) -> Self {
        let mut bus = DataBus::new();
        bus.register(Rc::new(RefCell::new(Ram::new(
            PROGRAM_RAM_BASE,
            PROGRAM_RAM_SIZE,
        ))))
        .expect("program RAM registration");
        bus.register(Rc::new(RefCell::new(Ram::new(WORK_RAM_BASE, WORK_RAM_SIZE))))
            .expect("work RAM registration");
        bus.register(Rc::new(RefCell::new(Ram::new(HIGH_RAM_BASE, HIGH_RAM_SIZE))))
            .expect("high RAM registration");

        let apu = Rc::new(RefCell::new(Apu::new(pulse1_sink, pulse2_sink)));
        bus.register(apu.clone()).expect("APU registration");

        Self { cpu, bus, apu }
    }

    /// Copy a program into the bus starting at `base`.
    pub fn load(&mut self, base: u16, bytes: &[u8]) {
        for (i, byte) in bytes.iter().enumerate() {
            self.bus.write8(base.wrapping_add(i as u16), *byte);
        }
    }

    /// Execute one instruction; returns its cycle count.
    pub fn step(&mut self) -> u32 {
        self.cpu.step(&mut self.bus)
    }

    /// Execute instructions until at least `budget` cycles have elapsed.
    /// Returns the cycles actually consumed.
    pub fn step_cycles(&mut self, budget: u32) -> u32 {
        let mut elapsed = 0;
        while elapsed < budget {
            elapsed += self.step();
        }
        elapsed
    }

    /// Run the routine at `addr` to completion (see `Cpu::call`).
    pub fn call(&mut self, addr: u16) -> u64 {
        self.cpu.call(&mut self.bus, addr)
    }

    /// 256 Hz frame clock for the APU.
    pub fn clock_256hz(&mut self) {
        self.apu.borrow_mut().clock_256hz();
    }

    /// Handle to the APU, e.g. for inspecting channel state.
    pub fn apu(&self) -> Rc<RefCell<Apu>> {
        self.apu.clone()
    }
}
