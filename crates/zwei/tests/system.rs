use zwei::cpu::Model;
use zwei::System;

fn gb() -> System {
    let mut sys = System::headless(Model::Lr35902, 0xDEAD_BEEF);
    sys.cpu.set_pc(0x0100);
    sys
}

#[test]
fn register_to_register_transfer() {
    let mut sys = gb();
    sys.load(0x0100, &[0x06, 0x42, 0x78]); // LD B,0x42 ; LD A,B
    sys.cpu.regs.a = 0;
    sys.cpu.regs.b = 0;
    sys.step();
    sys.step();
    assert_eq!(sys.cpu.regs.a, 0x42);
    assert_eq!(sys.cpu.regs.b, 0x42);
    assert_eq!(sys.cpu.regs.pc, 0x0103);
}

#[test]
fn store_through_postincrement_pointer() {
    let mut sys = gb();
    sys.load(0x0100, &[0x22]); // LD (HL+),A
    sys.cpu.regs.set_hl(0xC000);
    sys.cpu.regs.a = 0x77;
    sys.step();
    assert_eq!(sys.bus.read8(0xC000), 0x77);
    assert_eq!(sys.cpu.regs.hl(), 0xC001);
}

#[test]
fn bus_words_are_little_endian() {
    let mut sys = gb();
    sys.bus.write16(0xC100, 0x1234);
    assert_eq!(sys.bus.read8(0xC100), 0x34);
    assert_eq!(sys.bus.read8(0xC101), 0x12);
    assert_eq!(
        sys.bus.read16(0xC100),
        sys.bus.read8(0xC100) as u16 | ((sys.bus.read8(0xC101) as u16) << 8)
    );
}

#[test]
fn unmapped_addresses_read_open_bus() {
    let mut sys = gb();
    assert_eq!(sys.bus.read8(0x8000), 0xFF);
    sys.bus.write8(0x8000, 0x12); // dropped
    assert_eq!(sys.bus.read8(0x8000), 0xFF);
}

#[test]
fn cpu_writes_reach_the_apu_before_the_next_instruction() {
    let mut sys = gb();
    // LD A,0xFF ; LDH (0x13),A ; LD A,0x07 ; LDH (0x14),A
    sys.load(0x0100, &[0x3E, 0xFF, 0xE0, 0x13, 0x3E, 0x07, 0xE0, 0x14]);
    sys.step();
    sys.step();
    let apu = sys.apu();
    assert_eq!(apu.borrow().channel1().frequency(), 0x00FF);
    sys.step();
    sys.step();
    assert_eq!(apu.borrow().channel1().frequency(), 0x07FF);
    assert!(!apu.borrow().channel1().enabled());

    // LD A,0x80 ; LDH (0x14),A -- trigger bit
    sys.load(0x0108, &[0x3E, 0x80, 0xE0, 0x14]);
    sys.step();
    sys.step();
    assert!(apu.borrow().channel1().enabled());
}

#[test]
fn host_interleaves_cpu_and_frame_clock() {
    let mut sys = gb();
    // Set up a ticking channel, then idle the CPU while the APU runs.
    sys.load(
        0x0100,
        &[
            0x3E, 0x3F, // LD A,0x3F    (length load 63 -> counter 1)
            0xE0, 0x11, // LDH (0x11),A
            0x3E, 0xC0, // LD A,0xC0    (trigger + length enable)
            0xE0, 0x14, // LDH (0x14),A
        ],
    );
    for _ in 0..4 {
        sys.step();
    }
    let apu = sys.apu();
    assert!(apu.borrow().channel1().enabled());

    // A typical host slice: some CPU work, then a frame tick.
    sys.load(0x0108, &[0x00, 0x00, 0x00, 0x00]);
    sys.step_cycles(8);
    sys.clock_256hz();
    assert!(!apu.borrow().channel1().enabled(), "length expired");
}

#[test]
fn call_helper_round_trip() {
    let mut sys = gb();
    sys.cpu.set_sp(0xFFFE);
    // Routine: increment A three times, then return.
    sys.load(0x0200, &[0x3C, 0x3C, 0x3C, 0xC9]);
    sys.cpu.regs.a = 0;
    sys.call(0x0200);
    assert_eq!(sys.cpu.regs.a, 3);
    assert_eq!(sys.cpu.regs.pc, 0x0100);
}

#[test]
fn z80_variant_runs_its_own_dialect() {
    let mut sys = System::headless(Model::Z80, 42);
    sys.cpu.set_pc(0x0100);
    sys.cpu.set_sp(0xFFFE);
    // LD BC,0x0102 ; EXX ; LD BC,0xA0B0 ; EXX
    sys.load(
        0x0100,
        &[0x01, 0x02, 0x01, 0xD9, 0x01, 0xB0, 0xA0, 0xD9],
    );
    sys.step();
    sys.step();
    sys.step();
    assert_eq!(sys.cpu.regs.bc(), 0xA0B0);
    sys.step();
    assert_eq!(sys.cpu.regs.bc(), 0x0102);
}

#[test]
fn ei_enables_after_the_following_instruction() {
    let mut sys = gb();
    sys.load(0x0100, &[0xFB, 0x00]); // EI ; NOP
    sys.step();
    assert!(!sys.cpu.interrupts_enabled());
    sys.step();
    assert!(sys.cpu.interrupts_enabled());
}
