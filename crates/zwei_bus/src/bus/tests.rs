use std::cell::RefCell;
use std::rc::Rc;

use super::*;
use crate::ram::Ram;

fn shared_ram(base: u16, size: usize) -> Rc<RefCell<Ram>> {
    Rc::new(RefCell::new(Ram::new(base, size)))
}

#[test]
fn routes_reads_and_writes_to_owning_peripheral() {
    let mut bus = DataBus::new();
    bus.register(shared_ram(0xC000, 0x100)).unwrap();
    bus.register(shared_ram(0xFF80, 0x7F)).unwrap();

    bus.write8(0xC010, 0x5A);
    bus.write8(0xFF80, 0xA5);

    assert_eq!(bus.read8(0xC010), 0x5A);
    assert_eq!(bus.read8(0xFF80), 0xA5);
}

#[test]
fn unmapped_read_returns_open_bus_and_write_is_dropped() {
    let mut bus = DataBus::new();
    bus.register(shared_ram(0xC000, 0x100)).unwrap();

    assert_eq!(bus.read8(0x1234), OPEN_BUS_VALUE);
    // Must not panic, must not disturb mapped state.
    bus.write8(0x1234, 0x42);
    assert_eq!(bus.read8(0x1234), OPEN_BUS_VALUE);
}

#[test]
fn rejects_overlapping_registration() {
    let mut bus = DataBus::new();
    bus.register(shared_ram(0xC000, 0x100)).unwrap();

    let err = bus.register(shared_ram(0xC0FF, 0x10)).unwrap_err();
    assert!(matches!(err, BusError::Overlap { .. }));

    // Adjacent ranges are fine.
    bus.register(shared_ram(0xC100, 0x10)).unwrap();
}

#[test]
fn word_access_is_little_endian() {
    let mut bus = DataBus::new();
    bus.register(shared_ram(0xC000, 0x100)).unwrap();

    bus.write16(0xC000, 0xBEEF);
    assert_eq!(bus.read8(0xC000), 0xEF);
    assert_eq!(bus.read8(0xC001), 0xBE);
    assert_eq!(bus.read16(0xC000), 0xBEEF);
}

#[test]
fn word_access_wraps_at_top_of_address_space() {
    let mut bus = DataBus::new();
    bus.register(shared_ram(0xFFFF, 1)).unwrap();
    bus.register(shared_ram(0x0000, 1)).unwrap();

    bus.write16(0xFFFF, 0x1234);
    assert_eq!(bus.read8(0xFFFF), 0x34);
    assert_eq!(bus.read8(0x0000), 0x12);
    assert_eq!(bus.read16(0xFFFF), 0x1234);
}

#[test]
fn ram_covers_full_sixteen_bit_range() {
    // A window ending exactly at 0xFFFF must not overflow its bound
    // computation.
    let ram = Ram::new(0xFF00, 0x100);
    assert_eq!(ram.first_address(), 0xFF00);
    assert_eq!(ram.last_address(), 0xFFFF);
}
