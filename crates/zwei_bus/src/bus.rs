use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;

/// A device addressable through the data bus.
///
/// Each peripheral owns one closed address range `[first_address,
/// last_address]`. The bus guarantees that `read`/`write` are only called
/// with addresses inside that range.
pub trait Peripheral {
    fn first_address(&self) -> u16;
    fn last_address(&self) -> u16;

    fn read(&mut self, addr: u16) -> u8;
    fn write(&mut self, addr: u16, value: u8);
}

/// Shared handle to a bus peripheral.
///
/// Peripherals stay registered for the lifetime of the bus, but hosts
/// usually need their own handle as well (e.g. to clock the APU), so the
/// bus holds them behind `Rc<RefCell<..>>`.
pub type SharedPeripheral = Rc<RefCell<dyn Peripheral>>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BusError {
    #[error("address range {first:#06X}..={last:#06X} overlaps an existing registration {existing_first:#06X}..={existing_last:#06X}")]
    Overlap {
        first: u16,
        last: u16,
        existing_first: u16,
        existing_last: u16,
    },
    #[error("address range is inverted: first {first:#06X} > last {last:#06X}")]
    InvertedRange { first: u16, last: u16 },
}

struct Mapping {
    first: u16,
    last: u16,
    device: SharedPeripheral,
}

/// Address-dispatching data bus.
///
/// Registered peripherals each claim a closed range of the 16-bit address
/// space; reads and writes are forwarded to the owning peripheral. The
/// number of registrants is tiny, so lookup is a linear scan.
#[derive(Default)]
pub struct DataBus {
    mappings: Vec<Mapping>,
}

/// Value returned for reads that no peripheral claims.
pub const OPEN_BUS_VALUE: u8 = 0xFF;

impl DataBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a peripheral on the address range it reports.
    ///
    /// Fails if the range is inverted or overlaps an existing
    /// registration. Registration errors are bring-up misconfiguration,
    /// so callers typically `expect` the result.
    pub fn register(&mut self, device: SharedPeripheral) -> Result<(), BusError> {
        let (first, last) = {
            let dev = device.borrow();
            (dev.first_address(), dev.last_address())
        };
        if first > last {
            return Err(BusError::InvertedRange { first, last });
        }
        for mapping in &self.mappings {
            if first <= mapping.last && mapping.first <= last {
                return Err(BusError::Overlap {
                    first,
                    last,
                    existing_first: mapping.first,
                    existing_last: mapping.last,
                });
            }
        }
        self.mappings.push(Mapping {
            first,
            last,
            device,
        });
        Ok(())
    }

    fn mapping_for(&self, addr: u16) -> Option<&Mapping> {
        self.mappings
            .iter()
            .find(|m| m.first <= addr && addr <= m.last)
    }

    pub fn read8(&mut self, addr: u16) -> u8 {
        match self.mapping_for(addr) {
            Some(mapping) => mapping.device.borrow_mut().read(addr),
            None => {
                log::debug!("open-bus read at {addr:#06X}");
                OPEN_BUS_VALUE
            }
        }
    }

    pub fn write8(&mut self, addr: u16, value: u8) {
        match self.mapping_for(addr) {
            Some(mapping) => mapping.device.borrow_mut().write(addr, value),
            None => {
                log::debug!("dropped write of {value:#04X} at unmapped {addr:#06X}");
            }
        }
    }

    /// Read a little-endian 16-bit word. The high byte comes from
    /// `addr + 1`, wrapping at the top of the address space.
    pub fn read16(&mut self, addr: u16) -> u16 {
        let lo = self.read8(addr) as u16;
        let hi = self.read8(addr.wrapping_add(1)) as u16;
        (hi << 8) | lo
    }

    /// Write a little-endian 16-bit word, low byte first.
    pub fn write16(&mut self, addr: u16, value: u16) {
        self.write8(addr, value as u8);
        self.write8(addr.wrapping_add(1), (value >> 8) as u8);
    }
}

#[cfg(test)]
mod tests;
