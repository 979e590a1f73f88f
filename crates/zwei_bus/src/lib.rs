pub mod bus;
pub mod ram;

pub use bus::{BusError, DataBus, Peripheral, SharedPeripheral};
pub use ram::Ram;
