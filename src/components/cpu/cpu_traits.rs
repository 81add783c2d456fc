use crate::error::BusError;

/// What test routines and protocol drivers see of an emulated CPU: plain
/// memory accesses. Which bus cycle services a given address is decided
/// behind this interface.
pub trait BusCpu {
    /// Put the socket into its resting state: R/W in read mode, the clock
    /// output low, data bus as input and the address bus driven to 0x0000.
    fn idle(&mut self);

    /// Read one byte. On error no data is returned.
    fn memory_read(&mut self, address: u32) -> Result<u8, BusError>;

    fn memory_write(&mut self, address: u32, data: u8) -> Result<(), BusError>;

    /// Whether synchronized strategies can be serviced at all.
    fn supports_synchronized_cycle(&self) -> bool;
}
