use std::fmt;

/// 16-bit address as driven onto the emulated CPU's address bus.
///
/// Callers hand addresses around as `u32`; converting into a `BusAddress`
/// keeps only the low 16 bits, exactly as the bus pins would.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BusAddress(u16);

impl BusAddress {
    pub const fn new(value: u16) -> Self {
        BusAddress(value)
    }

    pub const fn value(&self) -> u16 {
        self.0
    }

    /// Truncate a wider address to the bus width.
    pub const fn truncate(value: u32) -> Self {
        BusAddress(value as u16)
    }

    pub fn wrapping_add(&self, value: u16) -> Self {
        BusAddress(self.0.wrapping_add(value))
    }
}

impl fmt::Display for BusAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

impl From<u16> for BusAddress {
    fn from(value: u16) -> Self {
        BusAddress::new(value)
    }
}

impl From<u32> for BusAddress {
    fn from(value: u32) -> Self {
        BusAddress::truncate(value)
    }
}

impl From<BusAddress> for u16 {
    fn from(value: BusAddress) -> Self {
        value.value()
    }
}
