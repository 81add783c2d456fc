/// Byte-addressed storage behind the simulated board's bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericRam {
    memory: Vec<u8>,
}

impl GenericRam {
    /// `size` bytes, all zero. Addresses wrap modulo `size`.
    pub fn new(size: usize) -> Self {
        GenericRam {
            memory: vec![0u8; size.max(1)],
        }
    }

    /// Full 64 KiB address space.
    pub fn full() -> Self {
        GenericRam::new(0x1_0000)
    }

    pub fn size(&self) -> usize {
        self.memory.len()
    }

    pub fn read(&self, address: u16) -> u8 {
        self.memory[usize::from(address) % self.memory.len()]
    }

    pub fn write(&mut self, address: u16, value: u8) {
        let index = usize::from(address) % self.memory.len();
        self.memory[index] = value;
    }
}

impl Default for GenericRam {
    fn default() -> Self {
        GenericRam::full()
    }
}
