pub mod clock;
pub mod common;
pub mod cpu;
pub mod memory;
