// CPU bus-emulation module
pub mod cpu_traits;
pub mod generic_cycle;
pub mod mos_6502;
pub mod sync_cycle;

// Re-export the CPU types
pub use cpu_traits::BusCpu;
pub use mos_6502::Mos6502Tester;
