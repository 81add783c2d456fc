pub mod generic_ram;

pub use generic_ram::GenericRam;
