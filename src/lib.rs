//! # Arcade ICT bus emulation
//!
//! The CPU bus-emulation layer of an in-circuit tester that sits in a classic
//! arcade board's CPU socket and impersonates the CPU on the bus.
//!
//! This library provides:
//! - Per-address-range selection of the bus cycle through a strategy table
//! - An ordinary asynchronous bus cycle
//! - A phi0-synchronized bus cycle with bounded phase acquisition, for
//!   hardware that must be accessed in step with its own clock
//! - JSON board profiles describing pins, strategies and data bus wiring
//! - A deterministic simulated board so all of the above can be exercised
//!   without hardware

pub mod board_config;
pub mod bus;
pub mod components;
pub mod error;
pub mod pin;
pub mod region;
pub mod strategy;
pub mod systems;
pub mod timing;
pub mod types;

// Re-export commonly used items for easier importing
pub use board_config::{BoardFactory, BoardProfile, CpuKind};
pub use bus::{BusPins, PinMap, PinMappedBus};
pub use components::cpu::{BusCpu, Mos6502Tester};
pub use error::{Access, BusError, ConfigError};
pub use pin::{ControlLine, DigitalPins, PinMode, PinValue};
pub use strategy::{lookup, MemoryStrategy, Strategy};
pub use systems::ArcadeBoard;
pub use timing::{CycleTiming, RulerCalibration};
pub use types::BusAddress;
