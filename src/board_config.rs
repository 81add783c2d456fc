//! # Board profiles
//!
//! Everything board-specific the bus-emulation layer needs: which CPU the
//! socket impersonates, how the socket is wired to the controller, which
//! address ranges need which bus cycle, and the data bus port wiring used by
//! the synchronized cycle.
//!
//! Profiles are plain JSON and a handful are built in:
//!
//! ```rust
//! use arcade_ict::board_config::BoardFactory;
//!
//! let factory = BoardFactory::new();
//! let profile = factory.create("centipede").expect("built-in board");
//! println!("{}: {} strategy entries", profile.name, profile.strategies.len());
//! ```
//!
//! ```json
//! {
//!   "name": "centipede",
//!   "cpu": "mos6502",
//!   "strategies": [
//!     {"start": 1024, "length": 1024,
//!      "read": "sync_phi0_skip_one_pulse", "write": "sync_phi0_skip_one_pulse"},
//!     {"start": 0, "length": 0}
//!   ],
//!   "regions": [{"kind": "ram", "start": 0, "length": 1024, "label": "Progrm"}]
//! }
//! ```
//!
//! `pins`, `wiring` and `calibration` default to the Arduino Mega 2560 shield.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::bus::PinMap;
use crate::components::common::port_wiring::DataBusWiring;
use crate::error::ConfigError;
use crate::region::{RegionDescriptor, RegionKind};
use crate::strategy::{self, MemoryStrategy};
use crate::timing::RulerCalibration;

/// CPU families the tester can stand in for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CpuKind {
    #[serde(rename = "mos6502")]
    Mos6502,
    #[serde(rename = "z80")]
    Z80,
    #[serde(rename = "mc6809e")]
    Mc6809E,
    #[serde(rename = "i8080")]
    I8080,
}

impl CpuKind {
    /// Whether the CPU has the phi0-in / phi2-out clock pair the synchronized
    /// cycle works against.
    pub fn has_phi0_clock(&self) -> bool {
        matches!(self, CpuKind::Mos6502)
    }
}

impl fmt::Display for CpuKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CpuKind::Mos6502 => "6502",
            CpuKind::Z80 => "Z80",
            CpuKind::Mc6809E => "6809E",
            CpuKind::I8080 => "8080",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardProfile {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub cpu: CpuKind,
    #[serde(default)]
    pub pins: PinMap,
    #[serde(default)]
    pub strategies: Vec<MemoryStrategy>,
    #[serde(default)]
    pub wiring: DataBusWiring,
    #[serde(default)]
    pub calibration: RulerCalibration,
    #[serde(default)]
    pub regions: Vec<RegionDescriptor>,
}

impl BoardProfile {
    /// Check the profile against a platform with `pin_count` pins.
    pub fn validate(&self, pin_count: u8) -> Result<(), ConfigError> {
        self.pins.validate(pin_count)?;

        if !self.cpu.has_phi0_clock() {
            let synchronized = strategy::live_entries(&self.strategies)
                .iter()
                .flat_map(|entry| [entry.read, entry.write])
                .find(|strategy| strategy.is_synchronized());
            if let Some(strategy) = synchronized {
                return Err(ConfigError::SyncOnNonPhi0Cpu {
                    board: self.name.clone(),
                    strategy,
                    cpu: self.cpu.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn regions_of(&self, kind: RegionKind) -> impl Iterator<Item = &RegionDescriptor> + '_ {
        self.regions.iter().filter(move |region| region.kind == kind)
    }

    /// Atari Centipede. Video RAM only answers in step with phi0, and phi0
    /// drops every other pulse while the CPU is addressing it.
    pub fn centipede() -> Self {
        let region = |kind, start, length, label: &str| RegionDescriptor {
            kind,
            start,
            length,
            label: label.to_string(),
        };

        BoardProfile {
            name: "centipede".to_string(),
            description: "Atari Centipede, 6502 @ 1.5 MHz".to_string(),
            cpu: CpuKind::Mos6502,
            pins: PinMap::mega2560_6502(),
            strategies: strategy::CENTIPEDE.to_vec(),
            wiring: DataBusWiring::mega2560_6502(),
            calibration: RulerCalibration::MEGA2560_16MHZ_PHI0_1_5MHZ,
            regions: vec![
                region(RegionKind::Ram, 0x0000, 0x0400, "2HF Progrm"),
                region(RegionKind::Ram, 0x0400, 0x0100, "K75 Video"),
                region(RegionKind::Ram, 0x0500, 0x0100, "L75 Video"),
                region(RegionKind::Ram, 0x0600, 0x0100, "M75 Video"),
                region(RegionKind::Ram, 0x0700, 0x0100, "N75 Video"),
                region(RegionKind::Output, 0x1800, 0x0001, "IRQRES"),
                region(RegionKind::Rom, 0x2000, 0x0800, "D1"),
                region(RegionKind::Rom, 0x2800, 0x0800, "E1"),
                region(RegionKind::Rom, 0x3000, 0x0800, "FH1"),
                region(RegionKind::Rom, 0x3800, 0x0800, "J1"),
            ],
        }
    }

    /// Any 6502 board whose whole bus works asynchronously.
    pub fn generic_6502() -> Self {
        BoardProfile {
            name: "generic-6502".to_string(),
            description: "6502 board, asynchronous bus throughout".to_string(),
            cpu: CpuKind::Mos6502,
            pins: PinMap::mega2560_6502(),
            strategies: strategy::ALL_DEFAULT.to_vec(),
            wiring: DataBusWiring::mega2560_6502(),
            calibration: RulerCalibration::default(),
            regions: vec![RegionDescriptor {
                kind: RegionKind::Ram,
                start: 0x0000,
                length: 0x0800,
                label: "RAM".to_string(),
            }],
        }
    }
}

/// Registry of built-in board profiles plus JSON loading.
pub struct BoardFactory {
    registry: HashMap<String, fn() -> BoardProfile>,
}

impl BoardFactory {
    pub fn new() -> Self {
        let mut factory = BoardFactory {
            registry: HashMap::new(),
        };
        factory.register_default_boards();
        factory
    }

    fn register_default_boards(&mut self) {
        self.register("centipede", BoardProfile::centipede);
        self.register("generic-6502", BoardProfile::generic_6502);
    }

    pub fn register(&mut self, name: &str, builder: fn() -> BoardProfile) {
        self.registry.insert(name.to_string(), builder);
    }

    /// Built-in board names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.registry.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn create(&self, name: &str) -> Result<BoardProfile, ConfigError> {
        let builder = self
            .registry
            .get(name)
            .ok_or_else(|| ConfigError::UnknownBoard(name.to_string()))?;
        let profile = builder();
        info!(board = %profile.name, cpu = %profile.cpu, "loaded built-in board profile");
        Ok(profile)
    }

    pub fn from_json_str(&self, json: &str) -> Result<BoardProfile, ConfigError> {
        let profile: BoardProfile = serde_json::from_str(json)?;
        info!(
            board = %profile.name,
            cpu = %profile.cpu,
            strategies = strategy::live_entries(&profile.strategies).len(),
            regions = profile.regions.len(),
            "loaded board profile"
        );
        Ok(profile)
    }

    pub fn load_json(&self, path: impl AsRef<Path>) -> Result<BoardProfile, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        self.from_json_str(&content)
    }
}

impl Default for BoardFactory {
    fn default() -> Self {
        BoardFactory::new()
    }
}
