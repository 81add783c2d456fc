//! Data bus reassembly from raw port registers
//!
//! The synchronized cycle cannot afford per-pin reads after its phi2 pulse,
//! so it latches whole input-port registers and rebuilds the data byte from
//! them afterwards. Which port bit feeds which data bit, and with what
//! polarity, depends on how a particular tester board is wired; it is
//! configuration, not logic.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Most port registers a single latch can capture.
pub const MAX_LATCHED_PORTS: usize = 4;

/// Name of a microcontroller I/O port register ('A', 'C', 'G', 'L', ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortId(pub char);

impl fmt::Display for PortId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Raw port register values captured back to back, in the order requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PortLatch {
    values: [u8; MAX_LATCHED_PORTS],
    len: usize,
}

impl PortLatch {
    /// Values beyond [`MAX_LATCHED_PORTS`] are ignored.
    pub fn from_values(values: &[u8]) -> Self {
        let mut latch = PortLatch::default();
        for (slot, value) in latch.values.iter_mut().zip(values) {
            *slot = *value;
            latch.len += 1;
        }
        latch
    }

    pub fn get(&self, index: usize) -> u8 {
        if index < self.len {
            self.values[index]
        } else {
            0
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Where one data bus bit can be found after latching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitSource {
    pub port: PortId,
    pub bit: u8,
    /// When set, a cleared port bit means a logical 1 on the data bus.
    #[serde(default)]
    pub active_low: bool,
}

impl BitSource {
    pub const fn active_high(port: char, bit: u8) -> Self {
        BitSource {
            port: PortId(port),
            bit,
            active_low: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slot {
    port_index: usize,
    mask: u8,
    active_low: bool,
}

#[derive(Serialize, Deserialize)]
struct WiringConfig {
    bits: [BitSource; 8],
}

/// Mapping from latched port bits to data bus bits D0..D7.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "WiringConfig", into = "WiringConfig")]
pub struct DataBusWiring {
    bits: [BitSource; 8],
    ports: Vec<PortId>,
    slots: [Slot; 8],
}

impl DataBusWiring {
    /// `bits[n]` is the source of data bit Dn.
    pub fn new(bits: [BitSource; 8]) -> Result<Self, ConfigError> {
        let mut ports: Vec<PortId> = Vec::new();
        let mut slots = [Slot {
            port_index: 0,
            mask: 0,
            active_low: false,
        }; 8];

        for (data_bit, source) in bits.iter().enumerate() {
            if source.bit > 7 {
                return Err(ConfigError::InvalidWiring(format!(
                    "D{} is wired to bit {} of {}",
                    data_bit, source.bit, source.port
                )));
            }
            if let Some(other) = bits[..data_bit]
                .iter()
                .position(|b| b.port == source.port && b.bit == source.bit)
            {
                return Err(ConfigError::InvalidWiring(format!(
                    "D{} and D{} both read bit {} of {}",
                    other, data_bit, source.bit, source.port
                )));
            }

            let port_index = match ports.iter().position(|p| *p == source.port) {
                Some(index) => index,
                None => {
                    ports.push(source.port);
                    ports.len() - 1
                }
            };
            if port_index >= MAX_LATCHED_PORTS {
                return Err(ConfigError::InvalidWiring(format!(
                    "data bus spans more than {} ports",
                    MAX_LATCHED_PORTS
                )));
            }

            slots[data_bit] = Slot {
                port_index,
                mask: 1 << source.bit,
                active_low: source.active_low,
            };
        }

        Ok(DataBusWiring { bits, ports, slots })
    }

    /// ICT on an Arduino Mega 2560, 6502 socket: D7=PL6, D6=PG0, D5=PG2,
    /// D4=PC0, D3=PC2, D2=PC4, D1=PC6, D0=PA7.
    pub fn mega2560_6502() -> Self {
        let bits = [
            BitSource::active_high('A', 7),
            BitSource::active_high('C', 6),
            BitSource::active_high('C', 4),
            BitSource::active_high('C', 2),
            BitSource::active_high('C', 0),
            BitSource::active_high('G', 2),
            BitSource::active_high('G', 0),
            BitSource::active_high('L', 6),
        ];
        DataBusWiring::new(bits).expect("built-in wiring is consistent")
    }

    pub fn bits(&self) -> &[BitSource; 8] {
        &self.bits
    }

    /// Ports to latch, in the order `reassemble` expects them.
    pub fn ports(&self) -> &[PortId] {
        &self.ports
    }

    /// Rebuild the data byte from a latch taken over [`Self::ports`].
    pub fn reassemble(&self, latch: &PortLatch) -> u8 {
        let mut value = 0u8;
        for (data_bit, slot) in self.slots.iter().enumerate() {
            let source_set = latch.get(slot.port_index) & slot.mask != 0;
            if source_set != slot.active_low {
                value |= 1 << data_bit;
            }
        }
        value
    }

    /// Raw register value `port` would show with `data` on the bus. Bits of
    /// the port not wired to the data bus come from `unrelated`.
    pub fn raw_port(&self, port: PortId, data: u8, unrelated: u8) -> u8 {
        let mut raw = unrelated;
        for (data_bit, source) in self.bits.iter().enumerate() {
            if source.port != port {
                continue;
            }
            let logical = data & (1 << data_bit) != 0;
            let mask = 1 << source.bit;
            if logical != source.active_low {
                raw |= mask;
            } else {
                raw &= !mask;
            }
        }
        raw
    }

    /// Inverse of [`Self::reassemble`], for hardware models.
    pub fn scatter(&self, data: u8, unrelated: u8, ports: &[PortId]) -> PortLatch {
        let raw: Vec<u8> = ports
            .iter()
            .map(|port| self.raw_port(*port, data, unrelated))
            .collect();
        PortLatch::from_values(&raw)
    }
}

impl TryFrom<WiringConfig> for DataBusWiring {
    type Error = ConfigError;

    fn try_from(config: WiringConfig) -> Result<Self, Self::Error> {
        DataBusWiring::new(config.bits)
    }
}

impl From<DataBusWiring> for WiringConfig {
    fn from(wiring: DataBusWiring) -> Self {
        WiringConfig { bits: wiring.bits }
    }
}

impl Default for DataBusWiring {
    fn default() -> Self {
        DataBusWiring::mega2560_6502()
    }
}
