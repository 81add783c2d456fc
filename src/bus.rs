//! Address, data and control buses of the emulated CPU socket, built on top
//! of a platform's individual digital pins.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::components::common::port_wiring::{PortId, PortLatch};
use crate::error::ConfigError;
use crate::pin::{ControlLine, DigitalPins, PinMode, PinValue};
use crate::timing::CycleTiming;
use crate::types::BusAddress;

/// Bus-level access to the CPU socket. Bus cycles only talk to this.
pub trait BusPins {
    fn set_address_bus_mode(&mut self, mode: PinMode);

    /// Drive the address pins; bits above the bus width are dropped.
    fn write_address_bus(&mut self, address: BusAddress);

    fn set_data_bus_mode(&mut self, mode: PinMode);

    fn write_data_bus(&mut self, value: u8);

    /// Sample the data pins. A floating pin reads as 1.
    fn read_data_bus(&mut self) -> u8;

    fn write_control(&mut self, line: ControlLine, level: PinValue);

    fn read_control(&mut self, line: ControlLine) -> PinValue;
}

/// Which platform pin carries each socket signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinMap {
    /// A0 first.
    pub address: Vec<u8>,
    /// D0 first.
    pub data: [u8; 8],
    pub read_write: u8,
    pub clock_in: u8,
    pub clock_out: u8,
}

impl PinMap {
    /// 6502 socket on the Arduino Mega 2560 ICT shield.
    ///
    /// Socket pins 21..40 land on header pin 95 - 2n; socket pins 1..20 on
    /// 22 + 2(n - 1).
    pub fn mega2560_6502() -> Self {
        let mut address: Vec<u8> = (0..12u8).map(|bit| 38 + 2 * bit).collect();
        address.extend_from_slice(&[51, 49, 47, 45]);

        PinMap {
            address,
            data: [29, 31, 33, 35, 37, 39, 41, 43],
            read_write: 27,
            clock_in: 21,
            clock_out: 17,
        }
    }

    pub fn control_pin(&self, line: ControlLine) -> u8 {
        match line {
            ControlLine::ReadWrite => self.read_write,
            ControlLine::ClockIn => self.clock_in,
            ControlLine::ClockOut => self.clock_out,
        }
    }

    /// Every signal with its pin, in socket order.
    pub fn signals(&self) -> Vec<(String, u8)> {
        let mut signals: Vec<(String, u8)> = self
            .address
            .iter()
            .enumerate()
            .map(|(bit, pin)| (format!("A{}", bit), *pin))
            .collect();
        signals.extend(
            self.data
                .iter()
                .enumerate()
                .map(|(bit, pin)| (format!("D{}", bit), *pin)),
        );
        for line in [ControlLine::ReadWrite, ControlLine::ClockIn, ControlLine::ClockOut] {
            signals.push((line.name().to_string(), self.control_pin(line)));
        }
        signals
    }

    pub fn validate(&self, pin_count: u8) -> Result<(), ConfigError> {
        if self.address.is_empty() || self.address.len() > 16 {
            return Err(ConfigError::AddressWidth(self.address.len()));
        }

        let mut seen: HashMap<u8, String> = HashMap::new();
        for (signal, pin) in self.signals() {
            if pin >= pin_count {
                return Err(ConfigError::InvalidPin {
                    signal,
                    pin,
                    pin_count,
                });
            }
            if let Some(first) = seen.get(&pin) {
                return Err(ConfigError::DuplicatePin {
                    pin,
                    first: first.clone(),
                    second: signal,
                });
            }
            seen.insert(pin, signal);
        }
        Ok(())
    }
}

impl Default for PinMap {
    fn default() -> Self {
        PinMap::mega2560_6502()
    }
}

/// [`BusPins`] over a platform's [`DigitalPins`], one pin at a time.
#[derive(Debug, Clone)]
pub struct PinMappedBus<P> {
    platform: P,
    map: PinMap,
}

impl<P: DigitalPins> PinMappedBus<P> {
    pub fn new(platform: P, map: PinMap) -> Result<Self, ConfigError> {
        map.validate(platform.pin_count())?;
        Ok(PinMappedBus { platform, map })
    }

    pub fn map(&self) -> &PinMap {
        &self.map
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut P {
        &mut self.platform
    }

    pub fn into_inner(self) -> P {
        self.platform
    }
}

impl<P: DigitalPins> BusPins for PinMappedBus<P> {
    fn set_address_bus_mode(&mut self, mode: PinMode) {
        for pin in &self.map.address {
            self.platform.pin_mode(*pin, mode);
        }
    }

    fn write_address_bus(&mut self, address: BusAddress) {
        let value = address.value();
        for (bit, pin) in self.map.address.iter().enumerate() {
            let level = PinValue::from_bool(value & (1 << bit) != 0);
            self.platform.digital_write(*pin, level);
        }
    }

    fn set_data_bus_mode(&mut self, mode: PinMode) {
        for pin in &self.map.data {
            self.platform.pin_mode(*pin, mode);
        }
    }

    fn write_data_bus(&mut self, value: u8) {
        for (bit, pin) in self.map.data.iter().enumerate() {
            let level = PinValue::from_bool(value & (1 << bit) != 0);
            self.platform.digital_write(*pin, level);
        }
    }

    fn read_data_bus(&mut self) -> u8 {
        let mut value = 0u8;
        for (bit, pin) in self.map.data.iter().enumerate() {
            if self.platform.digital_read(*pin).is_high_pulled_up() {
                value |= 1 << bit;
            }
        }
        value
    }

    fn write_control(&mut self, line: ControlLine, level: PinValue) {
        let pin = self.map.control_pin(line);
        self.platform.digital_write(pin, level);
    }

    fn read_control(&mut self, line: ControlLine) -> PinValue {
        let pin = self.map.control_pin(line);
        self.platform.digital_read(pin)
    }
}

impl<P: CycleTiming> CycleTiming for PinMappedBus<P> {
    fn spin(&mut self, ticks: u32) {
        self.platform.spin(ticks);
    }

    fn disable_interrupts(&mut self) {
        self.platform.disable_interrupts();
    }

    fn enable_interrupts(&mut self) {
        self.platform.enable_interrupts();
    }

    fn latch_ports(&mut self, ports: &[PortId]) -> PortLatch {
        self.platform.latch_ports(ports)
    }

    fn supports_synchronized_cycle(&self) -> bool {
        self.platform.supports_synchronized_cycle()
    }
}
