//! 6502-family socket emulation: picks a bus cycle per access from the
//! board's strategy table.

use tracing::trace;

use crate::board_config::BoardProfile;
use crate::bus::{BusPins, PinMappedBus};
use crate::components::common::port_wiring::DataBusWiring;
use crate::components::cpu::cpu_traits::BusCpu;
use crate::components::cpu::generic_cycle;
#[cfg(feature = "synchronized-cycle")]
use crate::components::cpu::sync_cycle::{self, EdgeSelect};
use crate::error::{Access, BusError, ConfigError};
use crate::pin::{ControlLine, DigitalPins, PinMode, PinValue};
use crate::strategy::{self, MemoryStrategy, Strategy};
use crate::timing::{CycleTiming, RulerCalibration};
use crate::types::BusAddress;

pub struct Mos6502Tester<B> {
    bus: B,
    strategies: Vec<MemoryStrategy>,
    wiring: DataBusWiring,
    calibration: RulerCalibration,
}

impl<B: BusPins + CycleTiming> Mos6502Tester<B> {
    pub fn new(
        bus: B,
        strategies: &[MemoryStrategy],
        wiring: DataBusWiring,
        calibration: RulerCalibration,
    ) -> Self {
        Mos6502Tester {
            bus,
            strategies: strategy::live_entries(strategies).to_vec(),
            wiring,
            calibration,
        }
    }

    pub fn strategies(&self) -> &[MemoryStrategy] {
        &self.strategies
    }

    pub fn calibration(&self) -> &RulerCalibration {
        &self.calibration
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    pub fn into_bus(self) -> B {
        self.bus
    }

    #[cfg(feature = "synchronized-cycle")]
    fn edge_for(strategy: Strategy) -> EdgeSelect {
        if strategy == Strategy::SyncPhi0SkipOnePulse {
            EdgeSelect::SkipOnePulse
        } else {
            EdgeSelect::Next
        }
    }

    fn not_implemented(access: Access, strategy: Strategy) -> BusError {
        BusError::NotImplemented { access, strategy }
    }

    #[cfg(feature = "synchronized-cycle")]
    fn synchronized_read(&mut self, address: BusAddress, strategy: Strategy) -> Result<u8, BusError> {
        if !self.supports_synchronized_cycle() {
            return Err(Self::not_implemented(Access::Read, strategy));
        }
        sync_cycle::read(
            &mut self.bus,
            address,
            Self::edge_for(strategy),
            &self.wiring,
            &self.calibration,
        )
    }

    #[cfg(not(feature = "synchronized-cycle"))]
    fn synchronized_read(&mut self, _address: BusAddress, strategy: Strategy) -> Result<u8, BusError> {
        Err(Self::not_implemented(Access::Read, strategy))
    }

    #[cfg(feature = "synchronized-cycle")]
    fn synchronized_write(
        &mut self,
        address: BusAddress,
        data: u8,
        strategy: Strategy,
    ) -> Result<(), BusError> {
        if !self.supports_synchronized_cycle() {
            return Err(Self::not_implemented(Access::Write, strategy));
        }
        sync_cycle::write(
            &mut self.bus,
            address,
            data,
            Self::edge_for(strategy),
            &self.calibration,
        )
    }

    #[cfg(not(feature = "synchronized-cycle"))]
    fn synchronized_write(
        &mut self,
        _address: BusAddress,
        _data: u8,
        strategy: Strategy,
    ) -> Result<(), BusError> {
        Err(Self::not_implemented(Access::Write, strategy))
    }
}

impl<P: DigitalPins + CycleTiming> Mos6502Tester<PinMappedBus<P>> {
    /// Wire a tester to `platform` as described by `profile`, and idle the
    /// socket.
    pub fn from_profile(platform: P, profile: &BoardProfile) -> Result<Self, ConfigError> {
        profile.validate(platform.pin_count())?;
        let bus = PinMappedBus::new(platform, profile.pins.clone())?;
        let mut tester = Mos6502Tester::new(
            bus,
            &profile.strategies,
            profile.wiring.clone(),
            profile.calibration,
        );
        tester.idle();
        Ok(tester)
    }

    pub fn platform(&self) -> &P {
        self.bus.platform()
    }

    pub fn platform_mut(&mut self) -> &mut P {
        self.bus.platform_mut()
    }
}

impl<B: BusPins + CycleTiming> BusCpu for Mos6502Tester<B> {
    fn idle(&mut self) {
        self.bus.set_address_bus_mode(PinMode::Output);
        self.bus.write_address_bus(BusAddress::new(0));
        self.bus.set_data_bus_mode(PinMode::Input);
        self.bus.write_control(ControlLine::ReadWrite, PinValue::High);
        self.bus.write_control(ControlLine::ClockOut, PinValue::Low);
    }

    fn memory_read(&mut self, address: u32) -> Result<u8, BusError> {
        let address = BusAddress::truncate(address);
        let (strategy, _) = strategy::lookup(&self.strategies, address.value().into());

        let data = match strategy {
            Strategy::Default => generic_cycle::read(&mut self.bus, address, &self.calibration),
            Strategy::SyncPhi0 | Strategy::SyncPhi0SkipOnePulse => {
                self.synchronized_read(address, strategy)?
            }
            Strategy::Unsupported => return Err(Self::not_implemented(Access::Read, strategy)),
        };

        trace!(address = %address, strategy = %strategy, data = data, "read");
        Ok(data)
    }

    fn memory_write(&mut self, address: u32, data: u8) -> Result<(), BusError> {
        let address = BusAddress::truncate(address);
        let (_, strategy) = strategy::lookup(&self.strategies, address.value().into());

        match strategy {
            Strategy::Default => {
                generic_cycle::write(&mut self.bus, address, data, &self.calibration)
            }
            Strategy::SyncPhi0 | Strategy::SyncPhi0SkipOnePulse => {
                self.synchronized_write(address, data, strategy)?
            }
            Strategy::Unsupported => return Err(Self::not_implemented(Access::Write, strategy)),
        }

        trace!(address = %address, strategy = %strategy, data = data, "write");
        Ok(())
    }

    fn supports_synchronized_cycle(&self) -> bool {
        cfg!(feature = "synchronized-cycle") && self.bus.supports_synchronized_cycle()
    }
}
