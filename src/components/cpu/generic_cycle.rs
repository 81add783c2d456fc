//! Ordinary asynchronous bus cycle.
//!
//! The clock output doubles as the access strobe: the target sees a phi2
//! pulse with the address and R/W already stable, and the data bus is
//! sampled (or held) while the pulse is high.

use crate::bus::BusPins;
use crate::pin::{ControlLine, PinMode, PinValue};
use crate::timing::{CycleTiming, RulerCalibration};
use crate::types::BusAddress;

pub fn read<B>(bus: &mut B, address: BusAddress, calibration: &RulerCalibration) -> u8
where
    B: BusPins + CycleTiming,
{
    bus.write_control(ControlLine::ReadWrite, PinValue::High);
    bus.set_address_bus_mode(PinMode::Output);
    bus.write_address_bus(address);
    bus.set_data_bus_mode(PinMode::Input);
    bus.spin(calibration.settle_ticks);

    bus.write_control(ControlLine::ClockOut, PinValue::High);
    bus.spin(calibration.settle_ticks);
    let data = bus.read_data_bus();
    bus.write_control(ControlLine::ClockOut, PinValue::Low);

    data
}

pub fn write<B>(bus: &mut B, address: BusAddress, data: u8, calibration: &RulerCalibration)
where
    B: BusPins + CycleTiming,
{
    bus.write_control(ControlLine::ReadWrite, PinValue::Low);
    bus.set_address_bus_mode(PinMode::Output);
    bus.write_address_bus(address);
    bus.set_data_bus_mode(PinMode::Output);
    bus.write_data_bus(data);
    bus.spin(calibration.settle_ticks);

    bus.write_control(ControlLine::ClockOut, PinValue::High);
    bus.spin(calibration.settle_ticks);
    bus.write_control(ControlLine::ClockOut, PinValue::Low);

    // Idle is read mode; release the data bus before the target may drive it.
    bus.set_data_bus_mode(PinMode::Input);
    bus.write_control(ControlLine::ReadWrite, PinValue::High);
}
