//! # Phi0-synchronized bus cycle
//!
//! Some targets only answer an access whose phi2 pulse lines up with their
//! own free-running phi0. The tester has no idea where phi0 is in its period,
//! so every cycle acquires phase from scratch:
//!
//! 1. **Coarse**: poll until phi0 reads low, then until it reads high. We are
//!    now somewhere in the high half, up to one poll late.
//! 2. **Fine**: a shortened ruler puts the first check in the low half. The
//!    full ruler is a little longer than one phi0 period, so each repeat
//!    checks a little later in the period. The first check that reads high
//!    again is within one ruler quantum of a rising edge.
//! 3. **Wait out** to just before the next rising edge, or the one after it
//!    when the target drops every other pulse.
//! 4. **Pulse** phi2 and latch the input ports straight after.
//!
//! Steps 1-4 run with interrupts disabled. Nothing is carried from one call
//! to the next. Every poll loop is bounded by the calibration's poll budget,
//! so an absent or stuck clock ends in [`BusError::NoClockDetected`].

use tracing::{debug, warn};

use crate::bus::BusPins;
use crate::components::common::port_wiring::DataBusWiring;
use crate::error::BusError;
use crate::pin::{ControlLine, PinMode, PinValue};
use crate::timing::{CycleTiming, RulerCalibration};
use crate::types::BusAddress;

/// Steps of one synchronized cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncPhase {
    Idle,
    CoarseAcquire,
    FineAcquire,
    WaitOut,
    Pulse,
    Sample,
}

/// Poll counts spent acquiring phase during one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PhaseLock {
    pub coarse_polls: u32,
    pub fine_polls: u32,
}

/// Which rising edge after lock the cycle acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeSelect {
    /// The next rising edge.
    Next,
    /// The one after; the next edge is missing on the target.
    SkipOnePulse,
}

impl EdgeSelect {
    fn skips(self) -> bool {
        self == EdgeSelect::SkipOnePulse
    }
}

/// Poll the clock input until it shows `level`. Each miss costs one coarse
/// poll of time and one unit of budget.
fn wait_for_level<B>(
    bus: &mut B,
    level: PinValue,
    calibration: &RulerCalibration,
    polls: &mut u32,
) -> Result<(), BusError>
where
    B: BusPins + CycleTiming,
{
    let mut spent = 0u32;
    while bus.read_control(ControlLine::ClockIn) != level {
        spent += 1;
        if spent >= calibration.poll_limit {
            *polls += spent;
            return Err(BusError::NoClockDetected {
                phase: SyncPhase::CoarseAcquire,
                polls: spent,
            });
        }
        bus.spin(calibration.coarse_poll_ticks);
    }
    *polls += spent;
    Ok(())
}

/// Steps 1 and 2. On success the caller is within one ruler quantum after
/// a phi0 rising edge.
pub fn acquire_phase<B>(bus: &mut B, calibration: &RulerCalibration) -> Result<PhaseLock, BusError>
where
    B: BusPins + CycleTiming,
{
    let mut lock = PhaseLock::default();

    wait_for_level(bus, PinValue::Low, calibration, &mut lock.coarse_polls)?;
    wait_for_level(bus, PinValue::High, calibration, &mut lock.coarse_polls)?;

    bus.spin(calibration.short_sync_ticks);
    while bus.read_control(ControlLine::ClockIn) != PinValue::High {
        lock.fine_polls += 1;
        if lock.fine_polls >= calibration.poll_limit {
            return Err(BusError::NoClockDetected {
                phase: SyncPhase::FineAcquire,
                polls: lock.fine_polls,
            });
        }
        bus.spin(calibration.sync_ruler_ticks);
    }

    Ok(lock)
}

/// Acquire phase, pulse phi2, then run `after_pulse` while interrupts are
/// still off.
fn pulse<B, T>(
    bus: &mut B,
    edge: EdgeSelect,
    pulse_ticks: u32,
    calibration: &RulerCalibration,
    after_pulse: impl FnOnce(&mut B) -> T,
) -> Result<(PhaseLock, T), BusError>
where
    B: BusPins + CycleTiming,
{
    bus.without_interrupts(|bus| {
        let lock = acquire_phase(bus, calibration)?;

        bus.spin(calibration.wait_out(edge.skips()));

        bus.write_control(ControlLine::ClockOut, PinValue::High);
        bus.spin(pulse_ticks);
        bus.write_control(ControlLine::ClockOut, PinValue::Low);

        Ok((lock, after_pulse(bus)))
    })
}

fn report<T>(address: BusAddress, outcome: &Result<(PhaseLock, T), BusError>) {
    match outcome {
        Ok((lock, _)) => debug!(
            address = %address,
            coarse_polls = lock.coarse_polls,
            fine_polls = lock.fine_polls,
            "phi0 lock"
        ),
        Err(err) => warn!(address = %address, "{}", err),
    }
}

/// Synchronized read. The data byte is rebuilt from the port latch through
/// `wiring`.
pub fn read<B>(
    bus: &mut B,
    address: BusAddress,
    edge: EdgeSelect,
    wiring: &DataBusWiring,
    calibration: &RulerCalibration,
) -> Result<u8, BusError>
where
    B: BusPins + CycleTiming,
{
    bus.write_control(ControlLine::ReadWrite, PinValue::High);
    bus.set_address_bus_mode(PinMode::Output);
    bus.write_address_bus(address);
    bus.set_data_bus_mode(PinMode::Input);

    let outcome = pulse(bus, edge, calibration.read_pulse_ticks, calibration, |bus| {
        bus.latch_ports(wiring.ports())
    });
    report(address, &outcome);

    let (_, latch) = outcome?;
    Ok(wiring.reassemble(&latch))
}

/// Synchronized write. The data bus is driven before phase acquisition
/// starts and stays driven through the pulse.
pub fn write<B>(
    bus: &mut B,
    address: BusAddress,
    data: u8,
    edge: EdgeSelect,
    calibration: &RulerCalibration,
) -> Result<(), BusError>
where
    B: BusPins + CycleTiming,
{
    bus.write_control(ControlLine::ReadWrite, PinValue::Low);
    bus.set_address_bus_mode(PinMode::Output);
    bus.write_address_bus(address);
    bus.set_data_bus_mode(PinMode::Output);
    bus.write_data_bus(data);

    let outcome = pulse(bus, edge, calibration.write_pulse_ticks, calibration, |_| ());

    // Back to read mode whether or not the pulse happened.
    bus.set_data_bus_mode(PinMode::Input);
    bus.write_control(ControlLine::ReadWrite, PinValue::High);

    report(address, &outcome);
    outcome.map(|_| ())
}
