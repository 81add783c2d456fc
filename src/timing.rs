//! Calibrated busy-waits and the interrupt discipline of the synchronized cycle.
//!
//! A "ruler" is a fixed run of instructions used as a timer. Its length only
//! means something on one processor at one clock speed, so every ruler is a
//! tick count in a [`RulerCalibration`] measured for that platform, and the
//! platform supplies the busy-wait that burns those ticks.

use serde::{Deserialize, Serialize};

use crate::components::common::port_wiring::{PortId, PortLatch};

/// Timing primitives a platform offers the bus cycles.
pub trait CycleTiming {
    /// Busy-wait for `ticks` platform ticks. Must not yield.
    fn spin(&mut self, ticks: u32);

    fn disable_interrupts(&mut self);

    fn enable_interrupts(&mut self);

    /// Read the listed raw input-port registers back to back.
    fn latch_ports(&mut self, ports: &[PortId]) -> PortLatch;

    /// Whether this platform can run the phi0-synchronized cycle at all.
    fn supports_synchronized_cycle(&self) -> bool {
        false
    }

    /// Run `f` with interrupts disabled and re-enable them once `f`
    /// returns, whether it returns `Ok` or `Err`. A panic inside `f` leaves
    /// them disabled.
    fn without_interrupts<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R
    where
        Self: Sized,
    {
        self.disable_interrupts();
        let result = f(self);
        self.enable_interrupts();
        result
    }
}

/// Measured ruler lengths for one controller clock and one phi0 frequency.
///
/// All `*_ticks` fields are in platform ticks (`tick_ps` picoseconds each).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulerCalibration {
    /// Length of one tick.
    pub tick_ps: u32,
    /// Address/data settle time on either side of the generic cycle's strobe.
    pub settle_ticks: u32,
    /// One iteration of the coarse "wait for low / wait for high" polls.
    pub coarse_poll_ticks: u32,
    /// Shortened first ruler pass after coarse acquisition; lands the first
    /// fine check in the low half of phi0.
    pub short_sync_ticks: u32,
    /// Full ruler pass, slightly longer than one phi0 period.
    pub sync_ruler_ticks: u32,
    /// From lock to just before the next phi0 rising edge.
    pub wait_out_ticks: u32,
    /// One extra phi0 period, added when a pulse is known to be dropped.
    pub skipped_pulse_ticks: u32,
    /// Phi2 high time for a synchronized read. Short so the ports are
    /// latched while the target still drives the data bus.
    pub read_pulse_ticks: u32,
    /// Phi2 high time for a synchronized write.
    pub write_pulse_ticks: u32,
    /// Maximum polls in each acquisition phase before reporting
    /// `NoClockDetected`.
    pub poll_limit: u32,
}

impl RulerCalibration {
    /// ATmega2560 at 16 MHz (62.5 ns per instruction cycle) against a 1.5 MHz
    /// phi0 (666.7 ns period).
    ///
    /// | ruler            | ticks | time     |
    /// |------------------|-------|----------|
    /// | coarse poll      | 3     | 187.5 ns |
    /// | short sync       | 6     | 375.0 ns |
    /// | sync ruler       | 11    | 687.5 ns (period + 20.8 ns) |
    /// | wait out         | 10    | 625.0 ns |
    /// | skipped pulse    | 11    | 687.5 ns |
    /// | read phi2 high   | 1     | 62.5 ns  |
    /// | write phi2 high  | 3     | 187.5 ns |
    pub const MEGA2560_16MHZ_PHI0_1_5MHZ: RulerCalibration = RulerCalibration {
        tick_ps: 62_500,
        settle_ticks: 8,
        coarse_poll_ticks: 3,
        short_sync_ticks: 6,
        sync_ruler_ticks: 11,
        wait_out_ticks: 10,
        skipped_pulse_ticks: 11,
        read_pulse_ticks: 1,
        write_pulse_ticks: 3,
        poll_limit: 1_000,
    };

    pub fn ticks_to_ps(&self, ticks: u32) -> u64 {
        u64::from(ticks) * u64::from(self.tick_ps)
    }

    /// Ticks to wait between lock and the phi2 pulse.
    pub fn wait_out(&self, skip_one_pulse: bool) -> u32 {
        if skip_one_pulse {
            self.wait_out_ticks + self.skipped_pulse_ticks
        } else {
            self.wait_out_ticks
        }
    }

    /// Upper bound on polls one synchronized cycle can spend acquiring
    /// phase before it gives up (coarse low, coarse high, fine).
    pub fn max_acquisition_polls(&self) -> u32 {
        self.poll_limit.saturating_mul(3)
    }
}

impl Default for RulerCalibration {
    fn default() -> Self {
        RulerCalibration::MEGA2560_16MHZ_PHI0_1_5MHZ
    }
}
