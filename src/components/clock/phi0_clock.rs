use crate::pin::PinValue;

/// The target board's free-running phi0, in picoseconds of virtual time.
///
/// Rising edges sit at `phase + k * period`. When alternate pulses are
/// dropped only even `k` produce a pulse; odd-`k` periods read low
/// throughout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Phi0Clock {
    period_ps: u64,
    high_ps: u64,
    phase_ps: u64,
    stuck: Option<PinValue>,
}

impl Phi0Clock {
    /// 1.5 MHz, 50% duty cycle.
    pub const PERIOD_1_5MHZ_PS: u64 = 666_667;

    pub fn new(period_ps: u64, high_ps: u64) -> Self {
        let period_ps = period_ps.max(2);
        Phi0Clock {
            period_ps,
            high_ps: high_ps.clamp(1, period_ps - 1),
            phase_ps: 0,
            stuck: None,
        }
    }

    pub fn mhz_1_5() -> Self {
        Phi0Clock::new(Self::PERIOD_1_5MHZ_PS, Self::PERIOD_1_5MHZ_PS / 2)
    }

    pub fn period_ps(&self) -> u64 {
        self.period_ps
    }

    pub fn high_ps(&self) -> u64 {
        self.high_ps
    }

    pub fn phase_ps(&self) -> u64 {
        self.phase_ps
    }

    pub fn set_phase(&mut self, phase_ps: u64) {
        self.phase_ps = phase_ps % self.period_ps;
    }

    /// Move every edge later by `delta_ps`.
    pub fn shift_phase(&mut self, delta_ps: u64) {
        self.phase_ps = (self.phase_ps + delta_ps % self.period_ps) % self.period_ps;
    }

    /// Hold the line at `level` until [`Self::start`].
    pub fn stop(&mut self, level: PinValue) {
        self.stuck = Some(level);
    }

    pub fn start(&mut self) {
        self.stuck = None;
    }

    pub fn is_running(&self) -> bool {
        self.stuck.is_none()
    }

    fn position(&self, now_ps: u64) -> (i64, u64) {
        let offset = now_ps as i128 - self.phase_ps as i128;
        let period = self.period_ps as i128;
        (offset.div_euclid(period) as i64, offset.rem_euclid(period) as u64)
    }

    pub fn level_at(&self, now_ps: u64, skip_alternate: bool) -> PinValue {
        if let Some(level) = self.stuck {
            return level;
        }
        let (k, into_period) = self.position(now_ps);
        let pulse_present = !skip_alternate || k.rem_euclid(2) == 0;
        PinValue::from_bool(pulse_present && into_period < self.high_ps)
    }

    /// Signed distance from the rising edge nearest to `now_ps`, and whether
    /// that edge actually produces a pulse.
    pub fn nearest_rising_edge(&self, now_ps: u64, skip_alternate: bool) -> (i64, bool) {
        if self.stuck.is_some() {
            return (0, false);
        }
        let (mut k, into_period) = self.position(now_ps);
        let mut offset = into_period as i64;
        if into_period * 2 >= self.period_ps {
            k += 1;
            offset -= self.period_ps as i64;
        }
        let present = !skip_alternate || k.rem_euclid(2) == 0;
        (offset, present)
    }
}

impl Default for Phi0Clock {
    fn default() -> Self {
        Phi0Clock::mhz_1_5()
    }
}
