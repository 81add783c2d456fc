//! Simulated arcade PCB sitting behind the tester's CPU socket.
//!
//! Time is virtual: it only advances when the tester spins. Pin accesses
//! take no time. The board decodes the address and R/W lines on every phi2
//! rising edge and decides then whether the access will succeed:
//!
//! * asynchronous regions always answer;
//! * phi0-gated regions only answer when the phi2 rise falls inside the
//!   valid window around a phi0 rising edge that is actually present.
//!
//! A failed read drives the complement of the stored byte. A failed write
//! is dropped. Writes commit on the phi2 falling edge.

use crate::board_config::BoardProfile;
use crate::bus::PinMap;
use crate::components::clock::phi0_clock::Phi0Clock;
use crate::components::common::port_wiring::{DataBusWiring, PortId, PortLatch};
use crate::components::memory::generic_ram::GenericRam;
use crate::pin::{DigitalPins, PinMode, PinValue};
use crate::strategy::Strategy;
use crate::timing::{CycleTiming, RulerCalibration};

/// Digital pins on an Arduino Mega 2560.
pub const MEGA2560_PIN_COUNT: u8 = 70;

/// A phi2 rise this far before a phi0 rising edge still catches it.
pub const VALID_BEFORE_EDGE_PS: i64 = 125_000;
/// A phi2 rise this far after a phi0 rising edge still catches it.
pub const VALID_AFTER_EDGE_PS: i64 = 62_500;

/// Bits of a latched port register that are not wired to the data bus.
const UNRELATED_PORT_BITS: u8 = 0xA5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionTiming {
    Async,
    Phi0 { skip_alternate: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GatedRegion {
    pub start: u16,
    pub length: u16,
    pub timing: RegionTiming,
}

impl GatedRegion {
    fn contains(&self, address: u16) -> bool {
        let address = u32::from(address);
        let start = u32::from(self.start);
        address >= start && address < start + u32::from(self.length)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Address(u8),
    Data(u8),
    ReadWrite,
    ClockIn,
    ClockOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PendingWrite {
    address: u16,
    valid: bool,
}

/// Counters kept by the board for inspection by tests and the demo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BoardStats {
    pub phi2_pulses: u64,
    pub pulses_with_interrupts_enabled: u64,
    pub mistimed_accesses: u64,
    pub bus_contentions: u64,
    pub interrupt_disables: u64,
}

#[derive(Debug, Clone)]
pub struct ArcadeBoard {
    pin_map: PinMap,
    wiring: DataBusWiring,
    tick_ps: u64,
    roles: Vec<Option<Role>>,
    modes: Vec<PinMode>,
    levels: Vec<PinValue>,
    clock: Phi0Clock,
    memory: GenericRam,
    regions: Vec<GatedRegion>,
    now_ps: u64,
    interrupts_enabled: bool,
    synchronized_support: bool,
    driven: Option<u8>,
    pending_write: Option<PendingWrite>,
    stats: BoardStats,
}

impl ArcadeBoard {
    pub fn new(pin_map: PinMap, wiring: DataBusWiring, calibration: &RulerCalibration) -> Self {
        let pin_count = usize::from(MEGA2560_PIN_COUNT);
        let mut roles = vec![None; pin_count];
        let mut assign = |pin: u8, role: Role| {
            if let Some(slot) = roles.get_mut(usize::from(pin)) {
                *slot = Some(role);
            }
        };
        for (bit, pin) in pin_map.address.iter().enumerate() {
            assign(*pin, Role::Address(bit as u8));
        }
        for (bit, pin) in pin_map.data.iter().enumerate() {
            assign(*pin, Role::Data(bit as u8));
        }
        assign(pin_map.read_write, Role::ReadWrite);
        assign(pin_map.clock_in, Role::ClockIn);
        assign(pin_map.clock_out, Role::ClockOut);

        ArcadeBoard {
            pin_map,
            wiring,
            tick_ps: u64::from(calibration.tick_ps),
            roles,
            modes: vec![PinMode::Input; pin_count],
            levels: vec![PinValue::Low; pin_count],
            clock: Phi0Clock::default(),
            memory: GenericRam::full(),
            regions: Vec::new(),
            now_ps: 0,
            interrupts_enabled: true,
            synchronized_support: true,
            driven: None,
            pending_write: None,
            stats: BoardStats::default(),
        }
    }

    /// The board a profile describes: its pins, its wiring, and a phi0-gated
    /// region for every synchronized entry in its strategy table.
    pub fn for_profile(profile: &BoardProfile) -> Self {
        let mut board = ArcadeBoard::new(
            profile.pins.clone(),
            profile.wiring.clone(),
            &profile.calibration,
        );
        for entry in crate::strategy::live_entries(&profile.strategies) {
            let skip = [entry.read, entry.write].contains(&Strategy::SyncPhi0SkipOnePulse);
            let synced = entry.read.is_synchronized() || entry.write.is_synchronized();
            if synced {
                board = board.with_region(
                    entry.start,
                    entry.length,
                    RegionTiming::Phi0 {
                        skip_alternate: skip,
                    },
                );
            }
        }
        board
    }

    /// Regions are matched in the order added; unmatched addresses are
    /// asynchronous.
    pub fn with_region(mut self, start: u16, length: u16, timing: RegionTiming) -> Self {
        self.regions.push(GatedRegion {
            start,
            length,
            timing,
        });
        self
    }

    pub fn with_clock(mut self, clock: Phi0Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Model a controller without the port registers the synchronized cycle
    /// needs.
    pub fn without_synchronized_support(mut self) -> Self {
        self.synchronized_support = false;
        self
    }

    pub fn clock(&self) -> &Phi0Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Phi0Clock {
        &mut self.clock
    }

    pub fn memory(&self) -> &GenericRam {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut GenericRam {
        &mut self.memory
    }

    pub fn pin_map(&self) -> &PinMap {
        &self.pin_map
    }

    pub fn now_ps(&self) -> u64 {
        self.now_ps
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.interrupts_enabled
    }

    pub fn stats(&self) -> BoardStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = BoardStats::default();
    }

    pub fn region_timing(&self, address: u16) -> RegionTiming {
        self.regions
            .iter()
            .find(|region| region.contains(address))
            .map(|region| region.timing)
            .unwrap_or(RegionTiming::Async)
    }

    pub fn level(&self, pin: u8) -> PinValue {
        self.levels
            .get(usize::from(pin))
            .copied()
            .unwrap_or(PinValue::HighZ)
    }

    pub fn mode(&self, pin: u8) -> PinMode {
        self.modes
            .get(usize::from(pin))
            .copied()
            .unwrap_or(PinMode::Input)
    }

    fn role(&self, pin: u8) -> Option<Role> {
        self.roles.get(usize::from(pin)).copied().flatten()
    }

    /// Address currently presented by the tester.
    pub fn address(&self) -> u16 {
        self.pin_map
            .address
            .iter()
            .enumerate()
            .filter(|(_, pin)| self.mode(**pin) == PinMode::Output && self.level(**pin) == PinValue::High)
            .fold(0u16, |address, (bit, _)| address | (1 << bit))
    }

    fn tester_drives_data(&self) -> bool {
        self.pin_map
            .data
            .iter()
            .any(|pin| self.mode(*pin) == PinMode::Output)
    }

    /// Data byte as the tester's outputs present it. Undriven bits float high.
    fn tester_data(&self) -> u8 {
        self.pin_map
            .data
            .iter()
            .enumerate()
            .filter(|(_, pin)| self.mode(**pin) == PinMode::Input || self.level(**pin) == PinValue::High)
            .fold(0u8, |data, (bit, _)| data | (1 << bit))
    }

    fn skipping(&self) -> bool {
        matches!(
            self.region_timing(self.address()),
            RegionTiming::Phi0 {
                skip_alternate: true
            }
        )
    }

    fn is_read(&self) -> bool {
        self.level(self.pin_map.read_write) != PinValue::Low
    }

    fn access_valid(&self) -> bool {
        match self.region_timing(self.address()) {
            RegionTiming::Async => true,
            RegionTiming::Phi0 { skip_alternate } => {
                let (offset, present) = self.clock.nearest_rising_edge(self.now_ps, skip_alternate);
                present && (-VALID_BEFORE_EDGE_PS..=VALID_AFTER_EDGE_PS).contains(&offset)
            }
        }
    }

    fn phi2_rise(&mut self) {
        self.stats.phi2_pulses += 1;
        if self.interrupts_enabled {
            self.stats.pulses_with_interrupts_enabled += 1;
        }

        let address = self.address();
        let valid = self.access_valid();
        if !valid {
            self.stats.mistimed_accesses += 1;
        }

        if self.is_read() {
            if self.tester_drives_data() {
                self.stats.bus_contentions += 1;
            }
            let stored = self.memory.read(address);
            self.driven = Some(if valid { stored } else { !stored });
        } else {
            self.pending_write = Some(PendingWrite { address, valid });
        }
    }

    fn phi2_fall(&mut self) {
        if let Some(write) = self.pending_write.take() {
            if write.valid && !self.is_read() {
                let data = self.tester_data();
                self.memory.write(write.address, data);
            }
        }
    }

    /// Data byte seen by the tester's inputs.
    fn visible_data(&self) -> u8 {
        let mut data = 0u8;
        for bit in 0..8u8 {
            let pin = self.pin_map.data[usize::from(bit)];
            if self.data_pin_level(pin, bit).is_high_pulled_up() {
                data |= 1 << bit;
            }
        }
        data
    }

    fn data_pin_level(&self, pin: u8, bit: u8) -> PinValue {
        if self.mode(pin) == PinMode::Output {
            return self.level(pin);
        }
        match self.driven {
            Some(value) => PinValue::from_bool(value & (1 << bit) != 0),
            None => PinValue::HighZ,
        }
    }
}

impl DigitalPins for ArcadeBoard {
    fn pin_count(&self) -> u8 {
        MEGA2560_PIN_COUNT
    }

    fn pin_mode(&mut self, pin: u8, mode: PinMode) {
        if let Some(slot) = self.modes.get_mut(usize::from(pin)) {
            *slot = mode;
        }
    }

    fn digital_write(&mut self, pin: u8, level: PinValue) {
        let index = usize::from(pin);
        let previous = match self.levels.get(index) {
            Some(previous) => *previous,
            None => return,
        };
        self.levels[index] = level;

        match self.role(pin) {
            Some(Role::ClockOut) => {
                if previous != PinValue::High && level == PinValue::High {
                    self.phi2_rise();
                } else if previous == PinValue::High && level != PinValue::High {
                    self.phi2_fall();
                }
            }
            Some(Role::Address(_)) | Some(Role::ReadWrite) => {
                if previous != level {
                    self.driven = None;
                }
            }
            _ => {}
        }
    }

    fn digital_read(&mut self, pin: u8) -> PinValue {
        match self.role(pin) {
            Some(Role::ClockIn) => self.clock.level_at(self.now_ps, self.skipping()),
            Some(Role::Data(bit)) => self.data_pin_level(pin, bit),
            _ => self.level(pin),
        }
    }
}

impl CycleTiming for ArcadeBoard {
    fn spin(&mut self, ticks: u32) {
        self.now_ps += u64::from(ticks) * self.tick_ps;
    }

    fn disable_interrupts(&mut self) {
        self.stats.interrupt_disables += 1;
        self.interrupts_enabled = false;
    }

    fn enable_interrupts(&mut self) {
        self.interrupts_enabled = true;
    }

    fn latch_ports(&mut self, ports: &[PortId]) -> PortLatch {
        self.wiring
            .scatter(self.visible_data(), UNRELATED_PORT_BITS, ports)
    }

    fn supports_synchronized_cycle(&self) -> bool {
        self.synchronized_support
    }
}
