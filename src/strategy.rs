//! # Memory strategy table
//!
//! Maps address ranges to the bus cycle used to service reads and writes
//! there. Tables are ordered: the first entry whose range contains the
//! address wins, so more specific ranges must be listed before broader ones.
//! A zero-length entry terminates the table; anything after it is ignored.
//!
//! ```rust
//! use arcade_ict::strategy::{lookup, MemoryStrategy, Strategy};
//!
//! let table = [
//!     MemoryStrategy::uniform(0x0400, 0x0400, Strategy::SyncPhi0SkipOnePulse),
//!     MemoryStrategy::END,
//! ];
//! assert_eq!(lookup(&table, 0x0500).0, Strategy::SyncPhi0SkipOnePulse);
//! assert_eq!(lookup(&table, 0x2000).0, Strategy::Default);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::BusAddress;

/// How one access (read or write) to an address is carried out.
///
/// The same tag set is used for the read column and the write column of a
/// table entry; the two are resolved independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Ordinary asynchronous strobe-and-sample cycle.
    #[default]
    Default,
    /// Phi0-synchronized cycle acting on the first rising edge after lock.
    SyncPhi0,
    /// Phi0-synchronized cycle for hardware that drops every other phi0
    /// pulse; acts on the second rising edge after lock.
    SyncPhi0SkipOnePulse,
    /// A strategy named by a board profile that this build does not know.
    /// Always fails closed.
    #[serde(other)]
    Unsupported,
}

impl Strategy {
    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Default => "default",
            Strategy::SyncPhi0 => "sync_phi0",
            Strategy::SyncPhi0SkipOnePulse => "sync_phi0_skip_one_pulse",
            Strategy::Unsupported => "unsupported",
        }
    }

    pub fn is_synchronized(&self) -> bool {
        matches!(self, Strategy::SyncPhi0 | Strategy::SyncPhi0SkipOnePulse)
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One row of a strategy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryStrategy {
    pub start: u16,
    pub length: u16,
    #[serde(default)]
    pub read: Strategy,
    #[serde(default)]
    pub write: Strategy,
}

impl MemoryStrategy {
    /// Terminating sentinel.
    pub const END: MemoryStrategy = MemoryStrategy::new(0, 0, Strategy::Default, Strategy::Default);

    pub const fn new(start: u16, length: u16, read: Strategy, write: Strategy) -> Self {
        MemoryStrategy {
            start,
            length,
            read,
            write,
        }
    }

    /// Same strategy for reads and writes.
    pub const fn uniform(start: u16, length: u16, strategy: Strategy) -> Self {
        MemoryStrategy::new(start, length, strategy, strategy)
    }

    pub fn is_sentinel(&self) -> bool {
        self.length == 0
    }

    /// Range check done in 32 bits so a range ending at 0x10000 works and
    /// nothing wraps.
    pub fn contains(&self, address: BusAddress) -> bool {
        let address = u32::from(address.value());
        let start = u32::from(self.start);
        address >= start && address < start + u32::from(self.length)
    }
}

/// Find the `(read, write)` strategies for `address`.
///
/// The address is truncated to 16 bits before comparison. Scanning stops at
/// the first zero-length sentinel (or the end of the slice); with no match
/// both strategies are [`Strategy::Default`].
pub fn lookup(table: &[MemoryStrategy], address: u32) -> (Strategy, Strategy) {
    let address = BusAddress::truncate(address);
    table
        .iter()
        .take_while(|entry| !entry.is_sentinel())
        .find(|entry| entry.contains(address))
        .map(|entry| (entry.read, entry.write))
        .unwrap_or((Strategy::Default, Strategy::Default))
}

/// Entries before the sentinel.
pub fn live_entries(table: &[MemoryStrategy]) -> &[MemoryStrategy] {
    let end = table
        .iter()
        .position(MemoryStrategy::is_sentinel)
        .unwrap_or(table.len());
    &table[..end]
}

/// Centipede: the video RAM at 0x0400-0x07FF only answers in step with
/// phi0, which drops every other pulse while the CPU owns video RAM.
pub const CENTIPEDE: &[MemoryStrategy] = &[
    MemoryStrategy::uniform(0x0400, 0x0400, Strategy::SyncPhi0SkipOnePulse),
    MemoryStrategy::END,
];

/// Boards whose whole address space works with the asynchronous cycle.
pub const ALL_DEFAULT: &[MemoryStrategy] = &[MemoryStrategy::END];
