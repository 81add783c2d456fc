//! Region descriptors: what a range of the target's address space is for,
//! as test routines see it. How each address is accessed still comes from
//! the strategy table.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::strategy::{lookup, MemoryStrategy, Strategy};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionKind {
    Rom,
    Ram,
    Input,
    Output,
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RegionKind::Rom => "ROM",
            RegionKind::Ram => "RAM",
            RegionKind::Input => "IN",
            RegionKind::Output => "OUT",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionDescriptor {
    pub kind: RegionKind,
    pub start: u16,
    pub length: u16,
    #[serde(default)]
    pub label: String,
}

impl RegionDescriptor {
    /// One past the last address, in 32 bits so 0x10000 is representable.
    pub fn end(&self) -> u32 {
        u32::from(self.start) + u32::from(self.length)
    }
}

/// A run of a region serviced by one `(read, write)` strategy pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionSegment {
    pub start: u32,
    pub length: u32,
    pub read: Strategy,
    pub write: Strategy,
}

/// Split `region` into maximal runs with the same strategies.
pub fn segments(table: &[MemoryStrategy], region: &RegionDescriptor) -> Vec<RegionSegment> {
    let mut runs: Vec<RegionSegment> = Vec::new();
    for address in u32::from(region.start)..region.end() {
        let (read, write) = lookup(table, address);
        match runs.last_mut() {
            Some(run) if run.read == read && run.write == write => run.length += 1,
            _ => runs.push(RegionSegment {
                start: address,
                length: 1,
                read,
                write,
            }),
        }
    }
    runs
}
