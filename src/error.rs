use std::fmt;

use thiserror::Error;

use crate::components::cpu::sync_cycle::SyncPhase;
use crate::strategy::Strategy;

/// Which half of the dispatch layer produced an outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Access::Read => write!(f, "read"),
            Access::Write => write!(f, "write"),
        }
    }
}

/// Outcome of a bus cycle that did not produce valid data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// The strategy has no implementation in this build or on this platform.
    /// Any data the caller holds for this access is not valid.
    #[error("{access} strategy '{strategy}' is not implemented on this platform")]
    NotImplemented { access: Access, strategy: Strategy },

    /// Phase acquisition ran out of its poll budget; the external clock is
    /// absent or stuck.
    #[error("no clock detected: {phase:?} gave up after {polls} polls")]
    NoClockDetected { phase: SyncPhase, polls: u32 },
}

/// Start-up configuration failures. None of these can occur once a tester
/// has been constructed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read board profile '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse board profile: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{signal} is assigned to pin {pin}, but the platform only has pins 0..{pin_count}")]
    InvalidPin {
        signal: String,
        pin: u8,
        pin_count: u8,
    },

    #[error("pin {pin} is assigned to both {first} and {second}")]
    DuplicatePin {
        pin: u8,
        first: String,
        second: String,
    },

    #[error("address bus must have 1 to 16 pins, got {0}")]
    AddressWidth(usize),

    #[error("invalid data bus wiring: {0}")]
    InvalidWiring(String),

    #[error("unknown board '{0}'")]
    UnknownBoard(String),

    #[error("board '{board}' uses strategy '{strategy}', which needs a phi0/phi2 CPU, not {cpu}")]
    SyncOnNonPhi0Cpu {
        board: String,
        strategy: Strategy,
        cpu: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_failure() {
        let err = BusError::NotImplemented {
            access: Access::Write,
            strategy: Strategy::SyncPhi0SkipOnePulse,
        };
        assert_eq!(
            err.to_string(),
            "write strategy 'sync_phi0_skip_one_pulse' is not implemented on this platform"
        );

        let err = BusError::NoClockDetected {
            phase: SyncPhase::CoarseAcquire,
            polls: 1000,
        };
        assert!(err.to_string().contains("1000 polls"));
    }
}
