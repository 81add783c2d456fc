use serde::{Deserialize, Serialize};

/// Logical level of a single physical pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinValue {
    Low,
    High,
    HighZ, // Tri-state, nothing driving the line
}

impl PinValue {
    pub fn to_str(&self) -> &'static str {
        match self {
            PinValue::Low => "Low",
            PinValue::High => "High",
            PinValue::HighZ => "HighZ",
        }
    }

    pub fn to_char(&self) -> char {
        match self {
            PinValue::Low => '0',
            PinValue::High => '1',
            PinValue::HighZ => 'Z',
        }
    }

    pub fn from_bool(value: bool) -> Self {
        if value {
            PinValue::High
        } else {
            PinValue::Low
        }
    }

    pub fn to_bool(&self) -> Option<bool> {
        match self {
            PinValue::Low => Some(false),
            PinValue::High => Some(true),
            PinValue::HighZ => None,
        }
    }

    /// Level as seen by an input with a pull-up: a floating line reads high.
    pub fn is_high_pulled_up(&self) -> bool {
        !matches!(self, PinValue::Low)
    }
}

impl std::fmt::Display for PinValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// Direction of a pin or a whole bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinMode {
    Input,
    Output,
}

/// Named control signals of the emulated CPU socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlLine {
    /// R/W select. High is a read, low is a write.
    ReadWrite,
    /// The board's own clock arriving at the socket (phi0 on a 6502).
    ClockIn,
    /// The clock the tester generates in place of the CPU (phi2 on a 6502).
    /// Also serves as the access strobe of the generic cycle.
    ClockOut,
}

impl ControlLine {
    pub fn name(&self) -> &'static str {
        match self {
            ControlLine::ReadWrite => "R/W",
            ControlLine::ClockIn => "CLK_IN",
            ControlLine::ClockOut => "CLK_OUT",
        }
    }
}

/// Raw digital I/O of the controlling microcontroller, addressed by the
/// platform's own pin numbers.
pub trait DigitalPins {
    /// Number of addressable pins; valid pin numbers are `0..pin_count()`.
    fn pin_count(&self) -> u8;

    fn pin_mode(&mut self, pin: u8, mode: PinMode);

    fn digital_write(&mut self, pin: u8, level: PinValue);

    fn digital_read(&mut self, pin: u8) -> PinValue;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_value_conversions() {
        assert_eq!(PinValue::from_bool(true), PinValue::High);
        assert_eq!(PinValue::from_bool(false), PinValue::Low);
        assert_eq!(PinValue::High.to_bool(), Some(true));
        assert_eq!(PinValue::HighZ.to_bool(), None);
        assert_eq!(PinValue::HighZ.to_char(), 'Z');
    }

    #[test]
    fn test_floating_line_reads_high_with_pull_up() {
        assert!(PinValue::HighZ.is_high_pulled_up());
        assert!(PinValue::High.is_high_pulled_up());
        assert!(!PinValue::Low.is_high_pulled_up());
    }

    #[test]
    fn test_pin_value_json_names() {
        let json = serde_json::to_string(&PinValue::HighZ).unwrap();
        assert_eq!(json, "\"high_z\"");
        let mode: PinMode = serde_json::from_str("\"output\"").unwrap();
        assert_eq!(mode, PinMode::Output);
    }
}
