//! Error types for the feeder core.
//!
//! All variants are `Copy` so they can be logged and passed around without
//! allocation.  None of them ever crosses the action surface: the
//! controller logs them and keeps the device running.

use core::fmt;

// ---------------------------------------------------------------------------
// Schedule errors
// ---------------------------------------------------------------------------

/// Why a feeding schedule was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    /// Hour outside `0..=23`.
    HourOutOfRange(i32),
    /// Minute outside `0..=59`.
    MinuteOutOfRange(i32),
    /// Portions outside `1..=99`.
    PortionsOutOfRange(i32),
    /// All schedule slots are in use.
    TableFull,
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HourOutOfRange(h) => write!(f, "hour {h} out of range (0-23)"),
            Self::MinuteOutOfRange(m) => write!(f, "minute {m} out of range (0-59)"),
            Self::PortionsOutOfRange(p) => write!(f, "portions {p} out of range (1-99)"),
            Self::TableFull => write!(f, "schedule table full"),
        }
    }
}

// ---------------------------------------------------------------------------
// Link errors
// ---------------------------------------------------------------------------

/// Failures of an outbound send on the MCU link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// Payload does not fit the one-byte length field.
    PayloadTooLong(usize),
    /// The transport rejected the write.
    Transport,
    /// The transport accepted fewer bytes than the frame holds.
    ShortWrite { written: usize, expected: usize },
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayloadTooLong(len) => write!(f, "payload of {len} bytes exceeds 255"),
            Self::Transport => write!(f, "transport write failed"),
            Self::ShortWrite { written, expected } => {
                write!(f, "short write ({written} of {expected} bytes)")
            }
        }
    }
}
