//! Feeding schedules.
//!
//! A schedule's identity is its position in the fixed-capacity table;
//! schedules are never edited in place, only appended or cleared as a
//! whole.  Each one persists as a single `u32` record:
//!
//! ```text
//! bits 31..24   23..16   15..8    7..0
//!      unused   hour     minute   portions
//! ```
//!
//! A zero record is the "empty slot" sentinel; it can never be a valid
//! schedule because portions must be at least 1.

pub mod store;

use serde::{Deserialize, Serialize};

use crate::error::ScheduleError;

/// Fixed number of schedule slots in storage.
pub const MAX_SCHEDULES: usize = 20;

/// Largest accepted portion count.  Kept below 100 so that a corrupted
/// byte is unlikely to pass validation.
pub const MAX_PORTIONS: u8 = 99;

/// Sentinel record for an unused slot.
pub const EMPTY_RECORD: u32 = 0;

/// In-memory schedule table.
pub type ScheduleTable = heapless::Vec<FeedingSchedule, MAX_SCHEDULES>;

/// One daily feeding at `hour:minute`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedingSchedule {
    pub hour: u8,
    pub minute: u8,
    pub portions: u8,
}

impl FeedingSchedule {
    /// Validate host-supplied values and build a schedule.
    pub fn new(hour: i32, minute: i32, portions: i32) -> Result<Self, ScheduleError> {
        if !(0..=23).contains(&hour) {
            return Err(ScheduleError::HourOutOfRange(hour));
        }
        if !(0..=59).contains(&minute) {
            return Err(ScheduleError::MinuteOutOfRange(minute));
        }
        if !(1..=i32::from(MAX_PORTIONS)).contains(&portions) {
            return Err(ScheduleError::PortionsOutOfRange(portions));
        }
        Ok(Self {
            hour: hour as u8,
            minute: minute as u8,
            portions: portions as u8,
        })
    }

    /// Pack into the persisted record layout.
    pub fn to_record(self) -> u32 {
        (u32::from(self.hour) << 16) | (u32::from(self.minute) << 8) | u32::from(self.portions)
    }

    /// Unpack and validate a persisted record.
    ///
    /// The unused top byte is ignored, matching the on-flash layout.
    pub fn from_record(record: u32) -> Result<Self, ScheduleError> {
        let hour = ((record >> 16) & 0xFF) as i32;
        let minute = ((record >> 8) & 0xFF) as i32;
        let portions = (record & 0xFF) as i32;
        Self::new(hour, minute, portions)
    }

    /// Whether this schedule fires at `hour:minute`.
    pub fn matches(&self, hour: u8, minute: u8) -> bool {
        self.hour == hour && self.minute == minute
    }
}

impl core::fmt::Display for FeedingSchedule {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{:02}:{:02} - {} portions",
            self.hour, self.minute, self.portions
        )
    }
}
