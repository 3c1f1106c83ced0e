//! Schedule runner: fires feedings on an exact hour:minute match.
//!
//! Runs on a coarse tick: the comparison happens at most once per check
//! interval (never shorter than 60 s of monotonic time), which is what
//! keeps a schedule from firing twice within its minute.  No "already
//! fired" bookkeeping is kept.
//!
//! ```text
//! ┌───────────┐   now - last ≥ 60 s   ┌──────────────┐  match   ┌──────────────┐
//! │ main loop │ ────────────────────▶ │ ScheduleRunner│ ───────▶ │ FeedDelegate │
//! └───────────┘                       └──────┬───────┘          │ (event+feed) │
//!                                            │ no wall clock    └──────────────┘
//!                                            ▼
//!                                          no-op
//! ```

use log::{debug, info};

use crate::app::ports::{FeedDelegate, LocalTime};
use crate::schedule::FeedingSchedule;

/// Floor on the check interval.  Anything shorter could fire a schedule
/// twice within the same minute.
pub const MIN_CHECK_INTERVAL_MS: u64 = 60_000;

/// Periodic comparator of local time against the schedule table.
pub struct ScheduleRunner {
    interval_ms: u64,
    last_check_ms: u64,
}

impl Default for ScheduleRunner {
    fn default() -> Self {
        Self::new(MIN_CHECK_INTERVAL_MS)
    }
}

impl ScheduleRunner {
    /// Build a runner checking every `interval_ms` (floored at 60 s).
    pub fn new(interval_ms: u64) -> Self {
        Self {
            interval_ms: interval_ms.max(MIN_CHECK_INTERVAL_MS),
            last_check_ms: 0,
        }
    }

    pub fn interval_ms(&self) -> u64 {
        self.interval_ms
    }

    /// Run one check if the interval has elapsed.
    ///
    /// * `now_ms`: monotonic milliseconds since boot.
    /// * `local`: current local time, `None` before the clock is synced.
    /// * `schedules`: table to compare against, fired in table order.
    ///
    /// Returns the number of schedules fired.
    pub fn tick(
        &mut self,
        now_ms: u64,
        local: Option<LocalTime>,
        schedules: &[FeedingSchedule],
        delegate: &mut dyn FeedDelegate,
    ) -> usize {
        if now_ms.saturating_sub(self.last_check_ms) < self.interval_ms {
            return 0;
        }
        self.last_check_ms = now_ms;

        if schedules.is_empty() {
            return 0;
        }

        let Some(time) = local else {
            debug!("scheduler: no valid time available, skipping check");
            return 0;
        };

        let mut fired = 0;
        for schedule in schedules.iter().filter(|s| s.matches(time.hour, time.minute)) {
            info!("scheduler: feeding time! {}", schedule);
            delegate.on_feeding_due(schedule);
            fired += 1;
        }
        fired
    }
}
