//! Outbound application events.
//!
//! The [`FeederController`](super::service::FeederController) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on
//! the other side decide what to do with them: log to serial, forward
//! to the home-automation host, etc.

use crate::schedule::FeedingSchedule;

/// Host event name for an automatic (scheduled) feeding.
pub const AUTO_FEEDING_EVENT: &str = "petfeeder.auto_feeding";

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The controller finished setup (carries the loaded schedule count).
    Started { schedules: usize },

    /// A schedule matched the current minute and a feed was sent.
    AutoFeedingFired(FeedingSchedule),

    /// The motor controller acknowledged dispensed portions.
    PortionsCounted { added: u8, total: u32 },

    /// Network presence changed (edge only).
    NetworkChanged { connected: bool },
}
