//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the ESP-IDF
//! logger (UART / USB-CDC in production).  Automatic feedings are also
//! rendered as the JSON event the home-automation host consumes, e.g.
//!
//! ```text
//! EVENT | {"event":"petfeeder.auto_feeding","data":{"hour":7,"minute":30,"portions":2}}
//! ```

use log::{info, warn};
use serde::Serialize;

use crate::app::events::{AUTO_FEEDING_EVENT, AppEvent};
use crate::app::ports::EventSink;
use crate::schedule::FeedingSchedule;

/// Host-facing event envelope.
#[derive(Debug, Serialize)]
pub struct HostEvent<'a> {
    pub event: &'static str,
    pub data: &'a FeedingSchedule,
}

impl<'a> HostEvent<'a> {
    pub fn auto_feeding(schedule: &'a FeedingSchedule) -> Self {
        Self {
            event: AUTO_FEEDING_EVENT,
            data: schedule,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink {
    auto_feedings: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of auto-feeding events published since boot.
    pub fn auto_feedings(&self) -> u32 {
        self.auto_feedings
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { schedules } => {
                info!("START | schedules={}", schedules);
            }
            AppEvent::AutoFeedingFired(schedule) => {
                self.auto_feedings = self.auto_feedings.wrapping_add(1);
                match HostEvent::auto_feeding(schedule).to_json() {
                    Ok(json) => info!("EVENT | {}", json),
                    Err(e) => warn!("EVENT | {} encode failed: {}", AUTO_FEEDING_EVENT, e),
                }
            }
            AppEvent::PortionsCounted { added, total } => {
                info!("COUNT | +{} portions, total={}", added, total);
            }
            AppEvent::NetworkChanged { connected } => {
                info!(
                    "NET   | {}",
                    if *connected { "connected" } else { "disconnected" }
                );
            }
        }
    }
}
