//! Inbound commands to the feeder controller.
//!
//! These are the actions the host (home-automation API, serial console,
//! tests) may invoke.  The [`FeederController`](super::service::FeederController)
//! interprets them; none of them return a structured error, failures are
//! logged and the command becomes a no-op.
//!
//! On the wire (serial console) a command is one JSON object per line,
//! tagged by its service name:
//!
//! ```text
//! {"service":"feed_pet","portions":2}
//! {"service":"add_feeding_schedule","hour":7,"minute":30,"portions":2}
//! {"service":"clear_feeding_schedules"}
//! ```

use serde::{Deserialize, Serialize};

/// Host-invocable feeder actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "service", rename_all = "snake_case")]
pub enum FeederCommand {
    /// Dispense `portions` now.
    FeedPet { portions: i32 },

    /// Send a raw single-byte-payload frame (diagnostics only).
    TestMessage {
        target: i32,
        source: i32,
        command: i32,
        value: i32,
    },

    /// Append a daily feeding at `hour:minute` and persist the table.
    AddFeedingSchedule { hour: i32, minute: i32, portions: i32 },

    /// Remove every feeding schedule and persist the empty table.
    ClearFeedingSchedules,
}

impl FeederCommand {
    /// Service name the host registers this action under.
    pub fn service_name(&self) -> &'static str {
        match self {
            Self::FeedPet { .. } => "feed_pet",
            Self::TestMessage { .. } => "test_message",
            Self::AddFeedingSchedule { .. } => "add_feeding_schedule",
            Self::ClearFeedingSchedules => "clear_feeding_schedules",
        }
    }
}

/// Decode one console line into a command.
pub fn parse_command(line: &str) -> Result<FeederCommand, serde_json::Error> {
    serde_json::from_str(line.trim())
}
