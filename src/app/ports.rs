//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ FeederController (domain)
//! ```
//!
//! Driven adapters (UART, NVS, wall clock, WiFi status, event sinks)
//! implement these traits.  The [`FeederController`](super::service::FeederController)
//! consumes them via generics, so the domain core never touches hardware
//! directly.
//!
//! ## Storage notes
//!
//! - **ConfigPort** implementations MUST validate before persisting.
//! - **StoragePort** keys are fixed strings chosen by the caller, never
//!   derived from runtime memory layout.

use crate::config::FeederConfig;
use crate::link::frame::Frame;
use crate::schedule::FeedingSchedule;

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / host API)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log,
/// host API event bus, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: system timer + RTC → domain)
// ───────────────────────────────────────────────────────────────

/// Local wall-clock time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalTime {
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl LocalTime {
    pub const fn new(hour: u8, minute: u8, second: u8) -> Self {
        Self {
            hour,
            minute,
            second,
        }
    }
}

/// Monotonic and wall-clock time source.
pub trait ClockPort {
    /// Microseconds since boot (monotonic).
    fn uptime_us(&self) -> u64;

    /// Current local time of day, or `None` if the wall clock has not been
    /// synchronised yet.
    fn local_time(&self) -> Option<LocalTime>;
}

// ───────────────────────────────────────────────────────────────
// Network presence port
// ───────────────────────────────────────────────────────────────

/// Level-reporting network status.  Edge detection is the caller's job.
pub trait NetworkPort {
    fn is_connected(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Link callbacks
// ───────────────────────────────────────────────────────────────

/// Receives every checksum-valid frame the link pump decodes.
pub trait FrameHandler {
    fn on_frame(&mut self, frame: &Frame);
}

/// Callback the [`ScheduleRunner`](crate::scheduler::ScheduleRunner)
/// invokes for each schedule matching the current minute.
pub trait FeedDelegate {
    fn on_feeding_due(&mut self, schedule: &FeedingSchedule);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists the feeder configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`FeederConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<FeederConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &FeederConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ NVS / flash)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage for schedules and the portion counter.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - A single `write` MUST be atomic: no partial record on power loss.
///   The ESP-IDF NVS API guarantees this natively.
pub trait StoragePort {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;

    /// Flush every pending write in `namespace` to flash.  Returns only
    /// once the data is durable.
    fn commit(&mut self, _namespace: &str) -> Result<(), StorageError> {
        Ok(())
    }
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// No config found in storage (first boot).
    NotFound,
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
    /// Underlying storage is full.
    StorageFull,
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Storage partition is full.
    Full,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::StorageFull => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::Full => write!(f, "storage full"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
