//! Feeder configuration parameters
//!
//! Tunable parameters for the feeder controller.
//! Values can be overridden via NVS (non-volatile storage).

use serde::{Deserialize, Serialize};

/// Core feeder configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeederConfig {
    // --- MCU link ---
    /// UART baud rate of the motor-controller link
    pub uart_baud_rate: u32,

    // --- Timing ---
    /// Network presence poll period (microseconds)
    pub network_check_interval_us: u64,
    /// Schedule comparison period (milliseconds, >= 60 s)
    pub schedule_check_interval_ms: u32,
    /// Main loop pacing delay (milliseconds)
    pub loop_interval_ms: u32,
    /// Task watchdog timeout (milliseconds)
    pub watchdog_timeout_ms: u32,

    // --- Features ---
    /// Track acknowledged portions in persistent storage
    pub portions_counter_enabled: bool,
}

impl Default for FeederConfig {
    fn default() -> Self {
        Self {
            // MCU link
            uart_baud_rate: 9600,

            // Timing
            network_check_interval_us: 5_000_000, // 5 s
            schedule_check_interval_ms: 60_000,   // 1/min
            loop_interval_ms: 50,                 // 20 Hz
            watchdog_timeout_ms: 10_000,

            // Features
            portions_counter_enabled: true,
        }
    }
}
