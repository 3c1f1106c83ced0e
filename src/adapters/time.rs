//! ESP32 time adapter.
//!
//! Implements [`ClockPort`]: monotonic uptime plus local wall-clock time.
//!
//! - **`target_os = "espidf"`**: wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer, and `gettimeofday` + `localtime_r` for
//!   the wall clock (set by SNTP, timezone from `TZ`).
//! - **`not(target_os = "espidf")`**: uses `std::time::Instant` and a
//!   settable simulated wall clock for host-side tests.

use crate::app::ports::{ClockPort, LocalTime};

/// Wall-clock seconds before 2020-01-01 mean the clock was never synced.
pub const EPOCH_2020: i64 = 1_577_836_800;

/// `true` when `epoch_secs` looks like a synchronised wall clock.
pub fn is_synced(epoch_secs: i64) -> bool {
    epoch_secs >= EPOCH_2020
}

/// Time adapter for the ESP32 platform.
pub struct Esp32TimeAdapter {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
    #[cfg(not(target_os = "espidf"))]
    local: std::cell::Cell<Option<LocalTime>>,
}

impl Default for Esp32TimeAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl Esp32TimeAdapter {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
            #[cfg(not(target_os = "espidf"))]
            local: std::cell::Cell::new(None),
        }
    }

    /// Set the simulated wall clock (`None` = unsynced).
    #[cfg(not(target_os = "espidf"))]
    pub fn set_local_time(&self, time: Option<LocalTime>) {
        self.local.set(time);
    }
}

impl ClockPort for Esp32TimeAdapter {
    #[cfg(target_os = "espidf")]
    fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    #[cfg(not(target_os = "espidf"))]
    fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }

    #[cfg(target_os = "espidf")]
    fn local_time(&self) -> Option<LocalTime> {
        use core::ptr;
        let mut tv = esp_idf_svc::sys::timeval {
            tv_sec: 0,
            tv_usec: 0,
        };
        if unsafe { esp_idf_svc::sys::gettimeofday(&mut tv, ptr::null_mut()) } != 0 {
            return None;
        }
        if !is_synced(tv.tv_sec as i64) {
            return None;
        }
        let secs = tv.tv_sec as esp_idf_svc::sys::time_t;
        let mut tm: esp_idf_svc::sys::tm = unsafe { core::mem::zeroed() };
        if unsafe { esp_idf_svc::sys::localtime_r(&secs, &mut tm) }.is_null() {
            return None;
        }
        if !(0..=23).contains(&tm.tm_hour) || !(0..=59).contains(&tm.tm_min) {
            return None;
        }
        Some(LocalTime::new(
            tm.tm_hour as u8,
            tm.tm_min as u8,
            tm.tm_sec.clamp(0, 60) as u8,
        ))
    }

    #[cfg(not(target_os = "espidf"))]
    fn local_time(&self) -> Option<LocalTime> {
        self.local.get()
    }
}
