//! Network presence adapter.
//!
//! Implements [`NetworkPort`] as a level query.  The controller turns
//! levels into edges.
//!
//! - **`target_os = "espidf"`**: associated when `esp_wifi_sta_get_ap_info`
//!   succeeds (station has an AP record).
//! - **all other targets**: a settable flag for host-side tests.

use crate::app::ports::NetworkPort;

pub struct WifiPresence {
    #[cfg(not(target_os = "espidf"))]
    connected: std::cell::Cell<bool>,
}

impl Default for WifiPresence {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiPresence {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            connected: std::cell::Cell::new(false),
        }
    }

    /// Simulate association / loss of the access point.
    #[cfg(not(target_os = "espidf"))]
    pub fn set_connected(&self, connected: bool) {
        self.connected.set(connected);
    }
}

impl NetworkPort for WifiPresence {
    #[cfg(target_os = "espidf")]
    fn is_connected(&self) -> bool {
        // SAFETY: wifi_ap_record_t is plain C data; all-zero is a valid value
        // and ap_info is a valid out-pointer for the duration of the call.
        let mut ap_info: esp_idf_svc::sys::wifi_ap_record_t = unsafe { core::mem::zeroed() };
        let ret = unsafe { esp_idf_svc::sys::esp_wifi_sta_get_ap_info(&mut ap_info) };
        ret == esp_idf_svc::sys::ESP_OK
    }

    #[cfg(not(target_os = "espidf"))]
    fn is_connected(&self) -> bool {
        self.connected.get()
    }
}
