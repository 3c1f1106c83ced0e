//! Cumulative dispensed-portions counter.
//!
//! Only acknowledgement frames from the motor controller move this
//! counter; send attempts never do.  The total is persisted after every
//! increment under `feedcnt::portions` as a little-endian `u32`.

use log::{debug, info, warn};

use super::ports::{StorageError, StoragePort};

pub const COUNTER_NAMESPACE: &str = "feedcnt";
pub const COUNTER_KEY: &str = "portions";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PortionCounter {
    total: u32,
}

impl PortionCounter {
    /// Restore the persisted total, or start at zero.
    pub fn load(storage: &dyn StoragePort) -> Self {
        let mut buf = [0u8; 4];
        let total = match storage.read(COUNTER_NAMESPACE, COUNTER_KEY, &mut buf) {
            Ok(4) => u32::from_le_bytes(buf),
            Ok(len) => {
                warn!("counter: stored value has {} bytes, resetting", len);
                0
            }
            Err(StorageError::NotFound) => {
                debug!("counter: no stored total");
                0
            }
            Err(e) => {
                warn!("counter: read failed ({}), starting at 0", e);
                0
            }
        };
        info!("counter: {} portions dispensed so far", total);
        Self { total }
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Add `count` acknowledged portions and persist the new total.
    pub fn increment(&mut self, storage: &mut dyn StoragePort, count: u8) -> u32 {
        self.total = self.total.saturating_add(u32::from(count));
        let persisted = storage
            .write(COUNTER_NAMESPACE, COUNTER_KEY, &self.total.to_le_bytes())
            .and_then(|()| storage.commit(COUNTER_NAMESPACE));
        if let Err(e) = persisted {
            warn!("counter: persisting total {} failed: {}", self.total, e);
        }
        self.total
    }
}
