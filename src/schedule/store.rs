//! Slot-based persistent schedule store.
//!
//! Storage layout (NVS namespace `feedsched`):
//!
//! | Key                  | Value                                       |
//! |----------------------|---------------------------------------------|
//! | `count`              | `u32` LE, number of schedules at last save  |
//! | `slot00` … `slot19`  | `u32` LE record, `0` = empty slot           |
//!
//! Slot keys are fixed strings, so slot N maps to the same flash entry
//! across restarts and firmware updates.
//!
//! `load` degrades on corruption instead of failing: an oversized count
//! is capped, empty and invalid records are skipped.  The loaded table may
//! therefore hold fewer entries than the stored count.  `save` writes the
//! count, then every slot (unused ones get the empty record so stale data
//! from a larger table cannot resurface), then commits.

use log::{debug, info, warn};

use crate::app::ports::{StorageError, StoragePort};
use crate::error::ScheduleError;

use super::{EMPTY_RECORD, FeedingSchedule, MAX_SCHEDULES, ScheduleTable};

/// NVS namespace holding the schedule table.
pub const SCHEDULE_NAMESPACE: &str = "feedsched";
/// Key of the persisted schedule count.
pub const COUNT_KEY: &str = "count";

/// One fixed key per physical slot, in slot order.
pub const SLOT_KEYS: [&str; MAX_SCHEDULES] = [
    "slot00", "slot01", "slot02", "slot03", "slot04", "slot05", "slot06", "slot07", "slot08",
    "slot09", "slot10", "slot11", "slot12", "slot13", "slot14", "slot15", "slot16", "slot17",
    "slot18", "slot19",
];

/// Owner of the in-memory schedule table and its persistence.
#[derive(Debug, Default)]
pub struct ScheduleStore {
    table: ScheduleTable,
}

impl ScheduleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current schedules in slot order.
    pub fn schedules(&self) -> &[FeedingSchedule] {
        &self.table
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.table.is_full()
    }

    /// Replace the in-memory table with whatever storage holds.
    pub fn load(&mut self, storage: &dyn StoragePort) -> usize {
        self.table = load_table(storage);
        self.table.len()
    }

    /// Append a validated schedule and persist the whole table.
    ///
    /// Returns the slot index.  A full table leaves memory and storage
    /// untouched.
    pub fn add(
        &mut self,
        storage: &mut dyn StoragePort,
        schedule: FeedingSchedule,
    ) -> Result<usize, ScheduleError> {
        let slot = self.table.len();
        self.table
            .push(schedule)
            .map_err(|_| ScheduleError::TableFull)?;

        if let Err(e) = save_table(storage, &self.table) {
            warn!("schedules: persisting after add failed: {}", e);
        }
        Ok(slot)
    }

    /// Remove every schedule and persist the empty table.
    pub fn clear(&mut self, storage: &mut dyn StoragePort) {
        self.table.clear();
        if let Err(e) = save_table(storage, &self.table) {
            warn!("schedules: persisting after clear failed: {}", e);
        }
    }
}

/// Key of slot `index`, or `None` past the last slot.
pub fn slot_key(index: usize) -> Option<&'static str> {
    SLOT_KEYS.get(index).copied()
}

fn read_u32(storage: &dyn StoragePort, key: &str) -> Result<u32, StorageError> {
    let mut buf = [0u8; 4];
    match storage.read(SCHEDULE_NAMESPACE, key, &mut buf)? {
        4 => Ok(u32::from_le_bytes(buf)),
        _ => Err(StorageError::IoError),
    }
}

/// Read the persisted table, skipping anything that does not validate.
pub fn load_table(storage: &dyn StoragePort) -> ScheduleTable {
    let mut table = ScheduleTable::new();

    let stored = match read_u32(storage, COUNT_KEY) {
        Ok(n) => n as usize,
        Err(StorageError::NotFound) => 0,
        Err(e) => {
            warn!("schedules: unreadable count ({}), treating as empty", e);
            0
        }
    };
    if stored == 0 {
        debug!("schedules: none found in storage");
        return table;
    }

    let count = if stored > MAX_SCHEDULES {
        warn!(
            "schedules: stored count {} exceeds {}, capping",
            stored, MAX_SCHEDULES
        );
        MAX_SCHEDULES
    } else {
        stored
    };

    for (index, key) in SLOT_KEYS.iter().enumerate().take(count) {
        let record = match read_u32(storage, key) {
            Ok(r) => r,
            Err(e) => {
                warn!("schedules: slot {} unreadable ({}), skipping", index, e);
                continue;
            }
        };
        if record == EMPTY_RECORD {
            debug!("schedules: slot {} empty, skipping", index);
            continue;
        }
        match FeedingSchedule::from_record(record) {
            Ok(schedule) => {
                // Cannot overflow: at most MAX_SCHEDULES iterations.
                let _ = table.push(schedule);
            }
            Err(e) => warn!(
                "schedules: invalid data in slot {}: {:08X} ({})",
                index, record, e
            ),
        }
    }

    info!("schedules: loaded {} from storage", table.len());
    for (i, s) in table.iter().enumerate() {
        debug!("  schedule {}: {}", i, s);
    }
    table
}

/// Persist `schedules`: count first, then every slot, then commit.
pub fn save_table(
    storage: &mut dyn StoragePort,
    schedules: &[FeedingSchedule],
) -> Result<(), StorageError> {
    let count = schedules.len().min(MAX_SCHEDULES);
    storage.write(SCHEDULE_NAMESPACE, COUNT_KEY, &(count as u32).to_le_bytes())?;

    for (index, key) in SLOT_KEYS.iter().enumerate() {
        let record = schedules
            .get(index)
            .filter(|_| index < count)
            .map_or(EMPTY_RECORD, |s| s.to_record());
        storage.write(SCHEDULE_NAMESPACE, key, &record.to_le_bytes())?;
    }

    storage.commit(SCHEDULE_NAMESPACE)?;
    info!("schedules: saved {} to storage", count);
    Ok(())
}
