//! Mock adapters for integration tests.
//!
//! Records every storage write and emitted event so tests can assert on
//! the full history without touching flash or a serial port.

use petfeeder::app::events::AppEvent;
use petfeeder::app::ports::{
    ClockPort, EventSink, LocalTime, NetworkPort, StorageError, StoragePort,
};
use petfeeder::link::codec::encode_frame;
use std::cell::Cell;
use std::collections::HashMap;

// ── MockNvs ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum StorageCall {
    Write { namespace: String, key: String },
    Commit { namespace: String },
}

#[derive(Default)]
pub struct MockNvs {
    store: HashMap<String, Vec<u8>>,
    pub calls: Vec<StorageCall>,
    /// When set, every write fails with `IoError`.
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl MockNvs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u32(&mut self, namespace: &str, key: &str, value: u32) {
        self.store
            .insert(format!("{}::{}", namespace, key), value.to_le_bytes().to_vec());
    }

    pub fn get_u32(&self, namespace: &str, key: &str) -> Option<u32> {
        let v = self.store.get(&format!("{}::{}", namespace, key))?;
        Some(u32::from_le_bytes(v.as_slice().try_into().ok()?))
    }

    pub fn commits(&self, namespace: &str) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, StorageCall::Commit { namespace: ns } if ns == namespace))
            .count()
    }
}

impl StoragePort for MockNvs {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.store.get(&format!("{}::{}", namespace, key)) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.calls.push(StorageCall::Write {
            namespace: namespace.into(),
            key: key.into(),
        });
        self.store
            .insert(format!("{}::{}", namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        self.store.remove(&format!("{}::{}", namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        self.store.contains_key(&format!("{}::{}", namespace, key))
    }

    fn commit(&mut self, namespace: &str) -> Result<(), StorageError> {
        self.calls.push(StorageCall::Commit {
            namespace: namespace.into(),
        });
        Ok(())
    }
}

// ── MockClock ─────────────────────────────────────────────────

pub struct MockClock {
    pub uptime_us: Cell<u64>,
    pub local: Cell<Option<LocalTime>>,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new() -> Self {
        Self {
            uptime_us: Cell::new(0),
            local: Cell::new(None),
        }
    }

    pub fn at(secs: u64, local: Option<LocalTime>) -> Self {
        Self {
            uptime_us: Cell::new(secs * 1_000_000),
            local: Cell::new(local),
        }
    }

    pub fn advance_secs(&self, secs: u64) {
        self.uptime_us.set(self.uptime_us.get() + secs * 1_000_000);
    }
}

impl ClockPort for MockClock {
    fn uptime_us(&self) -> u64 {
        self.uptime_us.get()
    }

    fn local_time(&self) -> Option<LocalTime> {
        self.local.get()
    }
}

// ── MockNetwork ───────────────────────────────────────────────

pub struct MockNetwork {
    pub connected: Cell<bool>,
    pub polls: Cell<u32>,
}

#[allow(dead_code)]
impl MockNetwork {
    pub fn new(connected: bool) -> Self {
        Self {
            connected: Cell::new(connected),
            polls: Cell::new(0),
        }
    }
}

impl NetworkPort for MockNetwork {
    fn is_connected(&self) -> bool {
        self.polls.set(self.polls.get() + 1);
        self.connected.get()
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Frame helpers ─────────────────────────────────────────────

/// Bytes of an ack from the motor controller reporting `portions`.
#[allow(dead_code)]
pub fn ack_bytes(portions: u8) -> Vec<u8> {
    encode_frame(0x03, 0x07, 0x00, &[0, 0, 0, 0, 0, 0, 0, portions])
        .map(|f| f.to_vec())
        .unwrap_or_default()
}
