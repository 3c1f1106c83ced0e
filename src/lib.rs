//! PetFeeder firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod link;
pub mod schedule;
pub mod scheduler;

// The adapters and drivers carry their own simulation backends, so the
// crate builds (and tests) on the host as well.
pub mod adapters;
pub mod drivers;
pub mod pins;
