//! Application core: domain logic behind port traits.
//!
//! Holds the feeder controller, the host action vocabulary, the outbound
//! event vocabulary and the acknowledged-portion counter.  All interaction
//! with hardware happens through **port traits** defined in [`ports`],
//! keeping this layer testable without real peripherals.

pub mod commands;
pub mod counter;
pub mod events;
pub mod ports;
pub mod service;
