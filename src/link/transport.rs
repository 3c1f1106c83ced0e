//! Transport abstraction: the byte channel to the motor-controller MCU.
//!
//! Concrete implementations:
//! - UART (9600 baud, 8N1) on the ESP32, see [`crate::adapters::uart`]
//! - In-memory loopback for host simulation and tests
//!
//! The [`LinkController`](super::controller::LinkController) is generic
//! over `Transport`, so swapping the physical link requires no changes
//! to the protocol logic.

/// Byte-oriented, non-blocking transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Write `data` to the transport.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), Self::Error>;

    /// Check if data is available for reading.
    fn available(&self) -> bool;
}

/// A null transport that discards all writes and never reads.
/// Useful when the MCU link is not wired (bench testing the scheduler).
pub struct NullTransport;

impl Transport for NullTransport {
    type Error = ();

    fn read(&mut self, _buf: &mut [u8]) -> Result<usize, ()> {
        Ok(0)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, ()> {
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), ()> {
        Ok(())
    }

    fn available(&self) -> bool {
        false
    }
}
