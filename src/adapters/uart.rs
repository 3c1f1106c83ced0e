//! UART transport adapter for the motor-controller link.
//!
//! Implements [`Transport`] over UART 8N1 at the configured baud rate.
//!
//! - **`target_os = "espidf"`**: wraps an `esp_idf_hal::uart::UartDriver`.
//!   Reads never block; writes block until the TX FIFO has drained.
//! - **`not(target_os = "espidf")`**: in-memory RX/TX buffers so host
//!   tests can inject MCU replies and inspect what was sent.

use core::fmt::Write as _;

#[cfg(not(target_os = "espidf"))]
use std::collections::VecDeque;

#[cfg(target_os = "espidf")]
use esp_idf_hal::{delay, uart::UartDriver};

use log::trace;

use crate::link::transport::Transport;

pub struct UartTransport {
    #[cfg(target_os = "espidf")]
    driver: UartDriver<'static>,
    #[cfg(not(target_os = "espidf"))]
    rx: VecDeque<u8>,
    #[cfg(not(target_os = "espidf"))]
    tx: Vec<u8>,
}

#[cfg(target_os = "espidf")]
impl UartTransport {
    pub fn new(driver: UartDriver<'static>) -> Self {
        Self { driver }
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for UartTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl UartTransport {
    pub fn new() -> Self {
        Self {
            rx: VecDeque::new(),
            tx: Vec::new(),
        }
    }

    /// Queue bytes as if the MCU had sent them.
    pub fn inject_rx(&mut self, bytes: &[u8]) {
        self.rx.extend(bytes.iter().copied());
    }

    /// Take every byte written so far.
    pub fn take_tx(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.tx)
    }
}

impl Transport for UartTransport {
    #[cfg(target_os = "espidf")]
    type Error = esp_idf_svc::sys::EspError;
    #[cfg(not(target_os = "espidf"))]
    type Error = core::convert::Infallible;

    #[cfg(target_os = "espidf")]
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = self.driver.read(buf, delay::NON_BLOCK)?;
        log_bytes("UART RX:", &buf[..n]);
        Ok(n)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        log_bytes("UART RX:", &buf[..n]);
        Ok(n)
    }

    #[cfg(target_os = "espidf")]
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        log_bytes("UART TX:", data);
        self.driver.write(data)
    }

    #[cfg(not(target_os = "espidf"))]
    fn write(&mut self, data: &[u8]) -> Result<usize, Self::Error> {
        log_bytes("UART TX:", data);
        self.tx.extend_from_slice(data);
        Ok(data.len())
    }

    #[cfg(target_os = "espidf")]
    fn flush(&mut self) -> Result<(), Self::Error> {
        self.driver.wait_tx_done(delay::BLOCK)
    }

    #[cfg(not(target_os = "espidf"))]
    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn available(&self) -> bool {
        self.driver.remaining_read().map(|n| n > 0).unwrap_or(false)
    }

    #[cfg(not(target_os = "espidf"))]
    fn available(&self) -> bool {
        !self.rx.is_empty()
    }
}

fn log_bytes(prefix: &str, bytes: &[u8]) {
    if bytes.is_empty() || !log::log_enabled!(log::Level::Trace) {
        return;
    }
    let mut line = String::with_capacity(prefix.len() + bytes.len() * 3);
    line.push_str(prefix);
    for byte in bytes {
        let _ = write!(line, " {:02X}", byte);
    }
    trace!("{}", line);
}
