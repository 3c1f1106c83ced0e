//! GPIO / peripheral pin assignments for the feeder main board.
//!
//! Single source of truth: `main.rs` references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Motor-controller MCU link (UART, 8N1)
// ---------------------------------------------------------------------------

/// UART peripheral used for the MCU link (UART1; UART0 carries the console).
pub const MCU_UART_PORT: u8 = 1;
/// ESP32 TX → MCU RX.
pub const MCU_UART_TX_GPIO: i32 = 17;
/// ESP32 RX ← MCU TX.
pub const MCU_UART_RX_GPIO: i32 = 18;
/// Data bits / stop bits of the MCU link.
pub const MCU_UART_DATA_BITS: u8 = 8;
pub const MCU_UART_STOP_BITS: u8 = 1;
