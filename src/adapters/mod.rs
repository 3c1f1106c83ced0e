//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to              |
//! |----------------|--------------------|--------------------------|
//! | `log_sink`     | EventSink          | Serial log output        |
//! | `network`      | NetworkPort        | ESP-IDF WiFi STA status  |
//! | `nvs`          | ConfigPort         | NVS / in-memory store    |
//! |                | StoragePort        |                          |
//! | `time`         | ClockPort          | ESP32 timer + SNTP clock |
//! | `uart`         | Transport          | UART1 to the motor MCU   |

pub mod log_sink;
pub mod network;
pub mod nvs;
pub mod time;
pub mod uart;
