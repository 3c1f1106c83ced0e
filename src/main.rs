//! PetFeeder Firmware: Main Entry Point
//!
//! Hexagonal architecture with a single cooperative polling loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  UartTransport   LogEventSink   NvsAdapter     Esp32Time       │
//! │  (Transport)     (EventSink)    (Config+NVS)   (ClockPort)     │
//! │  WifiPresence    console reader                                │
//! │  (NetworkPort)   (FeederCommand)                               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            FeederController (pure logic)               │    │
//! │  │  LinkController · ScheduleStore · ScheduleRunner       │    │
//! │  │  PortionCounter                                        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::io::BufRead;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use esp_idf_hal::gpio::{AnyInputPin, AnyOutputPin};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::uart;
use esp_idf_hal::units::Hertz;
use log::{info, warn};

use petfeeder::adapters::log_sink::LogEventSink;
use petfeeder::adapters::network::WifiPresence;
use petfeeder::adapters::nvs::NvsAdapter;
use petfeeder::adapters::time::Esp32TimeAdapter;
use petfeeder::adapters::uart::UartTransport;
use petfeeder::app::commands::{FeederCommand, parse_command};
use petfeeder::app::ports::ConfigPort;
use petfeeder::app::service::FeederController;
use petfeeder::config::FeederConfig;
use petfeeder::drivers::watchdog::Watchdog;
use petfeeder::pins;

/// Forward console lines to the loop as decoded commands.
fn spawn_console_reader(tx: mpsc::Sender<FeederCommand>) -> Result<thread::JoinHandle<()>> {
    let handle = thread::Builder::new()
        .name("console".into())
        .stack_size(4096)
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let line = match line {
                    Ok(l) => l,
                    Err(e) => {
                        warn!("console: read failed: {}", e);
                        thread::sleep(Duration::from_millis(100));
                        continue;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_command(&line) {
                    Ok(cmd) => {
                        if tx.send(cmd).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("console: ignoring '{}': {}", line.trim(), e),
                }
            }
        })?;
    Ok(handle)
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  PetFeeder v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = NvsAdapter::new().map_err(|e| anyhow::anyhow!("NVS init failed: {}", e))?;
    let config = match nvs.load() {
        Ok(cfg) => {
            info!("Config loaded from NVS");
            cfg
        }
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            FeederConfig::default()
        }
    };
    let watchdog = Watchdog::new(config.watchdog_timeout_ms);

    // ── 3. MCU link ───────────────────────────────────────────
    let peripherals = Peripherals::take()?;
    let uart_config = uart::config::Config::new().baudrate(Hertz(config.uart_baud_rate));
    let driver = uart::UartDriver::new(
        peripherals.uart1,
        peripherals.pins.gpio17,
        peripherals.pins.gpio18,
        AnyInputPin::none(),
        AnyOutputPin::none(),
        &uart_config,
    )?;
    info!(
        "MCU link: UART{} TX=GPIO{} RX=GPIO{} {} baud {}N{}",
        pins::MCU_UART_PORT,
        pins::MCU_UART_TX_GPIO,
        pins::MCU_UART_RX_GPIO,
        config.uart_baud_rate,
        pins::MCU_UART_DATA_BITS,
        pins::MCU_UART_STOP_BITS,
    );

    // ── 4. Construct adapters + controller ────────────────────
    let clock = Esp32TimeAdapter::new();
    let network = WifiPresence::new();
    let mut log_sink = LogEventSink::new();

    let loop_interval_ms = config.loop_interval_ms;
    let mut feeder = FeederController::new(config, UartTransport::new(driver), nvs);
    feeder.setup(&mut log_sink);
    feeder.log_config();

    let (cmd_tx, cmd_rx) = mpsc::channel();
    let _console = spawn_console_reader(cmd_tx)?;

    info!("System ready. Entering feeder loop.");

    // ── 5. Cooperative loop ───────────────────────────────────
    loop {
        while let Ok(cmd) = cmd_rx.try_recv() {
            feeder.handle_command(cmd);
        }

        feeder.tick(&clock, &network, &mut log_sink);

        watchdog.feed();
        FreeRtos::delay_ms(loop_interval_ms);
    }
}
