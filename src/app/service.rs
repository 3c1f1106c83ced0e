//! Feeder controller: the hexagonal core.
//!
//! [`FeederController`] owns the MCU link, the schedule store, the
//! schedule runner and the portion counter.  It exposes the host action
//! surface and a single [`tick`](FeederController::tick) driven by the
//! main loop.  All I/O flows through port traits, making the whole
//! controller testable with mock adapters.
//!
//! ```text
//!  ClockPort ───▶ ┌───────────────────────────┐ ──▶ EventSink
//! NetworkPort ──▶ │     FeederController      │
//!                 │ Link · Store · Runner ·   │ ◀─▶ StoragePort
//!  Transport ◀──▶ │ PortionCounter            │
//!                 └───────────────────────────┘
//! ```
//!
//! Every tick runs, in order: network presence check, schedule check,
//! inbound byte pump.  A light-status frame triggered in a tick is
//! therefore always written before any scheduled feed frame.

use log::{debug, info, warn};

use crate::config::FeederConfig;
use crate::link::controller::{LinkController, LinkStats};
use crate::link::frame::{
    ADDR_MAIN, ADDR_MOTOR_SOURCE, ADDR_SELF, CMD_STATUS, Frame, LIGHT_SLOW_BLINK, LIGHT_STEADY,
    feed_payload,
};
use crate::link::transport::Transport;
use crate::schedule::FeedingSchedule;
use crate::schedule::store::ScheduleStore;
use crate::scheduler::ScheduleRunner;

use super::commands::FeederCommand;
use super::counter::PortionCounter;
use super::events::AppEvent;
use super::ports::{ClockPort, EventSink, FeedDelegate, FrameHandler, NetworkPort, StoragePort};

// ───────────────────────────────────────────────────────────────
// Network presence edge detector
// ───────────────────────────────────────────────────────────────

/// Edge-triggered network presence poller.
#[derive(Debug)]
struct PresenceMonitor {
    interval_us: u64,
    last_check_us: u64,
    last_connected: bool,
}

impl PresenceMonitor {
    fn new(interval_us: u64) -> Self {
        Self {
            interval_us,
            last_check_us: 0,
            last_connected: false,
        }
    }

    /// Returns `Some(connected)` on a transition, `None` otherwise.
    fn poll(&mut self, now_us: u64, network: &impl NetworkPort) -> Option<bool> {
        if now_us.saturating_sub(self.last_check_us) <= self.interval_us {
            return None;
        }
        self.last_check_us = now_us;

        let connected = network.is_connected();
        if connected == self.last_connected {
            return None;
        }
        self.last_connected = connected;
        Some(connected)
    }
}

// ───────────────────────────────────────────────────────────────
// FeederController
// ───────────────────────────────────────────────────────────────

/// Root component: link, schedules, counter and presence polling.
pub struct FeederController<T: Transport, S: StoragePort> {
    config: FeederConfig,
    link: LinkController<T>,
    storage: S,
    store: ScheduleStore,
    runner: ScheduleRunner,
    counter: Option<PortionCounter>,
    presence: PresenceMonitor,
}

impl<T: Transport, S: StoragePort> FeederController<T, S> {
    /// Construct the controller.  Call [`setup`](Self::setup) next to
    /// restore persisted state.
    pub fn new(config: FeederConfig, transport: T, storage: S) -> Self {
        let runner = ScheduleRunner::new(u64::from(config.schedule_check_interval_ms));
        let presence = PresenceMonitor::new(config.network_check_interval_us);
        Self {
            config,
            link: LinkController::new(transport),
            storage,
            store: ScheduleStore::new(),
            runner,
            counter: None,
            presence,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Load schedules (and the portion counter, if enabled) from storage.
    pub fn setup(&mut self, sink: &mut impl EventSink) {
        let schedules = self.store.load(&self.storage);
        if self.config.portions_counter_enabled {
            self.counter = Some(PortionCounter::load(&self.storage));
        }
        sink.emit(&AppEvent::Started { schedules });
        info!("FeederController started with {} schedules", schedules);
    }

    /// Dump configuration and the schedule table to the log.
    pub fn log_config(&self) {
        info!("Pet Feeder:");
        info!("  UART baud rate: {}", self.config.uart_baud_rate);
        match &self.counter {
            Some(c) => info!("  Portions counter: {}", c.total()),
            None => info!("  Portions counter: disabled"),
        }
        info!("  Feeding schedules:");
        for (i, s) in self.store.schedules().iter().enumerate() {
            info!("    Schedule {}: {}", i, s);
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// One cooperative loop iteration: presence → schedules → inbound bytes.
    pub fn tick(
        &mut self,
        clock: &impl ClockPort,
        network: &impl NetworkPort,
        sink: &mut impl EventSink,
    ) {
        self.check_network(clock, network, sink);
        self.check_feeding_schedules(clock, sink);
        self.process_serial(sink);
    }

    /// Send a light-status frame on network presence edges.
    pub fn check_network(
        &mut self,
        clock: &impl ClockPort,
        network: &impl NetworkPort,
        sink: &mut impl EventSink,
    ) {
        let Some(connected) = self.presence.poll(clock.uptime_us(), network) else {
            return;
        };

        let light = if connected {
            info!("Network connected");
            LIGHT_STEADY
        } else {
            info!("Network disconnected");
            LIGHT_SLOW_BLINK
        };
        if let Err(e) = self.link.send(ADDR_MAIN, ADDR_SELF, CMD_STATUS, &[light]) {
            warn!("light status send failed: {}", e);
        }
        sink.emit(&AppEvent::NetworkChanged { connected });
    }

    /// Fire every schedule matching the current minute.
    pub fn check_feeding_schedules(&mut self, clock: &impl ClockPort, sink: &mut impl EventSink) {
        let now_ms = clock.uptime_us() / 1000;
        let local = clock.local_time();
        let Self {
            runner, store, link, ..
        } = self;
        let mut dispatcher = FeedDispatcher { link, sink };
        runner.tick(now_ms, local, store.schedules(), &mut dispatcher);
    }

    /// Drain the inbound byte backlog and route decoded frames.
    pub fn process_serial(&mut self, sink: &mut impl EventSink) -> usize {
        let Self {
            link,
            storage,
            counter,
            ..
        } = self;
        let mut router = AckRouter {
            counter,
            storage,
            sink,
        };
        link.pump(&mut router)
    }

    /// Interpret one decoded frame.  Only acks from the motor controller
    /// are acted on; everything else is silently ignored.
    pub fn process_frame(&mut self, frame: &Frame, sink: &mut impl EventSink) {
        AckRouter {
            counter: &mut self.counter,
            storage: &mut self.storage,
            sink,
        }
        .on_frame(frame);
    }

    // ── Host actions ──────────────────────────────────────────

    /// Dispatch a host action.
    pub fn handle_command(&mut self, cmd: FeederCommand) {
        debug!("command: {}", cmd.service_name());
        match cmd {
            FeederCommand::FeedPet { portions } => self.on_feed(portions),
            FeederCommand::TestMessage {
                target,
                source,
                command,
                value,
            } => self.on_test_message(target, source, command, value),
            FeederCommand::AddFeedingSchedule {
                hour,
                minute,
                portions,
            } => self.on_add_feeding_schedule(hour, minute, portions),
            FeederCommand::ClearFeedingSchedules => self.on_clear_feeding_schedules(),
        }
    }

    /// Spin the motor for `portions`.  No range check beyond the wire
    /// format: the low byte is sent, 0 included.
    pub fn on_feed(&mut self, portions: i32) {
        send_feed(&mut self.link, portions);
    }

    /// Raw passthrough frame with a one-byte payload.  Values are
    /// truncated to their low byte.
    pub fn on_test_message(&mut self, target: i32, source: i32, command: i32, value: i32) {
        debug!(
            "test message target:{:02X} source:{:02X} command:{:02X} value:{:02X}",
            target as u8, source as u8, command as u8, value as u8
        );
        if let Err(e) = self
            .link
            .send(target as u8, source as u8, command as u8, &[value as u8])
        {
            warn!("test message send failed: {}", e);
        }
    }

    /// Validate, append and persist a schedule.  Rejections are logged.
    pub fn on_add_feeding_schedule(&mut self, hour: i32, minute: i32, portions: i32) {
        info!(
            "Adding feeding schedule: {:02}:{:02} - {} portions",
            hour, minute, portions
        );
        let schedule = match FeedingSchedule::new(hour, minute, portions) {
            Ok(s) => s,
            Err(e) => {
                warn!(
                    "Invalid schedule parameters: hour={}, minute={}, portions={} ({})",
                    hour, minute, portions, e
                );
                return;
            }
        };
        match self.store.add(&mut self.storage, schedule) {
            Ok(slot) => info!(
                "Feeding schedule added at slot {}, now have {} schedules",
                slot,
                self.store.len()
            ),
            Err(e) => warn!("Feeding schedule rejected: {}", e),
        }
    }

    /// Drop every schedule and persist the empty table.
    pub fn on_clear_feeding_schedules(&mut self) {
        info!("Clearing all feeding schedules");
        self.store.clear(&mut self.storage);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn schedules(&self) -> &[FeedingSchedule] {
        self.store.schedules()
    }

    /// Cumulative acknowledged portions, `None` when the counter is disabled.
    pub fn portions_total(&self) -> Option<u32> {
        self.counter.map(|c| c.total())
    }

    pub fn link_stats(&self) -> LinkStats {
        self.link.stats()
    }

    pub fn config(&self) -> &FeederConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        self.link.transport()
    }

    pub fn transport_mut(&mut self) -> &mut T {
        self.link.transport_mut()
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Tear down the controller and hand back its storage backend.
    pub fn into_storage(self) -> S {
        self.storage
    }
}

// ───────────────────────────────────────────────────────────────
// Internal helpers (disjoint borrows of the controller)
// ───────────────────────────────────────────────────────────────

fn send_feed<T: Transport>(link: &mut LinkController<T>, portions: i32) {
    info!("Feeding {} portions", portions);
    if !(0..=255).contains(&portions) {
        warn!("portions {} truncated to {}", portions, portions as u8);
    }
    if let Err(e) = link.send(
        ADDR_MAIN,
        ADDR_MOTOR_SOURCE,
        CMD_STATUS,
        &feed_payload(portions as u8),
    ) {
        warn!("feed command send failed: {}", e);
    }
}

/// Routes inbound frames: acks to the counter, everything else dropped.
struct AckRouter<'a, S: StoragePort, E: EventSink> {
    counter: &'a mut Option<PortionCounter>,
    storage: &'a mut S,
    sink: &'a mut E,
}

impl<S: StoragePort, E: EventSink> FrameHandler for AckRouter<'_, S, E> {
    fn on_frame(&mut self, frame: &Frame) {
        if !frame.is_ack() {
            return;
        }
        let Some(added) = frame.portions() else {
            debug!(
                "MCU ack with {}-byte payload has no portions byte, ignoring",
                frame.payload.len()
            );
            return;
        };
        info!("MCU ack {} portions", added);

        match self.counter.as_mut() {
            Some(counter) => {
                let total = counter.increment(&mut *self.storage, added);
                self.sink.emit(&AppEvent::PortionsCounted { added, total });
            }
            None => debug!("no portions counter configured, ack dropped"),
        }
    }
}

/// Turns fired schedules into host events and feed commands.
struct FeedDispatcher<'a, T: Transport, E: EventSink> {
    link: &'a mut LinkController<T>,
    sink: &'a mut E,
}

impl<T: Transport, E: EventSink> FeedDelegate for FeedDispatcher<'_, T, E> {
    fn on_feeding_due(&mut self, schedule: &FeedingSchedule) {
        self.sink.emit(&AppEvent::AutoFeedingFired(*schedule));
        send_feed(&mut *self.link, i32::from(schedule.portions));
    }
}
