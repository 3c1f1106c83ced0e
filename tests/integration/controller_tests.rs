//! Integration tests for the FeederController → link → storage pipeline.
//!
//! Drives the controller through its public action surface and `tick`,
//! then asserts on the exact bytes handed to the UART and the records
//! written to storage.

use super::mocks::{MockClock, MockNetwork, MockNvs, RecordingSink, ack_bytes};

use petfeeder::adapters::uart::UartTransport;
use petfeeder::app::commands::FeederCommand;
use petfeeder::app::counter::{COUNTER_KEY, COUNTER_NAMESPACE};
use petfeeder::app::events::AppEvent;
use petfeeder::app::ports::LocalTime;
use petfeeder::app::service::FeederController;
use petfeeder::config::FeederConfig;
use petfeeder::schedule::FeedingSchedule;
use petfeeder::schedule::store::{COUNT_KEY, SCHEDULE_NAMESPACE};

type Feeder = FeederController<UartTransport, MockNvs>;

fn make_feeder() -> (Feeder, RecordingSink) {
    let mut sink = RecordingSink::default();
    let mut feeder = FeederController::new(FeederConfig::default(), UartTransport::new(), MockNvs::new());
    feeder.setup(&mut sink);
    (feeder, sink)
}

const FEED_2: [u8; 15] = [
    0x55, 0xAA, 0x00, 0x06, 0x00, 0x08, 0x65, 0x02, 0x00, 0x04, 0x00, 0x00, 0x00, 0x02, 0x7A,
];
const LIGHT_STEADY: [u8; 8] = [0x55, 0xAA, 0x00, 0x03, 0x00, 0x01, 0x03, 0x06];
const LIGHT_BLINK: [u8; 8] = [0x55, 0xAA, 0x00, 0x03, 0x00, 0x01, 0x02, 0x05];

// ── Host actions ──────────────────────────────────────────────

#[test]
fn feed_pet_writes_feed_frame() {
    let (mut feeder, _) = make_feeder();
    feeder.handle_command(FeederCommand::FeedPet { portions: 2 });
    assert_eq!(feeder.transport_mut().take_tx(), FEED_2.to_vec());
    assert_eq!(feeder.link_stats().frames_sent, 1);
}

#[test]
fn feed_pet_sends_low_byte_unvalidated() {
    let (mut feeder, _) = make_feeder();
    feeder.on_feed(0);
    let tx = feeder.transport_mut().take_tx();
    assert_eq!(tx[13], 0x00);
    assert_eq!(tx[14], 0x78);

    feeder.on_feed(300);
    let tx = feeder.transport_mut().take_tx();
    assert_eq!(tx[13], 44, "300 truncates to its low byte");
}

#[test]
fn test_message_sends_raw_frame() {
    let (mut feeder, _) = make_feeder();
    feeder.handle_command(FeederCommand::TestMessage {
        target: 0x00,
        source: 0x03,
        command: 0x00,
        value: 0x03,
    });
    assert_eq!(feeder.transport_mut().take_tx(), LIGHT_STEADY.to_vec());
}

#[test]
fn test_message_with_large_value_is_just_a_frame() {
    let (mut feeder, _) = make_feeder();
    feeder.on_test_message(0x01, 0x02, 0x03, 42);
    let tx = feeder.transport_mut().take_tx();
    assert_eq!(&tx[..7], &[0x55, 0xAA, 0x01, 0x02, 0x03, 0x01, 42]);
    assert_eq!(feeder.link_stats().frames_sent, 1);
}

#[test]
fn add_schedule_persists_count_and_slot() {
    let (mut feeder, _) = make_feeder();
    feeder.handle_command(FeederCommand::AddFeedingSchedule {
        hour: 7,
        minute: 30,
        portions: 2,
    });

    assert_eq!(feeder.schedules(), &[FeedingSchedule::new(7, 30, 2).unwrap()]);
    let nvs = feeder.storage();
    assert_eq!(nvs.get_u32(SCHEDULE_NAMESPACE, COUNT_KEY), Some(1));
    assert_eq!(nvs.get_u32(SCHEDULE_NAMESPACE, "slot00"), Some(0x0007_1E02));
    assert_eq!(nvs.get_u32(SCHEDULE_NAMESPACE, "slot01"), Some(0));
    assert_eq!(nvs.commits(SCHEDULE_NAMESPACE), 1);
}

#[test]
fn invalid_schedule_leaves_storage_untouched() {
    let (mut feeder, _) = make_feeder();
    feeder.on_add_feeding_schedule(25, 0, 1);
    assert!(feeder.schedules().is_empty());
    assert!(feeder.storage().calls.is_empty());
}

#[test]
fn table_capacity_is_enforced() {
    let (mut feeder, _) = make_feeder();
    for i in 0..20 {
        feeder.on_add_feeding_schedule(i, 0, 1);
    }
    assert_eq!(feeder.schedules().len(), 20);
    let commits = feeder.storage().commits(SCHEDULE_NAMESPACE);

    feeder.on_add_feeding_schedule(21, 0, 1);
    assert_eq!(feeder.schedules().len(), 20);
    assert_eq!(feeder.storage().commits(SCHEDULE_NAMESPACE), commits);
}

#[test]
fn clear_persists_empty_table() {
    let (mut feeder, _) = make_feeder();
    feeder.on_add_feeding_schedule(7, 30, 2);
    feeder.on_add_feeding_schedule(19, 0, 3);
    feeder.handle_command(FeederCommand::ClearFeedingSchedules);

    assert!(feeder.schedules().is_empty());
    let nvs = feeder.storage();
    assert_eq!(nvs.get_u32(SCHEDULE_NAMESPACE, COUNT_KEY), Some(0));
    assert_eq!(nvs.get_u32(SCHEDULE_NAMESPACE, "slot00"), Some(0));
    assert_eq!(nvs.get_u32(SCHEDULE_NAMESPACE, "slot01"), Some(0));
}

#[test]
fn storage_failure_does_not_block_add() {
    let mut nvs = MockNvs::new();
    nvs.fail_writes = true;
    let mut sink = RecordingSink::default();
    let mut feeder = FeederController::new(FeederConfig::default(), UartTransport::new(), nvs);
    feeder.setup(&mut sink);

    feeder.on_add_feeding_schedule(8, 0, 1);
    assert_eq!(feeder.schedules().len(), 1, "in-memory table still updated");
}

// ── Scheduled feeding ─────────────────────────────────────────

#[test]
fn schedule_fires_at_matching_minute() {
    let (mut feeder, mut sink) = make_feeder();
    feeder.on_add_feeding_schedule(7, 30, 2);

    let clock = MockClock::at(60, Some(LocalTime::new(7, 30, 5)));
    let net = MockNetwork::new(false);
    feeder.tick(&clock, &net, &mut sink);

    assert_eq!(feeder.transport_mut().take_tx(), FEED_2.to_vec());
    let fired: Vec<_> = sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::AutoFeedingFired(_)))
        .collect();
    assert_eq!(
        fired,
        [&AppEvent::AutoFeedingFired(FeedingSchedule::new(7, 30, 2).unwrap())]
    );
}

#[test]
fn schedule_fires_once_per_minute() {
    let (mut feeder, mut sink) = make_feeder();
    feeder.on_add_feeding_schedule(7, 30, 2);
    let clock = MockClock::at(60, Some(LocalTime::new(7, 30, 0)));
    let net = MockNetwork::new(false);

    feeder.tick(&clock, &net, &mut sink);
    clock.advance_secs(30);
    clock.local.set(Some(LocalTime::new(7, 30, 30)));
    feeder.tick(&clock, &net, &mut sink);

    let fired = sink
        .events
        .iter()
        .filter(|e| matches!(e, AppEvent::AutoFeedingFired(_)))
        .count();
    assert_eq!(fired, 1);
}

#[test]
fn no_wall_clock_means_no_feeding() {
    let (mut feeder, mut sink) = make_feeder();
    feeder.on_add_feeding_schedule(7, 30, 2);
    let clock = MockClock::at(60, None);
    let net = MockNetwork::new(false);

    feeder.tick(&clock, &net, &mut sink);
    assert!(feeder.transport_mut().take_tx().is_empty());
}

// ── Network presence ──────────────────────────────────────────

#[test]
fn light_frame_precedes_feed_frame_in_one_tick() {
    let (mut feeder, mut sink) = make_feeder();
    feeder.on_add_feeding_schedule(7, 30, 2);

    let clock = MockClock::at(60, Some(LocalTime::new(7, 30, 0)));
    let net = MockNetwork::new(true);
    feeder.tick(&clock, &net, &mut sink);

    let mut expected = LIGHT_STEADY.to_vec();
    expected.extend_from_slice(&FEED_2);
    assert_eq!(feeder.transport_mut().take_tx(), expected);
}

#[test]
fn presence_edges_send_light_frames() {
    let (mut feeder, mut sink) = make_feeder();
    let clock = MockClock::at(6, None);
    let net = MockNetwork::new(false);

    // Boots disconnected: no edge, nothing sent.
    feeder.tick(&clock, &net, &mut sink);
    assert!(feeder.transport_mut().take_tx().is_empty());

    net.connected.set(true);
    clock.advance_secs(6);
    feeder.tick(&clock, &net, &mut sink);
    assert_eq!(feeder.transport_mut().take_tx(), LIGHT_STEADY.to_vec());

    // Level unchanged: no repeat.
    clock.advance_secs(6);
    feeder.tick(&clock, &net, &mut sink);
    assert!(feeder.transport_mut().take_tx().is_empty());

    net.connected.set(false);
    clock.advance_secs(6);
    feeder.tick(&clock, &net, &mut sink);
    assert_eq!(feeder.transport_mut().take_tx(), LIGHT_BLINK.to_vec());

    assert_eq!(
        sink.events
            .iter()
            .filter(|e| matches!(e, AppEvent::NetworkChanged { .. }))
            .cloned()
            .collect::<Vec<_>>(),
        vec![
            AppEvent::NetworkChanged { connected: true },
            AppEvent::NetworkChanged { connected: false },
        ]
    );
}

#[test]
fn presence_is_polled_at_most_every_five_seconds() {
    let (mut feeder, mut sink) = make_feeder();
    let clock = MockClock::at(6, None);
    let net = MockNetwork::new(false);

    feeder.tick(&clock, &net, &mut sink);
    clock.advance_secs(1);
    feeder.tick(&clock, &net, &mut sink);
    clock.advance_secs(1);
    feeder.tick(&clock, &net, &mut sink);
    assert_eq!(net.polls.get(), 1);
}

// ── Acknowledgements ──────────────────────────────────────────

#[test]
fn ack_adds_portions_and_persists() {
    let (mut feeder, mut sink) = make_feeder();
    feeder.transport_mut().inject_rx(&ack_bytes(3));
    feeder.tick(&MockClock::new(), &MockNetwork::new(false), &mut sink);

    assert_eq!(feeder.portions_total(), Some(3));
    assert_eq!(feeder.storage().get_u32(COUNTER_NAMESPACE, COUNTER_KEY), Some(3));
    assert!(sink.events.contains(&AppEvent::PortionsCounted { added: 3, total: 3 }));
}

#[test]
fn ack_after_line_noise_is_still_counted() {
    let (mut feeder, mut sink) = make_feeder();
    // Stray bytes, then a bogus candidate dropped once six bytes arrive.
    let mut bytes = vec![0x00, 0x13, 0xFF, 0x55, 0x00, 0x01, 0x02, 0x03, 0x04];
    bytes.extend(ack_bytes(2));
    bytes.extend(ack_bytes(1));
    feeder.transport_mut().inject_rx(&bytes);
    feeder.process_serial(&mut sink);

    assert_eq!(feeder.portions_total(), Some(3));
    assert_eq!(feeder.link_stats().frames_received, 2);
    assert_eq!(feeder.link_stats().frames_discarded, 1);
}

#[test]
fn corrupted_ack_is_dropped() {
    let (mut feeder, mut sink) = make_feeder();
    let mut bytes = ack_bytes(5);
    let last = bytes.len() - 1;
    bytes[last] ^= 0x01;
    feeder.transport_mut().inject_rx(&bytes);
    feeder.process_serial(&mut sink);

    assert_eq!(feeder.portions_total(), Some(0));
    assert_eq!(feeder.link_stats().frames_discarded, 1);
}

#[test]
fn ack_split_across_ticks() {
    let (mut feeder, mut sink) = make_feeder();
    let bytes = ack_bytes(4);
    let (head, tail) = bytes.split_at(5);

    feeder.transport_mut().inject_rx(head);
    feeder.process_serial(&mut sink);
    assert_eq!(feeder.portions_total(), Some(0));

    feeder.transport_mut().inject_rx(tail);
    feeder.process_serial(&mut sink);
    assert_eq!(feeder.portions_total(), Some(4));
}

// ── Restart ───────────────────────────────────────────────────

#[test]
fn state_survives_restart() {
    let (mut feeder, mut sink) = make_feeder();
    feeder.on_add_feeding_schedule(7, 30, 2);
    feeder.on_add_feeding_schedule(18, 0, 1);
    feeder.transport_mut().inject_rx(&ack_bytes(2));
    feeder.process_serial(&mut sink);

    let nvs = feeder.into_storage();
    let mut sink = RecordingSink::default();
    let mut restarted = FeederController::new(FeederConfig::default(), UartTransport::new(), nvs);
    restarted.setup(&mut sink);

    assert_eq!(
        restarted.schedules(),
        &[
            FeedingSchedule::new(7, 30, 2).unwrap(),
            FeedingSchedule::new(18, 0, 1).unwrap(),
        ]
    );
    assert_eq!(restarted.portions_total(), Some(2));
    assert_eq!(sink.events, vec![AppEvent::Started { schedules: 2 }]);
}
