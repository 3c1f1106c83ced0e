//! Integration tests for schedule persistence against the NVS adapter.
//!
//! Uses the simulation backend of [`NvsAdapter`], so the exact byte
//! layout written here is what the ESP-IDF backend stores in flash.

use super::mocks::MockNvs;

use petfeeder::adapters::nvs::NvsAdapter;
use petfeeder::app::ports::StoragePort;
use petfeeder::schedule::store::{
    COUNT_KEY, SCHEDULE_NAMESPACE, ScheduleStore, load_table, save_table, slot_key,
};
use petfeeder::schedule::{FeedingSchedule, MAX_SCHEDULES};

fn sched(h: i32, m: i32, p: i32) -> FeedingSchedule {
    FeedingSchedule::new(h, m, p).unwrap()
}

fn read_u32(nvs: &NvsAdapter, key: &str) -> u32 {
    let mut buf = [0u8; 4];
    nvs.read(SCHEDULE_NAMESPACE, key, &mut buf).unwrap();
    u32::from_le_bytes(buf)
}

#[test]
fn nvs_round_trip_preserves_order() {
    let mut nvs = NvsAdapter::new().unwrap();
    let table = [sched(7, 30, 2), sched(0, 0, 1), sched(23, 59, 99)];
    save_table(&mut nvs, &table).unwrap();

    assert_eq!(load_table(&nvs).as_slice(), &table);
    assert_eq!(read_u32(&nvs, COUNT_KEY), 3);
    assert_eq!(read_u32(&nvs, slot_key(2).unwrap()), 0x0017_3B63);
    assert_eq!(nvs.commit_count(), 1);
    assert_eq!(nvs.pending_writes(SCHEDULE_NAMESPACE), 0);
}

#[test]
fn save_leaves_no_uncommitted_slot_writes() {
    let mut nvs = NvsAdapter::new().unwrap();
    let mut store = ScheduleStore::new();
    store.add(&mut nvs, sched(7, 30, 2)).unwrap();
    assert_eq!(nvs.pending_writes(SCHEDULE_NAMESPACE), 0);

    store.clear(&mut nvs);
    assert_eq!(nvs.pending_writes(SCHEDULE_NAMESPACE), 0);
    assert_eq!(nvs.commit_count(), 2);
}

#[test]
fn every_slot_is_written_on_save() {
    let mut nvs = NvsAdapter::new().unwrap();
    save_table(&mut nvs, &[sched(6, 0, 1)]).unwrap();
    for i in 0..MAX_SCHEDULES {
        assert!(nvs.exists(SCHEDULE_NAMESPACE, slot_key(i).unwrap()), "slot {} missing", i);
    }
}

#[test]
fn store_reloads_what_it_added() {
    let mut nvs = NvsAdapter::new().unwrap();
    let mut store = ScheduleStore::new();
    store.add(&mut nvs, sched(7, 30, 2)).unwrap();
    store.add(&mut nvs, sched(19, 15, 4)).unwrap();

    let mut reloaded = ScheduleStore::new();
    assert_eq!(reloaded.load(&nvs), 2);
    assert_eq!(reloaded.schedules(), store.schedules());
}

#[test]
fn oversized_count_is_capped_not_fatal() {
    let mut nvs = MockNvs::new();
    for i in 0..MAX_SCHEDULES {
        nvs.put_u32(SCHEDULE_NAMESPACE, slot_key(i).unwrap(), sched(i as i32, 0, 1).to_record());
    }
    nvs.put_u32(SCHEDULE_NAMESPACE, COUNT_KEY, 250);

    let table = load_table(&nvs);
    assert_eq!(table.len(), MAX_SCHEDULES);
}

#[test]
fn corrupted_slots_are_skipped() {
    let mut nvs = MockNvs::new();
    nvs.put_u32(SCHEDULE_NAMESPACE, COUNT_KEY, 4);
    nvs.put_u32(SCHEDULE_NAMESPACE, slot_key(0).unwrap(), sched(7, 30, 2).to_record());
    nvs.put_u32(SCHEDULE_NAMESPACE, slot_key(1).unwrap(), 0x0019_0001); // hour 25
    nvs.put_u32(SCHEDULE_NAMESPACE, slot_key(2).unwrap(), 0); // empty
    nvs.put_u32(SCHEDULE_NAMESPACE, slot_key(3).unwrap(), sched(8, 0, 64).to_record());

    assert_eq!(load_table(&nvs).as_slice(), &[sched(7, 30, 2), sched(8, 0, 64)]);
}

#[test]
fn save_order_is_count_slots_commit() {
    use super::mocks::StorageCall;

    let mut nvs = MockNvs::new();
    save_table(&mut nvs, &[sched(7, 30, 2)]).unwrap();

    assert_eq!(nvs.calls.len(), 1 + MAX_SCHEDULES + 1);
    assert_eq!(
        nvs.calls[0],
        StorageCall::Write {
            namespace: SCHEDULE_NAMESPACE.into(),
            key: COUNT_KEY.into()
        }
    );
    assert_eq!(
        nvs.calls.last(),
        Some(&StorageCall::Commit {
            namespace: SCHEDULE_NAMESPACE.into()
        })
    );
}
