//! Unit tests for snapshot pruning.

use super::*;
use crate::clock::FixedClock;
use crate::storage::Snapshot;
use crate::test_support::{MemoryStorage, StorageCall, StorageOperation};
use chrono::{Duration, TimeZone, Utc};
use rstest::{fixture, rstest};

#[fixture]
fn clock() -> FixedClock {
    let instant = Utc
        .with_ymd_and_hms(2024, 3, 9, 12, 0, 0)
        .single()
        .expect("valid fixture instant");
    FixedClock::new(instant)
}

fn aged(clock: FixedClock, id: &str, days: i64) -> Snapshot {
    Snapshot::new(id, clock.now() - Duration::days(days))
}

#[rstest]
fn deletes_snapshots_past_custom_window(clock: FixedClock) {
    let storage = MemoryStorage::new();
    storage.add_snapshot("123", aged(clock, "snap-3d", 3));
    storage.add_snapshot("123", aged(clock, "snap-6d", 6));
    storage.add_snapshot("123", aged(clock, "snap-10d", 10));

    SnapshotPruner::new(storage.clone(), clock)
        .delete_old_snapshots("123", RetentionDays::new(5))
        .expect("prune should succeed");

    assert_eq!(storage.deleted_snapshot_ids(), vec!["snap-6d", "snap-10d"]);
    assert_eq!(storage.snapshot_ids(), vec!["snap-3d"]);
}

#[rstest]
fn default_window_keeps_thirty_days(clock: FixedClock) {
    let storage = MemoryStorage::new();
    storage.add_snapshot("123", aged(clock, "snap-29d", 29));
    storage.add_snapshot("123", aged(clock, "snap-30d", 30));
    storage.add_snapshot("123", aged(clock, "snap-31d", 31));

    SnapshotPruner::new(storage.clone(), clock)
        .delete_old_snapshots("123", RetentionDays::default())
        .expect("prune should succeed");

    assert_eq!(storage.deleted_snapshot_ids(), vec!["snap-31d"]);
}

#[rstest]
fn lists_only_the_requested_owner(clock: FixedClock) {
    let storage = MemoryStorage::new();
    storage.add_snapshot("123", aged(clock, "snap-mine", 90));
    storage.add_snapshot("999", aged(clock, "snap-shared", 90));

    SnapshotPruner::new(storage.clone(), clock)
        .delete_old_snapshots("123", RetentionDays::default())
        .expect("prune should succeed");

    assert_eq!(
        storage.calls().first(),
        Some(&StorageCall::ListSnapshots {
            owner_ids: vec![String::from("123")],
        })
    );
    assert_eq!(storage.deleted_snapshot_ids(), vec!["snap-mine"]);
}

#[rstest]
fn future_start_times_are_kept(clock: FixedClock) {
    let storage = MemoryStorage::new();
    storage.add_snapshot("123", aged(clock, "snap-future", -3));

    SnapshotPruner::new(storage.clone(), clock)
        .delete_old_snapshots("123", RetentionDays::new(0))
        .expect("prune should succeed");

    assert!(storage.deleted_snapshot_ids().is_empty());
}

#[rstest]
fn delete_failure_aborts_remaining_snapshots(clock: FixedClock) {
    let storage = MemoryStorage::new();
    for id in ["snap-a", "snap-b", "snap-c"] {
        storage.add_snapshot("123", aged(clock, id, 40));
    }
    storage.fail_on(StorageOperation::DeleteSnapshot, 2);

    let err = SnapshotPruner::new(storage.clone(), clock)
        .delete_old_snapshots("123", RetentionDays::default())
        .expect_err("second delete should fail");

    assert_eq!(err.operation, StorageOperation::DeleteSnapshot);
    assert_eq!(storage.deleted_snapshot_ids(), vec!["snap-a", "snap-b"]);
    assert_eq!(storage.snapshot_ids(), vec!["snap-b", "snap-c"]);
}

#[rstest]
fn listing_failure_propagates(clock: FixedClock) {
    let storage = MemoryStorage::new();
    storage.fail_on(StorageOperation::ListSnapshots, 1);

    let err = SnapshotPruner::new(storage.clone(), clock)
        .delete_old_snapshots("123", RetentionDays::default())
        .expect_err("listing should fail");

    assert_eq!(err.operation, StorageOperation::ListSnapshots);
    assert_eq!(storage.calls().len(), 1);
}
