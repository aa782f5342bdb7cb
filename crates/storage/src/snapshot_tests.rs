// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::record::SegmentRecord;
use crate::segment::SegmentWriter;
use prevail_core::TransactionError;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Op {
    Append(String),
    Fail,
}

impl Transaction<String> for Op {
    type Output = String;

    fn apply(
        &self,
        system: &mut String,
        _timestamp: Timestamp,
    ) -> Result<String, TransactionError> {
        match self {
            Op::Append(text) => {
                system.push_str(text);
                Ok(system.clone())
            }
            Op::Fail => Err(TransactionError::new("boom")),
        }
    }
}

fn produced() -> (TempDir, SnapshotManager) {
    let tmp = TempDir::new().unwrap();
    let dir = PrevalenceDirectory::new(tmp.path());
    dir.produce().unwrap();
    (tmp, SnapshotManager::new(dir))
}

fn write_segment(manager: &SnapshotManager, start: u64, ops: &[(u64, Op)]) {
    let mut writer: SegmentWriter<Op> = SegmentWriter::create(manager.directory(), start).unwrap();
    for (version, op) in ops {
        writer
            .append(&SegmentRecord::new(*version, *version as i64, op.clone()).unwrap())
            .unwrap();
    }
}

#[test]
fn write_then_load_round_trip() {
    let (_tmp, manager) = produced();

    let path = manager.write(3, 99, &"abc".to_string()).unwrap();
    assert_eq!(path, manager.directory().snapshot_path(3));

    let snapshot = manager.directory().latest_snapshot().unwrap().unwrap();
    let body: SnapshotBody<String> = manager.load(&snapshot).unwrap();

    assert_eq!(body.system, "abc");
    assert_eq!(body.system_version, 3);
    assert_eq!(body.taken_at, 99);
}

#[test]
fn write_at_same_version_rewrites_same_file() {
    let (_tmp, manager) = produced();

    let first = manager.write(2, 10, &"ab".to_string()).unwrap();
    let second = manager.write(2, 20, &"ab".to_string()).unwrap();

    assert_eq!(first, second);

    let snapshot = manager.directory().latest_snapshot().unwrap().unwrap();
    let body: SnapshotBody<String> = manager.load(&snapshot).unwrap();
    assert_eq!(body.taken_at, 20);
}

#[test]
fn load_rejects_unknown_format_version() {
    let (_tmp, manager) = produced();

    manager.write(1, 0, &"a".to_string()).unwrap();
    let snapshot = manager.directory().latest_snapshot().unwrap().unwrap();

    let raw = std::fs::read_to_string(&snapshot.path).unwrap();
    let bumped = raw.replace("\"format_version\":1", "\"format_version\":9");
    std::fs::write(&snapshot.path, bumped).unwrap();

    assert!(matches!(
        manager.load::<String>(&snapshot),
        Err(StorageError::InvalidSnapshotFormat(_))
    ));
}

#[test]
fn recover_with_empty_directory_starts_fresh() {
    let (_tmp, manager) = produced();

    let recovery = manager.recover::<String, Op>(String::new()).unwrap();

    assert_eq!(recovery.system, "");
    assert_eq!(recovery.version, 0);
}

#[test]
fn recover_replays_segments_in_order() {
    let (_tmp, manager) = produced();

    write_segment(&manager, 1, &[(1, Op::Append("a".into())), (2, Op::Append("b".into()))]);
    write_segment(&manager, 3, &[(3, Op::Append("c".into()))]);

    let recovery = manager.recover::<String, Op>(String::new()).unwrap();

    assert_eq!(recovery.system, "abc");
    assert_eq!(recovery.version, 3);
}

#[test]
fn recover_from_snapshot_alone_restores_exact_state() {
    let (_tmp, manager) = produced();

    manager.write(2, 0, &"ab".to_string()).unwrap();

    let recovery = manager.recover::<String, Op>(String::new()).unwrap();

    assert_eq!(recovery.system, "ab");
    assert_eq!(recovery.version, 2);
}

#[test]
fn recover_skips_records_covered_by_the_snapshot() {
    let (_tmp, manager) = produced();

    // Segment 1 holds versions 1..=4; the snapshot covers through 2.
    write_segment(
        &manager,
        1,
        &[
            (1, Op::Append("a".into())),
            (2, Op::Append("b".into())),
            (3, Op::Append("c".into())),
            (4, Op::Append("d".into())),
        ],
    );
    manager.write(2, 0, &"ab".to_string()).unwrap();

    let recovery = manager.recover::<String, Op>(String::new()).unwrap();

    assert_eq!(recovery.system, "abcd");
    assert_eq!(recovery.version, 4);
}

#[test]
fn recover_trusts_embedded_version_for_sentinel_snapshot() {
    let (_tmp, manager) = produced();

    let path = manager.write(3, 0, &"abc".to_string()).unwrap();
    std::fs::rename(&path, manager.directory().snapshot_path(0)).unwrap();

    let recovery = manager.recover::<String, Op>(String::new()).unwrap();

    assert_eq!(recovery.system, "abc");
    assert_eq!(recovery.version, 3);
}

#[test]
fn recover_stops_at_truncated_trailing_record() {
    let (_tmp, manager) = produced();

    write_segment(&manager, 1, &[(1, Op::Append("a".into())), (2, Op::Append("b".into()))]);

    let path = manager.directory().segment_path(1);
    let content = std::fs::read(&path).unwrap();
    std::fs::write(&path, &content[..content.len() - 8]).unwrap();

    let recovery = manager.recover::<String, Op>(String::new()).unwrap();

    assert_eq!(recovery.system, "a");
    assert_eq!(recovery.version, 1);
}

#[test]
fn recover_continues_past_failing_transaction() {
    let (_tmp, manager) = produced();

    write_segment(
        &manager,
        1,
        &[
            (1, Op::Append("a".into())),
            (2, Op::Fail),
            (3, Op::Append("b".into())),
        ],
    );

    let recovery = manager.recover::<String, Op>(String::new()).unwrap();

    // The failing record was durably admitted, so it advances the version
    // even though it leaves no trace in the state.
    assert_eq!(recovery.system, "ab");
    assert_eq!(recovery.version, 3);
}

#[test]
fn recover_up_to_stops_at_the_ceiling() {
    let (_tmp, manager) = produced();

    write_segment(
        &manager,
        1,
        &[
            (1, Op::Append("a".into())),
            (2, Op::Append("b".into())),
            (3, Op::Append("c".into())),
        ],
    );
    // This snapshot is past the ceiling, so it must not be used.
    manager.write(3, 0, &"abc".to_string()).unwrap();

    let recovery = manager
        .recover_up_to::<String, Op>(String::new(), 2)
        .unwrap();

    assert_eq!(recovery.system, "ab");
    assert_eq!(recovery.version, 2);
}

#[test]
fn recover_stops_on_version_discontinuity() {
    let (_tmp, manager) = produced();

    write_segment(&manager, 1, &[(1, Op::Append("a".into())), (5, Op::Append("z".into()))]);

    let recovery = manager.recover::<String, Op>(String::new()).unwrap();

    assert_eq!(recovery.system, "a");
    assert_eq!(recovery.version, 1);
}
