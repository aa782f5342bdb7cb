// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Append {
    text: String,
}

fn sample(version: u64) -> SegmentRecord<Append> {
    SegmentRecord::new(
        version,
        1_000 + version as i64,
        Append {
            text: "x".to_string(),
        },
    )
    .unwrap()
}

#[test]
fn record_line_round_trip() {
    let record = sample(7);
    let line = record.to_line().unwrap();

    assert!(!line.contains('\n'));

    let decoded: SegmentRecord<Append> = SegmentRecord::from_line(&line).unwrap();
    assert_eq!(decoded.version, 7);
    assert_eq!(decoded.timestamp, 1_007);
    assert_eq!(decoded.transaction, record.transaction);
    assert!(decoded.verify());
}

#[test]
fn verify_detects_tampered_transaction() {
    let mut record = sample(1);
    record.transaction.text = "tampered".to_string();
    assert!(!record.verify());
}

#[test]
fn verify_detects_tampered_checksum() {
    let mut record = sample(1);
    record.checksum ^= 0xdead_beef;
    assert!(!record.verify());
}

#[test]
fn from_line_rejects_truncated_json() {
    let line = sample(1).to_line().unwrap();
    let truncated = &line[..line.len() / 2];
    assert!(SegmentRecord::<Append>::from_line(truncated).is_err());
}
