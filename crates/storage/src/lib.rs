// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! prevail-storage: durable journal segments and snapshots
//!
//! This crate provides:
//! - The prevalence directory (file naming, listing, retention)
//! - Segment record format with checksum verification
//! - Segment writer/reader with fsync-per-append durability
//! - The `Journal` capability (durable and transient variants)
//! - Snapshot files and crash recovery

pub mod directory;
pub mod journal;
pub mod record;
pub mod segment;
pub mod snapshot;

use thiserror::Error;

/// Errors from storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("corrupted record at line {line}: {reason}")]
    Corrupted { line: u64, reason: String },
    #[error("checksum mismatch at line {line}")]
    ChecksumMismatch { line: u64 },
    #[error("snapshot not found: {0}")]
    SnapshotNotFound(String),
    #[error("invalid snapshot format: {0}")]
    InvalidSnapshotFormat(String),
    #[error("not a directory: {0}")]
    NotADirectory(String),
}

// Re-exports
pub use directory::{FileKind, PrevalenceDirectory, VersionedFile};
pub use journal::{DurableJournal, Journal, TransientJournal};
pub use record::SegmentRecord;
pub use segment::{SegmentReader, SegmentWriter};
pub use snapshot::{Recovery, SnapshotBody, SnapshotManager};
