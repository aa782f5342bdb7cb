// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot files and crash recovery
//!
//! A snapshot is a full serialization of the prevalent system at one
//! version, bounding how much journal has to be replayed on startup.
//! Recovery loads the latest snapshot and replays every later record
//! through the same apply path used live.

use crate::directory::{PrevalenceDirectory, VersionedFile};
use crate::segment::SegmentReader;
use crate::StorageError;
use prevail_core::{Timestamp, Transaction};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, warn};

/// On-disk snapshot document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotBody<S> {
    pub format_version: u32,
    /// Version captured; authoritative when the file name is the legacy
    /// version-0 sentinel.
    pub system_version: u64,
    pub taken_at: Timestamp,
    pub system: S,
}

impl<S> SnapshotBody<S> {
    /// Current version of the snapshot format
    pub const CURRENT_FORMAT: u32 = 1;
}

/// Result of startup recovery
#[derive(Debug)]
pub struct Recovery<S> {
    pub system: S,
    pub version: u64,
}

/// Writes snapshots and reconstructs state from (snapshot, segments)
pub struct SnapshotManager {
    directory: PrevalenceDirectory,
}

impl SnapshotManager {
    pub fn new(directory: PrevalenceDirectory) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &PrevalenceDirectory {
        &self.directory
    }

    /// Serialize the full system state into the file named for `version`.
    ///
    /// Writing again at the same version rewrites the same file, so the
    /// operation is name-idempotent.
    pub fn write<S: Serialize>(
        &self,
        version: u64,
        taken_at: Timestamp,
        system: &S,
    ) -> Result<PathBuf, StorageError> {
        let path = self.directory.snapshot_path(version);
        let body = SnapshotBody {
            format_version: SnapshotBody::<&S>::CURRENT_FORMAT,
            system_version: version,
            taken_at,
            system,
        };

        let file = File::create(&path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &body)?;
        writer.flush()?;
        writer.get_ref().sync_all()?;

        info!(version, path = %path.display(), "snapshot written");
        Ok(path)
    }

    /// Load a snapshot body, checking the format version
    pub fn load<S: DeserializeOwned>(
        &self,
        snapshot: &VersionedFile,
    ) -> Result<SnapshotBody<S>, StorageError> {
        if !snapshot.path.exists() {
            return Err(StorageError::SnapshotNotFound(
                snapshot.path.display().to_string(),
            ));
        }

        let file = File::open(&snapshot.path)?;
        let reader = BufReader::new(file);
        let body: SnapshotBody<S> = serde_json::from_reader(reader)?;

        if body.format_version != SnapshotBody::<S>::CURRENT_FORMAT {
            return Err(StorageError::InvalidSnapshotFormat(format!(
                "unsupported format version: {} (expected {})",
                body.format_version,
                SnapshotBody::<S>::CURRENT_FORMAT
            )));
        }

        Ok(body)
    }

    /// Reconstruct current state: latest snapshot, then every later record.
    ///
    /// With no snapshot on disk, recovery starts from `fresh` at version 0.
    /// A record that fails to apply is logged and skipped over, but it
    /// still advances the version, since it was durably admitted.
    pub fn recover<S, T>(&self, fresh: S) -> Result<Recovery<S>, StorageError>
    where
        S: DeserializeOwned,
        T: Transaction<S> + Serialize + DeserializeOwned,
    {
        self.recover_up_to::<S, T>(fresh, u64::MAX)
    }

    /// Reconstruct state as of `ceiling`: the latest snapshot at or below
    /// it, then every later record up to and including it.
    pub fn recover_up_to<S, T>(&self, fresh: S, ceiling: u64) -> Result<Recovery<S>, StorageError>
    where
        S: DeserializeOwned,
        T: Transaction<S> + Serialize + DeserializeOwned,
    {
        let mut system = fresh;
        let mut version: u64 = 0;

        if let Some(snapshot) = self.directory.latest_snapshot_at_or_below(ceiling)? {
            let body: SnapshotBody<S> = self.load(&snapshot)?;
            system = body.system;
            version = if snapshot.version == 0 {
                // Legacy sentinel: the embedded version is authoritative.
                body.system_version
            } else {
                if body.system_version != snapshot.version {
                    warn!(
                        file = snapshot.version,
                        embedded = body.system_version,
                        "snapshot name and embedded version disagree; trusting the name"
                    );
                }
                snapshot.version
            };
            info!(version, "recovered from snapshot");
        }

        'segments: for segment in self.directory.segments_after(version)? {
            let reader: SegmentReader<T> = SegmentReader::open(&segment.path)?;
            for record in reader.records_after(version)? {
                let record = match record {
                    Ok(r) => r,
                    Err(e) => {
                        // Truncated trailing record: the natural end of this
                        // segment's history, not a recovery failure.
                        warn!(segment = segment.version, error = %e, "stopping segment replay");
                        continue 'segments;
                    }
                };

                if record.version > ceiling {
                    break 'segments;
                }

                if record.version != version + 1 {
                    warn!(
                        expected = version + 1,
                        found = record.version,
                        "version discontinuity in journal; stopping replay"
                    );
                    break 'segments;
                }

                if let Err(e) = record.transaction.apply(&mut system, record.timestamp) {
                    warn!(version = record.version, error = %e, "transaction failed during replay");
                }
                version = record.version;
            }
        }

        info!(version, "recovery complete");
        Ok(Recovery { system, version })
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
