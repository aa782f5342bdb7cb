// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Journal capability: durable (segment-backed) and transient variants
//!
//! The publisher appends every admitted transaction here before applying it
//! live. The durable variant owns the open segment's write handle for the
//! life of the session; `rotate` is called right after a snapshot so a fresh
//! segment receives subsequent records.

use crate::directory::PrevalenceDirectory;
use crate::record::SegmentRecord;
use crate::segment::SegmentWriter;
use crate::StorageError;
use prevail_core::Timestamp;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Durable, ordered recording of (timestamp, transaction) records
pub trait Journal<T>: Send {
    /// Append one record; it is durable before this returns.
    fn append(
        &mut self,
        version: u64,
        timestamp: Timestamp,
        transaction: &T,
    ) -> Result<(), StorageError>;

    /// Close the open segment and open a new one named `version + 1`.
    fn rotate(&mut self, version: u64) -> Result<(), StorageError>;
}

/// Segment-backed journal under a prevalence directory
pub struct DurableJournal<T> {
    directory: PrevalenceDirectory,
    writer: SegmentWriter<T>,
}

impl<T: Serialize + DeserializeOwned> DurableJournal<T> {
    /// Open a journal for a session starting at `current_version`.
    ///
    /// The first record of the new segment will carry `current_version + 1`.
    pub fn open(
        directory: PrevalenceDirectory,
        current_version: u64,
    ) -> Result<Self, StorageError> {
        let writer = SegmentWriter::create(&directory, current_version + 1)?;
        Ok(Self { directory, writer })
    }

    pub fn directory(&self) -> &PrevalenceDirectory {
        &self.directory
    }
}

impl<T: Serialize + DeserializeOwned + Clone + Send> Journal<T> for DurableJournal<T> {
    fn append(
        &mut self,
        version: u64,
        timestamp: Timestamp,
        transaction: &T,
    ) -> Result<(), StorageError> {
        let record = SegmentRecord::new(version, timestamp, transaction.clone())?;
        self.writer.append(&record)
    }

    fn rotate(&mut self, version: u64) -> Result<(), StorageError> {
        self.writer = SegmentWriter::create(&self.directory, version + 1)?;
        Ok(())
    }
}

/// Journal that accepts and discards every record.
///
/// For tests and applications that only want explicit snapshots ("save
/// button" mode); recovery replays nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransientJournal;

impl<T> Journal<T> for TransientJournal {
    fn append(&mut self, _: u64, _: Timestamp, _: &T) -> Result<(), StorageError> {
        Ok(())
    }

    fn rotate(&mut self, _: u64) -> Result<(), StorageError> {
        Ok(())
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
