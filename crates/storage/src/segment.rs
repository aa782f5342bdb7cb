// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Segment files: durable append and sequential replay
//!
//! A segment is an append-only file holding the records for a contiguous
//! version range, named by the version of its first record. The writer
//! fsyncs every append; the reader stops at the first record that fails to
//! parse or verify, which is the signature of a crash mid-append.

use crate::directory::PrevalenceDirectory;
use crate::record::SegmentRecord;
use crate::StorageError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

/// Exclusive write handle on an open segment
pub struct SegmentWriter<T> {
    path: PathBuf,
    file: File,
    start_version: u64,
    _transaction: PhantomData<fn(T)>,
}

impl<T: Serialize + DeserializeOwned> SegmentWriter<T> {
    /// Open the segment whose first record will carry `start_version`.
    ///
    /// An existing file with this name can only be a leftover from a crashed
    /// session that never journaled a valid record into it, so it is
    /// truncated rather than appended to.
    pub fn create(
        directory: &PrevalenceDirectory,
        start_version: u64,
    ) -> Result<Self, StorageError> {
        let path = directory.segment_path(start_version);
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        Ok(Self {
            path,
            file,
            start_version,
            _transaction: PhantomData,
        })
    }

    /// Append one record and force it to stable storage before returning
    pub fn append(&mut self, record: &SegmentRecord<T>) -> Result<(), StorageError> {
        let line = record.to_line()?;
        self.file.write_all(line.as_bytes())?;
        self.file.write_all(b"\n")?;
        self.file.sync_all()?;
        Ok(())
    }

    pub fn start_version(&self) -> u64 {
        self.start_version
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Sequential reader over one segment's records
pub struct SegmentReader<T> {
    path: PathBuf,
    _transaction: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> SegmentReader<T> {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if !path.exists() {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("segment not found: {}", path.display()),
            )));
        }
        Ok(Self {
            path: path.to_path_buf(),
            _transaction: PhantomData,
        })
    }

    /// Iterate records in order, skipping any with version at or below
    /// `floor` (a snapshot may fall mid-segment).
    ///
    /// The iterator yields an error item for the first corrupted or
    /// truncated record; the caller treats that as the end of this
    /// segment's history.
    pub fn records_after(&self, floor: u64) -> Result<SegmentRecordIter<T>, StorageError> {
        Ok(SegmentRecordIter {
            reader: BufReader::new(File::open(&self.path)?),
            line_number: 0,
            floor,
            _transaction: PhantomData,
        })
    }

    /// Iterate all records in order
    pub fn records(&self) -> Result<SegmentRecordIter<T>, StorageError> {
        self.records_after(0)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Iterator over segment records with corruption detection
pub struct SegmentRecordIter<T> {
    reader: BufReader<File>,
    line_number: u64,
    floor: u64,
    _transaction: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> Iterator for SegmentRecordIter<T> {
    type Item = Result<SegmentRecord<T>, StorageError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None, // EOF
                Ok(_) => {
                    self.line_number += 1;

                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    let record = match SegmentRecord::from_line(trimmed) {
                        Ok(r) => r,
                        Err(e) => {
                            return Some(Err(StorageError::Corrupted {
                                line: self.line_number,
                                reason: e.to_string(),
                            }));
                        }
                    };

                    if !record.verify() {
                        return Some(Err(StorageError::ChecksumMismatch {
                            line: self.line_number,
                        }));
                    }

                    if record.version <= self.floor {
                        continue;
                    }

                    return Some(Ok(record));
                }
                Err(e) => return Some(Err(StorageError::Io(e))),
            }
        }
    }
}

#[cfg(test)]
#[path = "segment_tests.rs"]
mod tests;
