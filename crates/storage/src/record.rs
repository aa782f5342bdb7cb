// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Segment record format with checksum verification
//!
//! One record per line of newline-delimited JSON. The checksum covers the
//! serialized transaction so a torn write or bit rot at the tail of a
//! segment is detected rather than replayed.

use crate::StorageError;
use prevail_core::Timestamp;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A single (timestamp, transaction) record in a journal segment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentRecord<T> {
    /// Version assigned to this transaction
    pub version: u64,
    /// Timestamp handed to the transaction when applied
    pub timestamp: Timestamp,
    /// The journaled transaction
    pub transaction: T,
    /// CRC32 of the serialized transaction
    pub checksum: u32,
}

impl<T: Serialize + DeserializeOwned> SegmentRecord<T> {
    /// Create a record with computed checksum
    pub fn new(version: u64, timestamp: Timestamp, transaction: T) -> Result<Self, StorageError> {
        let checksum = Self::checksum_of(&transaction)?;
        Ok(Self {
            version,
            timestamp,
            transaction,
            checksum,
        })
    }

    fn checksum_of(transaction: &T) -> Result<u32, StorageError> {
        let json = serde_json::to_string(transaction)?;
        Ok(crc32fast::hash(json.as_bytes()))
    }

    /// Verify the checksum matches the transaction
    pub fn verify(&self) -> bool {
        Self::checksum_of(&self.transaction)
            .map(|checksum| checksum == self.checksum)
            .unwrap_or(false)
    }

    /// Serialize to newline-delimited JSON (one line)
    pub fn to_line(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(StorageError::from)
    }

    /// Parse from a single line of JSON
    pub fn from_line(line: &str) -> Result<Self, StorageError> {
        serde_json::from_str(line).map_err(StorageError::from)
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
