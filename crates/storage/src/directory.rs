// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Prevalence directory: canonical file naming and retention
//!
//! All durable files live flat under one base directory. A segment is named
//! by the version of its first record; a snapshot is named by the version it
//! captures. Names are fixed-width zero-padded decimals so lexical order
//! equals version order.

use crate::StorageError;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Number of decimal digits in a versioned file name
const VERSION_DIGITS: usize = 19;

const SEGMENT_SUFFIX: &str = "segment";
const SNAPSHOT_SUFFIX: &str = "snapshot";

/// The two kinds of durable files under a prevalence base
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Segment,
    Snapshot,
}

impl FileKind {
    fn suffix(self) -> &'static str {
        match self {
            FileKind::Segment => SEGMENT_SUFFIX,
            FileKind::Snapshot => SNAPSHOT_SUFFIX,
        }
    }
}

/// A parsed durable file reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedFile {
    pub version: u64,
    pub kind: FileKind,
    pub path: PathBuf,
}

/// The set of on-disk snapshot/segment references under one base path
#[derive(Debug, Clone)]
pub struct PrevalenceDirectory {
    base: PathBuf,
}

impl PrevalenceDirectory {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Create the base directory if it does not exist
    pub fn produce(&self) -> Result<(), StorageError> {
        fs::create_dir_all(&self.base)?;
        if !self.base.is_dir() {
            return Err(StorageError::NotADirectory(
                self.base.display().to_string(),
            ));
        }
        Ok(())
    }

    /// Canonical file name for a version and kind
    pub fn file_name(version: u64, kind: FileKind) -> String {
        format!("{:0width$}.{}", version, kind.suffix(), width = VERSION_DIGITS)
    }

    /// Parse a file name into (version, kind); foreign files yield None
    pub fn parse_file_name(name: &str) -> Option<(u64, FileKind)> {
        let (stem, suffix) = name.split_once('.')?;
        if stem.len() != VERSION_DIGITS || !stem.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let version = stem.parse::<u64>().ok()?;
        let kind = match suffix {
            SEGMENT_SUFFIX => FileKind::Segment,
            SNAPSHOT_SUFFIX => FileKind::Snapshot,
            _ => return None,
        };
        Some((version, kind))
    }

    pub fn segment_path(&self, version: u64) -> PathBuf {
        self.base.join(Self::file_name(version, FileKind::Segment))
    }

    pub fn snapshot_path(&self, version: u64) -> PathBuf {
        self.base.join(Self::file_name(version, FileKind::Snapshot))
    }

    /// List all durable files, ascending by version
    pub fn list(&self) -> Result<Vec<VersionedFile>, StorageError> {
        if !self.base.exists() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&self.base)? {
            let entry = entry?;
            let path = entry.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            if let Some((version, kind)) = Self::parse_file_name(name) {
                files.push(VersionedFile {
                    version,
                    kind,
                    path,
                });
            }
        }

        files.sort_by_key(|f| f.version);
        Ok(files)
    }

    /// The snapshot with the greatest version not exceeding `version`
    pub fn latest_snapshot_at_or_below(
        &self,
        version: u64,
    ) -> Result<Option<VersionedFile>, StorageError> {
        Ok(self
            .list()?
            .into_iter()
            .filter(|f| f.kind == FileKind::Snapshot && f.version <= version)
            .next_back())
    }

    /// The most recent snapshot, if any
    pub fn latest_snapshot(&self) -> Result<Option<VersionedFile>, StorageError> {
        self.latest_snapshot_at_or_below(u64::MAX)
    }

    /// Segments that may hold records after `version`, ascending.
    ///
    /// The first of these is the segment with the greatest start not
    /// exceeding `version + 1`: a segment that was open when a snapshot was
    /// taken can hold records past the snapshot even though its name is
    /// below it.
    pub fn segments_after(&self, version: u64) -> Result<Vec<VersionedFile>, StorageError> {
        let segments: Vec<VersionedFile> = self
            .list()?
            .into_iter()
            .filter(|f| f.kind == FileKind::Segment)
            .collect();

        let initial = segments
            .iter()
            .filter(|s| s.version <= version.saturating_add(1))
            .map(|s| s.version)
            .max();

        Ok(segments
            .into_iter()
            .filter(|s| match initial {
                Some(start) => s.version >= start,
                None => true,
            })
            .collect())
    }

    /// The minimal file set needed to reconstruct current state:
    /// the latest snapshot plus every segment that may hold records past it.
    ///
    /// This only computes the set; deleting the remainder is a housekeeping
    /// concern outside this crate.
    pub fn necessary_files(&self) -> Result<HashSet<PathBuf>, StorageError> {
        let latest = self.latest_snapshot()?;
        let snapshot_version = latest.as_ref().map(|s| s.version).unwrap_or(0);

        let mut necessary: HashSet<PathBuf> = self
            .segments_after(snapshot_version)?
            .into_iter()
            .map(|s| s.path)
            .collect();

        if let Some(snapshot) = latest {
            necessary.insert(snapshot.path);
        }

        Ok(necessary)
    }
}

#[cfg(test)]
#[path = "directory_tests.rs"]
mod tests;
