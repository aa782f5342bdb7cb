// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The central transaction publisher
//!
//! One mutex guards system, version, journal, and failure state, so the
//! journal order and the apply order are the same order. A transaction
//! is journaled durably before it touches the system; the version it was
//! journaled under is the version the caller sees.
//!
//! Failure states are one-way. A journal write failure aborts the log:
//! every later call fails fast without touching disk. A transaction that
//! fails while mutating state breaks the system: its partial effects are
//! untrusted, so queries and further applies are refused, but admitted
//! transactions are still journaled to preserve the global order for the
//! next recovery.

use crate::censor::Censor;
use crate::error::PrevalenceError;
use async_trait::async_trait;
use prevail_core::{Clock, Query, Timestamp, Transaction};
use prevail_storage::{Journal, SnapshotManager};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tracing::{error, info};

/// Outcome of a successfully applied transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Executed<R> {
    /// The version this transaction was journaled under
    pub version: u64,
    /// The timestamp it was applied with (and will replay with)
    pub timestamp: Timestamp,
    pub result: R,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherState {
    Active,
    /// A journal write failed; no further work is accepted.
    LogAborted,
    /// A transaction failed mid-apply; state is untrusted.
    SystemBroken,
}

struct Inner<S, T> {
    system: S,
    version: u64,
    state: PublisherState,
    journal: Box<dyn Journal<T>>,
    censor: Box<dyn Censor<S, T>>,
    snapshots: SnapshotManager,
}

pub struct CentralPublisher<S, T> {
    clock: Box<dyn Clock>,
    inner: Mutex<Inner<S, T>>,
}

impl<S, T> CentralPublisher<S, T>
where
    S: Send,
    T: Transaction<S>,
{
    pub fn new(
        clock: Box<dyn Clock>,
        censor: Box<dyn Censor<S, T>>,
        journal: Box<dyn Journal<T>>,
        snapshots: SnapshotManager,
        system: S,
        version: u64,
    ) -> Self {
        Self {
            clock,
            inner: Mutex::new(Inner {
                system,
                version,
                state: PublisherState::Active,
                journal,
                censor,
                snapshots,
            }),
        }
    }

    // A poisoned mutex means a caller panicked inside `inspect` or a
    // query closure; the protected state itself is still consistent.
    fn lock(&self) -> MutexGuard<'_, Inner<S, T>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Journal, then apply, one transaction.
    pub fn execute(&self, transaction: T) -> Result<Executed<T::Output>, PrevalenceError> {
        let mut inner = self.lock();
        let timestamp = self.clock.now();

        match inner.state {
            PublisherState::Active => {}
            PublisherState::LogAborted => return Err(PrevalenceError::DurabilityAborted),
            PublisherState::SystemBroken => {
                // Keep journaling so the order on disk stays complete,
                // but never apply against broken state.
                let next = inner.version + 1;
                match inner.journal.append(next, timestamp, &transaction) {
                    Ok(()) => inner.version = next,
                    Err(e) => error!(error = %e, "journal append failed while system broken"),
                }
                return Err(PrevalenceError::BrokenTransactions);
            }
        }

        inner
            .censor
            .admit(&transaction, &inner.system, timestamp)
            .map_err(PrevalenceError::Rejected)?;

        let next = inner.version + 1;
        if let Err(cause) = inner.journal.append(next, timestamp, &transaction) {
            inner.state = PublisherState::LogAborted;
            error!(error = %cause, "journal write failed; aborting the log");
            return Err(PrevalenceError::Durability { cause });
        }
        inner.version = next;

        match transaction.apply(&mut inner.system, timestamp) {
            Ok(result) => Ok(Executed {
                version: next,
                timestamp,
                result,
            }),
            Err(cause) => {
                inner.state = PublisherState::SystemBroken;
                error!(version = next, error = %cause, "transaction failed mid-apply; system broken");
                Err(PrevalenceError::Application(cause))
            }
        }
    }

    /// Run a read-only query under the same mutex transactions hold.
    pub fn query<Q: Query<S>>(&self, query: Q) -> Result<Q::Output, PrevalenceError> {
        let inner = self.lock();
        if inner.state == PublisherState::SystemBroken {
            return Err(PrevalenceError::BrokenQueries);
        }
        let timestamp = self.clock.now();
        query
            .query(&inner.system, timestamp)
            .map_err(PrevalenceError::Query)
    }

    /// Direct read access to the system under the mutex.
    pub fn inspect<R>(&self, f: impl FnOnce(&S) -> R) -> Result<R, PrevalenceError> {
        let inner = self.lock();
        if inner.state == PublisherState::SystemBroken {
            return Err(PrevalenceError::BrokenAccess);
        }
        Ok(f(&inner.system))
    }

    /// Serialize the full system at its current version, then rotate the
    /// journal so a fresh segment receives subsequent records.
    pub fn take_snapshot(&self) -> Result<PathBuf, PrevalenceError>
    where
        S: Serialize,
    {
        let mut inner = self.lock();
        match inner.state {
            PublisherState::Active => {}
            PublisherState::LogAborted => return Err(PrevalenceError::DurabilityAborted),
            PublisherState::SystemBroken => return Err(PrevalenceError::BrokenSnapshots),
        }

        let taken_at = self.clock.now();
        let version = inner.version;
        let path = inner.snapshots.write(version, taken_at, &inner.system)?;

        if let Err(cause) = inner.journal.rotate(version) {
            inner.state = PublisherState::LogAborted;
            error!(error = %cause, "journal rotation failed; aborting the log");
            return Err(PrevalenceError::Durability { cause });
        }

        info!(version, "snapshot taken");
        Ok(path)
    }

    pub fn version(&self) -> u64 {
        self.lock().version
    }

    pub fn state(&self) -> PublisherState {
        self.lock().state
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }
}

/// Seam shared by the in-process publisher and the remote client.
#[async_trait]
pub trait TransactionPublisher<S, T>: Send + Sync
where
    T: Transaction<S>,
{
    async fn publish(&self, transaction: T) -> Result<Executed<T::Output>, PrevalenceError>;
}

#[async_trait]
impl<S, T> TransactionPublisher<S, T> for CentralPublisher<S, T>
where
    S: Send,
    T: Transaction<S>,
    T::Output: Send,
{
    async fn publish(&self, transaction: T) -> Result<Executed<T::Output>, PrevalenceError> {
        self.execute(transaction)
    }
}

#[cfg(test)]
#[path = "publisher_tests.rs"]
mod tests;
