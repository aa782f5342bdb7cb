// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wiring: recover state from a prevalence directory, open the journal,
//! hand back a publisher ready for work.

use crate::censor::{Censor, LiberalCensor, StrictCensor};
use crate::error::PrevalenceError;
use crate::publisher::CentralPublisher;
use prevail_core::{Clock, SystemClock, Transaction};
use prevail_storage::{
    DurableJournal, Journal, PrevalenceDirectory, SnapshotManager, TransientJournal,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

pub struct PrevalenceBuilder {
    base: PathBuf,
    transient: bool,
    clock: Option<Box<dyn Clock>>,
}

impl PrevalenceBuilder {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            transient: false,
            clock: None,
        }
    }

    /// Skip journaling entirely; only explicit snapshots persist anything.
    pub fn transient(mut self, transient: bool) -> Self {
        self.transient = transient;
        self
    }

    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Box::new(clock));
        self
    }

    /// Recover and wire a publisher that admits every transaction.
    pub fn build<S, T>(self, fresh: S) -> Result<CentralPublisher<S, T>, PrevalenceError>
    where
        S: Serialize + DeserializeOwned + Send,
        T: Transaction<S> + Serialize + DeserializeOwned + 'static,
    {
        self.assemble(fresh, Box::new(LiberalCensor))
    }

    /// Recover and wire a publisher that trial-applies each transaction
    /// on a clone before admitting it.
    pub fn build_filtered<S, T>(self, fresh: S) -> Result<CentralPublisher<S, T>, PrevalenceError>
    where
        S: Serialize + DeserializeOwned + Clone + Send,
        T: Transaction<S> + Serialize + DeserializeOwned + 'static,
    {
        self.assemble(fresh, Box::new(StrictCensor))
    }

    fn assemble<S, T>(
        self,
        fresh: S,
        censor: Box<dyn Censor<S, T>>,
    ) -> Result<CentralPublisher<S, T>, PrevalenceError>
    where
        S: Serialize + DeserializeOwned + Send,
        T: Transaction<S> + Serialize + DeserializeOwned + 'static,
    {
        let directory = PrevalenceDirectory::new(&self.base);
        directory.produce()?;

        let snapshots = SnapshotManager::new(directory.clone());
        let recovery = snapshots.recover::<S, T>(fresh)?;

        let journal: Box<dyn Journal<T>> = if self.transient {
            Box::new(TransientJournal)
        } else {
            Box::new(DurableJournal::open(directory, recovery.version)?)
        };

        let clock = self.clock.unwrap_or_else(|| Box::new(SystemClock));

        info!(
            base = %self.base.display(),
            version = recovery.version,
            transient = self.transient,
            "publisher ready"
        );

        Ok(CentralPublisher::new(
            clock,
            censor,
            journal,
            snapshots,
            recovery.system,
            recovery.version,
        ))
    }
}

#[cfg(test)]
#[path = "builder_tests.rs"]
mod tests;
