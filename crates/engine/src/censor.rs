// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admission control for transactions
//!
//! The censor runs before anything reaches the journal, so a rejected
//! transaction leaves no durable trace and costs no version.

use prevail_core::{Timestamp, Transaction, TransactionError};

/// Decides whether a transaction may be journaled and applied.
pub trait Censor<S, T>: Send {
    fn admit(
        &self,
        transaction: &T,
        system: &S,
        timestamp: Timestamp,
    ) -> Result<(), TransactionError>;
}

/// Admits everything. A transaction that later fails during apply still
/// breaks the system, exactly as a direct in-process caller would.
#[derive(Debug, Default, Clone, Copy)]
pub struct LiberalCensor;

impl<S, T> Censor<S, T> for LiberalCensor {
    fn admit(&self, _: &T, _: &S, _: Timestamp) -> Result<(), TransactionError> {
        Ok(())
    }
}

/// Trial-applies each transaction against a clone of the system and
/// rejects it if the trial fails, keeping doomed transactions out of
/// the journal entirely.
#[derive(Debug, Default, Clone, Copy)]
pub struct StrictCensor;

impl<S, T> Censor<S, T> for StrictCensor
where
    S: Clone,
    T: Transaction<S>,
{
    fn admit(
        &self,
        transaction: &T,
        system: &S,
        timestamp: Timestamp,
    ) -> Result<(), TransactionError> {
        let mut trial = system.clone();
        transaction.apply(&mut trial, timestamp).map(|_| ())
    }
}

#[cfg(test)]
#[path = "censor_tests.rs"]
mod tests;
