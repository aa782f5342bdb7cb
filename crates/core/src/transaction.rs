// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transaction and query capabilities
//!
//! A `Transaction` is a mutating, deterministic operation that is durably
//! journaled before being applied. A `Query` is read-only and never
//! journaled. Both receive the timestamp assigned by the engine's clock so
//! that replay reproduces the original execution exactly.

use crate::clock::Timestamp;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-level failure raised by a transaction or query body.
///
/// Carries only a message so it can cross the replication wire and be
/// reconstructed on the client side.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct TransactionError {
    pub message: String,
}

impl TransactionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// A mutating operation on the prevalent system.
///
/// Implementors are typically an enum covering every operation of one
/// system. The engine journals the transaction before applying it, so the
/// same value must round-trip through serialization for replay.
pub trait Transaction<S>: Clone + Send {
    type Output;

    fn apply(&self, system: &mut S, timestamp: Timestamp)
        -> Result<Self::Output, TransactionError>;
}

/// A read-only operation on the prevalent system.
///
/// Never journaled and never advances the system version.
pub trait Query<S> {
    type Output;

    fn query(&self, system: &S, timestamp: Timestamp) -> Result<Self::Output, TransactionError>;
}

#[cfg(test)]
#[path = "transaction_tests.rs"]
mod tests;
