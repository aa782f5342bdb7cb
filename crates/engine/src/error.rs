// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error taxonomy
//!
//! The broken-state variants carry fixed messages and no cause. The
//! cause surfaced once, on the transition into the state; every later
//! call fails fast.

use prevail_core::TransactionError;
use prevail_storage::StorageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PrevalenceError {
    /// The censor refused the transaction; nothing was journaled.
    #[error("transaction rejected: {0}")]
    Rejected(TransactionError),

    /// The transaction was journaled but failed while mutating state.
    #[error("transaction failed: {0}")]
    Application(TransactionError),

    /// A read-only query failed; journal and state untouched.
    #[error("query failed: {0}")]
    Query(TransactionError),

    /// A journal write failed; the publisher is now log-aborted.
    #[error("journal write failed")]
    Durability {
        #[source]
        cause: StorageError,
    },

    /// Fail-fast response after an earlier journal write failure.
    #[error("no longer accepting work because an earlier journal write failed")]
    DurabilityAborted,

    #[error("no longer processing transactions due to an error from an earlier transaction")]
    BrokenTransactions,

    #[error("no longer processing queries due to an error from an earlier transaction")]
    BrokenQueries,

    #[error("no longer allowing access to the system due to an error from an earlier transaction")]
    BrokenAccess,

    #[error("no longer taking snapshots due to an error from an earlier transaction")]
    BrokenSnapshots,

    /// Storage failure outside the journaling path (recovery, snapshots).
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// A remote publisher refused the request.
    #[error("server unavailable: {0}")]
    Unavailable(String),

    /// The connection to a remote publisher failed.
    #[error("communication failure: {0}")]
    Communication(String),
}
