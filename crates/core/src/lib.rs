// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! prevail-core: capability traits for the prevalence engine
//!
//! This crate provides:
//! - The `Transaction` and `Query` traits applications implement
//! - The `Clock` abstraction supplying per-transaction timestamps
//! - The application-level error type surfaced by both

pub mod clock;
pub mod transaction;

// Re-exports
pub use clock::{Clock, FakeClock, SystemClock, Timestamp};
pub use transaction::{Query, Transaction, TransactionError};
