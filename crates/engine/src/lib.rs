// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! prevail-engine: the transaction publisher
//!
//! This crate provides:
//! - `CentralPublisher`, which journals, timestamps, and applies
//!   transactions against the in-memory prevalent system
//! - The `Censor` admission seam (liberal and strict variants)
//! - `PrevalenceBuilder`, the one entry point that recovers state from
//!   a prevalence directory and wires a publisher over it

pub mod builder;
pub mod censor;
pub mod error;
pub mod publisher;

// Re-exports
pub use builder::PrevalenceBuilder;
pub use censor::{Censor, LiberalCensor, StrictCensor};
pub use error::PrevalenceError;
pub use publisher::{CentralPublisher, Executed, PublisherState, TransactionPublisher};
