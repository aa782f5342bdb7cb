// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! prevail-replica: publish transactions over TCP
//!
//! This crate provides:
//! - The length-prefixed JSON wire protocol shared by both ends
//! - `PublishingServer`, which executes remote transactions against a
//!   central publisher in arrival order
//! - `RemotePublisher`, a client that satisfies `TransactionPublisher`
//!   over a connection to the server

pub mod client;
pub mod protocol;
pub mod server;

// Re-exports
pub use client::{ClientError, RemotePublisher};
pub use protocol::{Fault, ProtocolError, Request, Response, PROTOCOL_VERSION};
pub use server::{PublishingServer, ServerError};
