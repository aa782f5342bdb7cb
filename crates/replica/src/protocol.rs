// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire protocol: 4-byte big-endian length prefix, JSON body.
//!
//! Both ends speak the same framed messages; the transaction and result
//! payloads stay generic so the protocol never needs to know the
//! application's types.

use prevail_core::{Timestamp, TransactionError};
use prevail_engine::PrevalenceError;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

pub const PROTOCOL_VERSION: u32 = 1;

/// Upper bound on one framed message; a snapshot never travels the wire,
/// so single transactions fit comfortably.
pub const MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

/// Timeout for one request/response exchange
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("connection closed")]
    ConnectionClosed,

    #[error("request timeout")]
    Timeout,

    #[error("message too large: {0} bytes")]
    MessageTooLarge(usize),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Client-to-server messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Request<T> {
    Hello { version: u32 },
    Publish { transaction: T },
    Ping,
}

/// Server-to-client messages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Response<R> {
    Hello {
        version: u32,
    },
    /// Outcome of one publish. `version` and `timestamp` are the
    /// server's, whether the transaction succeeded or not.
    Published {
        version: u64,
        timestamp: Timestamp,
        outcome: Result<R, Fault>,
    },
    Pong,
    Error {
        message: String,
    },
}

/// A publish failure carried back over the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Fault {
    /// The censor refused the transaction.
    Rejected { message: String },
    /// The transaction failed while mutating server state.
    Application { message: String },
    /// The server refused the request for its own reasons.
    Unavailable { message: String },
}

impl From<PrevalenceError> for Fault {
    fn from(error: PrevalenceError) -> Self {
        match error {
            PrevalenceError::Rejected(e) => Fault::Rejected {
                message: e.to_string(),
            },
            PrevalenceError::Application(e) => Fault::Application {
                message: e.to_string(),
            },
            other => Fault::Unavailable {
                message: other.to_string(),
            },
        }
    }
}

impl From<Fault> for PrevalenceError {
    fn from(fault: Fault) -> Self {
        match fault {
            Fault::Rejected { message } => {
                PrevalenceError::Rejected(TransactionError::new(message))
            }
            Fault::Application { message } => {
                PrevalenceError::Application(TransactionError::new(message))
            }
            Fault::Unavailable { message } => PrevalenceError::Unavailable(message),
        }
    }
}

/// Serialize a message to raw JSON (no length prefix)
pub fn encode<M: Serialize>(message: &M) -> Result<Vec<u8>, ProtocolError> {
    Ok(serde_json::to_vec(message)?)
}

/// Deserialize a message from raw JSON
pub fn decode<M: DeserializeOwned>(data: &[u8]) -> Result<M, ProtocolError> {
    Ok(serde_json::from_slice(data)?)
}

/// Write one length-prefixed message
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    data: &[u8],
) -> Result<(), ProtocolError> {
    if data.len() > MAX_MESSAGE_BYTES {
        return Err(ProtocolError::MessageTooLarge(data.len()));
    }
    let len = data.len() as u32;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(data).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed message.
///
/// EOF on the length prefix is a clean close, not an error payload.
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, ProtocolError> {
    let mut prefix = [0u8; 4];
    if let Err(e) = reader.read_exact(&mut prefix).await {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            return Err(ProtocolError::ConnectionClosed);
        }
        return Err(ProtocolError::Io(e));
    }

    let len = u32::from_be_bytes(prefix) as usize;
    if len > MAX_MESSAGE_BYTES {
        return Err(ProtocolError::MessageTooLarge(len));
    }

    let mut data = vec![0u8; len];
    reader.read_exact(&mut data).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            ProtocolError::ConnectionClosed
        } else {
            ProtocolError::Io(e)
        }
    })?;
    Ok(data)
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
