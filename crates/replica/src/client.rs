// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Remote publisher: a client end that satisfies `TransactionPublisher`
//! over one TCP connection to a publishing server.

use crate::protocol::{self, ProtocolError, Request, Response, DEFAULT_TIMEOUT, PROTOCOL_VERSION};
use async_trait::async_trait;
use prevail_core::Transaction;
use prevail_engine::{Executed, PrevalenceError, TransactionPublisher};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::time::Duration;
use thiserror::Error;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::sync::Mutex;
use tracing::debug;

/// Timeout for one publish exchange (env var in milliseconds)
pub fn timeout_publish() -> Duration {
    std::env::var("PREVAIL_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_TIMEOUT)
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("server speaks protocol version {server}, client speaks {client}")]
    VersionMismatch { server: u32, client: u32 },

    #[error("server refused handshake: {0}")]
    HandshakeRefused(String),

    #[error("unexpected response from server")]
    UnexpectedResponse,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

struct Connection {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
}

pub struct RemotePublisher<S, T> {
    connection: Mutex<Connection>,
    _marker: PhantomData<fn(S, T)>,
}

impl<S, T> RemotePublisher<S, T>
where
    T: Transaction<S> + Serialize,
    T::Output: DeserializeOwned,
{
    /// Connect and complete the version handshake.
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr).await?;
        let (reader, writer) = stream.into_split();
        let publisher = Self {
            connection: Mutex::new(Connection { reader, writer }),
            _marker: PhantomData,
        };

        match publisher
            .exchange(&Request::Hello {
                version: PROTOCOL_VERSION,
            })
            .await?
        {
            Response::Hello { version } if version == PROTOCOL_VERSION => {
                debug!(version, "connected to publishing server");
                Ok(publisher)
            }
            Response::Hello { version } => Err(ClientError::VersionMismatch {
                server: version,
                client: PROTOCOL_VERSION,
            }),
            Response::Error { message } => Err(ClientError::HandshakeRefused(message)),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }

    /// One request/response exchange under the connection lock, so
    /// concurrent callers never interleave frames.
    async fn exchange(&self, request: &Request<T>) -> Result<Response<T::Output>, ClientError> {
        let timeout = timeout_publish();
        let mut connection = self.connection.lock().await;

        let data = protocol::encode(request)?;
        tokio::time::timeout(
            timeout,
            protocol::write_message(&mut connection.writer, &data),
        )
        .await
        .map_err(|_| ProtocolError::Timeout)??;

        let response_bytes =
            tokio::time::timeout(timeout, protocol::read_message(&mut connection.reader))
                .await
                .map_err(|_| ProtocolError::Timeout)??;

        Ok(protocol::decode(&response_bytes)?)
    }

    /// Publish one transaction and wait for the server's outcome.
    pub async fn publish_remote(
        &self,
        transaction: T,
    ) -> Result<Executed<T::Output>, PrevalenceError> {
        let response = self
            .exchange(&Request::Publish { transaction })
            .await
            .map_err(|e| PrevalenceError::Communication(e.to_string()))?;

        match response {
            Response::Published {
                version,
                timestamp,
                outcome,
            } => match outcome {
                Ok(result) => Ok(Executed {
                    version,
                    timestamp,
                    result,
                }),
                Err(fault) => Err(fault.into()),
            },
            Response::Error { message } => Err(PrevalenceError::Unavailable(message)),
            _ => Err(PrevalenceError::Communication(
                "unexpected response from server".to_string(),
            )),
        }
    }

    pub async fn ping(&self) -> Result<(), ClientError> {
        match self.exchange(&Request::Ping).await? {
            Response::Pong => Ok(()),
            _ => Err(ClientError::UnexpectedResponse),
        }
    }
}

#[async_trait]
impl<S, T> TransactionPublisher<S, T> for RemotePublisher<S, T>
where
    S: Send + Sync,
    T: Transaction<S> + Serialize + Sync,
    T::Output: DeserializeOwned + Send,
{
    async fn publish(&self, transaction: T) -> Result<Executed<T::Output>, PrevalenceError> {
        self.publish_remote(transaction).await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
