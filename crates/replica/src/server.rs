// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket server executing remote transactions in arrival order.
//!
//! Each connection is served by its own task, but every publish funnels
//! into the one central publisher, so the journal order the server
//! produces is a single global order across all replicas.

use crate::protocol::{self, ProtocolError, Request, Response, PROTOCOL_VERSION};
use prevail_core::Transaction;
use prevail_engine::CentralPublisher;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub struct PublishingServer<S, T> {
    listener: TcpListener,
    publisher: Arc<CentralPublisher<S, T>>,
}

impl<S, T> PublishingServer<S, T>
where
    S: Send + 'static,
    T: Transaction<S> + DeserializeOwned + 'static,
    T::Output: Serialize + Send + 'static,
{
    pub async fn bind(
        addr: impl ToSocketAddrs,
        publisher: Arc<CentralPublisher<S, T>>,
    ) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            publisher,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept connections until the task is dropped.
    pub async fn run(self) -> Result<(), ServerError> {
        info!(addr = %self.listener.local_addr()?, "publishing server listening");
        loop {
            let (stream, peer) = self.listener.accept().await?;
            debug!(%peer, "replica connected");
            let publisher = Arc::clone(&self.publisher);
            tokio::spawn(async move {
                if let Err(e) = handle_connection(publisher, stream).await {
                    warn!(%peer, error = %e, "connection failed");
                }
            });
        }
    }
}

/// Serve one connection: requests are handled strictly in the order
/// they arrive on the stream.
async fn handle_connection<S, T>(
    publisher: Arc<CentralPublisher<S, T>>,
    stream: TcpStream,
) -> Result<(), ServerError>
where
    S: Send + 'static,
    T: Transaction<S> + DeserializeOwned + 'static,
    T::Output: Serialize + Send + 'static,
{
    let (mut reader, mut writer) = stream.into_split();

    loop {
        let data = match protocol::read_message(&mut reader).await {
            Ok(data) => data,
            Err(ProtocolError::ConnectionClosed) => {
                debug!("replica disconnected");
                return Ok(());
            }
            Err(e) => return Err(ServerError::Protocol(e)),
        };

        let request: Request<T> = protocol::decode(&data)?;
        let response = handle_request(&publisher, request).await;

        let encoded = protocol::encode(&response)?;
        protocol::write_message(&mut writer, &encoded).await?;
    }
}

async fn handle_request<S, T>(
    publisher: &Arc<CentralPublisher<S, T>>,
    request: Request<T>,
) -> Response<T::Output>
where
    S: Send + 'static,
    T: Transaction<S> + 'static,
    T::Output: Send + 'static,
{
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version } => {
            if version == PROTOCOL_VERSION {
                Response::Hello {
                    version: PROTOCOL_VERSION,
                }
            } else {
                Response::Error {
                    message: format!(
                        "unsupported protocol version: {} (expected {})",
                        version, PROTOCOL_VERSION
                    ),
                }
            }
        }

        // The publish fsyncs per journal append, so it runs on the
        // blocking pool rather than a runtime worker thread.
        Request::Publish { transaction } => {
            let publisher = Arc::clone(publisher);
            match tokio::task::spawn_blocking(move || publish(&publisher, transaction)).await {
                Ok(response) => response,
                Err(e) => Response::Error {
                    message: format!("publish task failed: {}", e),
                },
            }
        }
    }
}

fn publish<S, T>(publisher: &CentralPublisher<S, T>, transaction: T) -> Response<T::Output>
where
    S: Send,
    T: Transaction<S>,
{
    match publisher.execute(transaction) {
        Ok(executed) => Response::Published {
            version: executed.version,
            timestamp: executed.timestamp,
            outcome: Ok(executed.result),
        },
        // The error still carries the server's position so the
        // replica can tell how far the global order has moved.
        Err(e) => Response::Published {
            version: publisher.version(),
            timestamp: publisher.now(),
            outcome: Err(e.into()),
        },
    }
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
