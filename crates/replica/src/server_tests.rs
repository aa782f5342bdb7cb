// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::client::RemotePublisher;
use prevail_core::{Timestamp, TransactionError};
use prevail_engine::{PrevalenceBuilder, PrevalenceError};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Op {
    Append(String),
    Fail,
    Slow(String),
}

impl Transaction<String> for Op {
    type Output = String;

    fn apply(&self, system: &mut String, _: Timestamp) -> Result<String, TransactionError> {
        match self {
            Op::Append(text) => {
                system.push_str(text);
                Ok(system.clone())
            }
            Op::Fail => Err(TransactionError::new("boom")),
            Op::Slow(text) => {
                std::thread::sleep(std::time::Duration::from_secs(1));
                system.push_str(text);
                Ok(system.clone())
            }
        }
    }
}

async fn start_server() -> (TempDir, Arc<CentralPublisher<String, Op>>, SocketAddr) {
    let tmp = TempDir::new().unwrap();
    let publisher: Arc<CentralPublisher<String, Op>> = Arc::new(
        PrevalenceBuilder::new(tmp.path())
            .build(String::new())
            .unwrap(),
    );

    let server = PublishingServer::bind("127.0.0.1:0", Arc::clone(&publisher))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(server.run());

    (tmp, publisher, addr)
}

#[tokio::test]
async fn remote_publish_applies_on_the_server() {
    let (_tmp, publisher, addr) = start_server().await;

    let client = RemotePublisher::<String, Op>::connect(addr).await.unwrap();
    let executed = client.publish_remote(Op::Append("a".into())).await.unwrap();

    assert_eq!(executed.version, 1);
    assert_eq!(executed.result, "a");
    assert_eq!(publisher.inspect(|s| s.clone()).unwrap(), "a");
}

#[tokio::test]
async fn clients_share_one_global_order() {
    let (_tmp, publisher, addr) = start_server().await;

    let first = RemotePublisher::<String, Op>::connect(addr).await.unwrap();
    let second = RemotePublisher::<String, Op>::connect(addr).await.unwrap();

    let a = first.publish_remote(Op::Append("a".into())).await.unwrap();
    let b = second.publish_remote(Op::Append("b".into())).await.unwrap();

    assert_eq!(a.version, 1);
    assert_eq!(b.version, 2);
    assert_eq!(publisher.inspect(|s| s.clone()).unwrap(), "ab");
}

#[tokio::test]
async fn application_fault_travels_back_to_the_replica() {
    let (_tmp, publisher, addr) = start_server().await;

    let client = RemotePublisher::<String, Op>::connect(addr).await.unwrap();
    let failed = client.publish_remote(Op::Fail).await;

    assert!(matches!(failed, Err(PrevalenceError::Application(_))));

    // The server broke; later publishes come back unavailable.
    let refused = client.publish_remote(Op::Append("late".into())).await;
    assert!(matches!(refused, Err(PrevalenceError::Unavailable(_))));
    assert_eq!(publisher.version(), 2);
}

#[tokio::test]
async fn ping_answers_pong() {
    let (_tmp, _publisher, addr) = start_server().await;

    let client = RemotePublisher::<String, Op>::connect(addr).await.unwrap();
    client.ping().await.unwrap();
}

#[tokio::test]
async fn slow_publish_does_not_stall_other_connections() {
    let (_tmp, _publisher, addr) = start_server().await;

    let busy = RemotePublisher::<String, Op>::connect(addr).await.unwrap();
    let idle = RemotePublisher::<String, Op>::connect(addr).await.unwrap();

    // This test runs on a current-thread runtime, so the ping below can
    // only complete while the slow publish is off the runtime thread.
    let slow = tokio::spawn(async move { busy.publish_remote(Op::Slow("s".into())).await });
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    tokio::time::timeout(std::time::Duration::from_millis(500), idle.ping())
        .await
        .expect("ping stalled behind a slow publish")
        .unwrap();

    let executed = slow.await.unwrap().unwrap();
    assert_eq!(executed.result, "s");
}

#[tokio::test]
async fn hello_with_wrong_version_is_refused() {
    let (_tmp, _publisher, addr) = start_server().await;

    let stream = TcpStream::connect(addr).await.unwrap();
    let (mut reader, mut writer) = stream.into_split();

    let hello: Request<Op> = Request::Hello { version: 99 };
    let data = protocol::encode(&hello).unwrap();
    protocol::write_message(&mut writer, &data).await.unwrap();

    let response_bytes = protocol::read_message(&mut reader).await.unwrap();
    let response: Response<String> = protocol::decode(&response_bytes).unwrap();

    assert!(matches!(response, Response::Error { .. }));
}
