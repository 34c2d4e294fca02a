//! A runner talking to an in-process management plane

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use actorhost::{
    BackoffConfig, ConnectionEvent, ConnectionState, Key, MemoryStore, RunnerConfig,
    RunnerConnection, TransportResolver,
};

use crate::common::{actor_kv, init_tracing, HelloHandshake, LoopbackTransport, PlaneSession};

const WAIT: Duration = Duration::from_secs(5);

fn runner_config() -> RunnerConfig {
    RunnerConfig {
        runner_name: "edge-1".into(),
        backoff: BackoffConfig {
            initial_delay_ms: 10,
            max_delay_ms: 50,
            ..BackoffConfig::default()
        },
        ..RunnerConfig::with_endpoint("loopback://plane")
    }
}

async fn accept(sessions: &mut mpsc::UnboundedReceiver<PlaneSession>) -> PlaneSession {
    let mut session = tokio::time::timeout(WAIT, sessions.recv())
        .await
        .expect("runner never connected")
        .expect("transport dropped");
    let hello = tokio::time::timeout(WAIT, session.from_runner.recv())
        .await
        .expect("no handshake frame")
        .expect("runner hung up");
    assert_eq!(hello, b"edge-1".to_vec());
    session
}

#[tokio::test]
async fn plane_commands_are_applied_to_actor_kv() {
    init_tracing();
    let (transport, mut sessions) = LoopbackTransport::new();
    let (inbound_tx, mut inbound_rx) = mpsc::channel(16);
    let runner = RunnerConnection::new(
        runner_config(),
        Arc::new(TransportResolver::fixed(transport)),
        Arc::new(HelloHandshake),
    )
    .unwrap()
    .with_inbound(inbound_tx);

    let store = MemoryStore::new();
    let (_, kv) = actor_kv(&store);
    let acks = runner.frames();

    // Actor side: store every command frame and acknowledge it
    let worker = tokio::spawn(async move {
        let mut applied = 0u32;
        while let Some(frame) = inbound_rx.recv().await {
            applied += 1;
            kv.put(Key::new([b"inbox".to_vec(), applied.to_be_bytes().to_vec()]), frame)
                .await
                .unwrap();
            acks.send(applied.to_be_bytes().to_vec()).await.unwrap();
            if applied == 3 {
                break;
            }
        }
        kv
    });

    runner.connect().await.unwrap();
    let mut session = accept(&mut sessions).await;
    for command in [&b"start"[..], &b"scale"[..], &b"stop"[..]] {
        session.to_runner.send(command.to_vec()).await.unwrap();
    }
    for expected in 1u32..=3 {
        let ack = tokio::time::timeout(WAIT, session.from_runner.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ack, expected.to_be_bytes().to_vec());
    }

    let kv = worker.await.unwrap();
    let inbox = kv
        .list(&actorhost::ListQuery::prefix("inbox"), false, None)
        .await
        .unwrap();
    let values: Vec<Vec<u8>> = inbox.into_iter().map(|(_, e)| e.value).collect();
    assert_eq!(values, vec![b"start".to_vec(), b"scale".to_vec(), b"stop".to_vec()]);

    runner.shutdown().await;
    assert_eq!(runner.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn runner_reconnects_after_plane_drops_session() {
    init_tracing();
    let (transport, mut sessions) = LoopbackTransport::new();
    let runner = RunnerConnection::new(
        runner_config(),
        Arc::new(TransportResolver::fixed(transport)),
        Arc::new(HelloHandshake),
    )
    .unwrap();
    let mut events = runner.subscribe();

    runner.connect().await.unwrap();
    let first = accept(&mut sessions).await;
    drop(first);

    // A new session arrives with a fresh handshake
    let mut second = accept(&mut sessions).await;

    let mut saw_backoff = false;
    while let Ok(event) = events.try_recv() {
        if let ConnectionEvent::State(ConnectionState::Backoff { attempt, .. }) = event {
            assert_eq!(attempt, 0);
            saw_backoff = true;
        }
    }
    assert!(saw_backoff);

    runner.frames().send(b"ping".to_vec()).await.unwrap();
    let frame = tokio::time::timeout(WAIT, second.from_runner.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(frame, b"ping".to_vec());

    tokio::time::timeout(WAIT, runner.shutdown()).await.unwrap();
    assert!(runner.is_shut_down());
}
