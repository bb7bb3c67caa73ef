#![cfg(unix)]
#![allow(clippy::unwrap_used)] // Integration tests use unwrap for brevity

//! End-to-end tests over a real listening endpoint and a real subprocess.
//!
//! Uses `cat` as the bridged child: every inbound frame comes straight
//! back as an outbound frame.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;

use pipebridge_daemon::relay::{BridgeEngine, BridgeEvent};
use pipebridge_daemon::server;
use pipebridge_daemon::subprocess::{ChildHandle, SpawnConfig};

struct Bridge {
    addr: SocketAddr,
    run: tokio::task::JoinHandle<i32>,
    server: tokio::task::JoinHandle<()>,
    child: ChildHandle,
}

async fn start_bridge(program: &str, args: &[&str]) -> Bridge {
    let (child, child_events) = ChildHandle::spawn(SpawnConfig {
        program: program.to_string(),
        args: args.iter().map(ToString::to_string).collect(),
        terminate_timeout: Duration::from_secs(2),
    })
    .unwrap();

    let (event_tx, event_rx) = mpsc::channel::<BridgeEvent>(64);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(server::run(listener, event_tx));

    let engine = BridgeEngine::new(child.sink(), Duration::from_secs(30));
    let run = tokio::spawn(engine.run(event_rx, child_events));

    Bridge {
        addr,
        run,
        server,
        child,
    }
}

async fn stop(bridge: Bridge) {
    bridge.server.abort();
    bridge.run.abort();
    bridge.child.terminate().await;
}

#[tokio::test]
async fn peer_payload_roundtrips_through_the_child() {
    let bridge = start_bridge("cat", &[]).await;
    let (mut ws, _) = connect_async(format!("ws://{}", bridge.addr))
        .await
        .unwrap();

    ws.send(Message::Binary(b"{\"id\":1,\"method\":\"ping\"}\n".to_vec()))
        .await
        .unwrap();

    let mut echoed = Vec::new();
    while echoed.len() < 25 {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Message::Binary(chunk) = msg {
            echoed.extend_from_slice(&chunk);
        }
    }
    assert_eq!(echoed, b"{\"id\":1,\"method\":\"ping\"}\n");

    stop(bridge).await;
}

#[tokio::test]
async fn second_peer_evicts_the_first() {
    let bridge = start_bridge("cat", &[]).await;
    let (mut first, _) = connect_async(format!("ws://{}", bridge.addr))
        .await
        .unwrap();
    let (mut second, _) = connect_async(format!("ws://{}", bridge.addr))
        .await
        .unwrap();

    // The first connection is closed by the bridge.
    let evicted = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match first.next().await {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return true,
                Some(Ok(_)) => {}
            }
        }
    })
    .await
    .unwrap();
    assert!(evicted);

    // Output now flows only to the second peer.
    second
        .send(Message::Binary(b"hello\n".to_vec()))
        .await
        .unwrap();
    let mut echoed = Vec::new();
    while echoed.len() < 6 {
        let msg = tokio::time::timeout(Duration::from_secs(5), second.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Message::Binary(chunk) = msg {
            echoed.extend_from_slice(&chunk);
        }
    }
    assert_eq!(echoed, b"hello\n");

    stop(bridge).await;
}

#[tokio::test]
async fn child_exit_code_reaches_the_engine() {
    let bridge = start_bridge("sh", &["-c", "exit 5"]).await;
    let code = tokio::time::timeout(Duration::from_secs(5), bridge.run)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(code, 5);

    bridge.server.abort();
    bridge.child.terminate().await;
}

#[tokio::test]
async fn text_frames_are_forwarded_as_bytes() {
    let bridge = start_bridge("cat", &[]).await;
    let (mut ws, _) = connect_async(format!("ws://{}", bridge.addr))
        .await
        .unwrap();

    ws.send(Message::Text("plain text line\n".to_string()))
        .await
        .unwrap();

    let mut echoed = Vec::new();
    while echoed.len() < 16 {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .unwrap()
            .unwrap()
            .unwrap();
        if let Message::Binary(chunk) = msg {
            echoed.extend_from_slice(&chunk);
        }
    }
    assert_eq!(echoed, b"plain text line\n");

    stop(bridge).await;
}
