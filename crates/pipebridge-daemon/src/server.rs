//! WebSocket listening endpoint.
//!
//! Accepts one logical peer at a time: every accepted connection is handed
//! to the event loop, which evicts the previous peer. Each connection gets
//! a reader half (feeding events) and a writer task (draining the frames
//! queued by the engine and the liveness monitor).

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::relay::BridgeEvent;
use crate::session::{PeerFrame, PeerHandle};

/// Accept loop. Runs until the listener task is aborted during shutdown.
pub async fn run(listener: TcpListener, event_tx: mpsc::Sender<BridgeEvent>) {
    loop {
        match listener.accept().await {
            Ok((stream, peer_addr)) => {
                debug!(%peer_addr, "Incoming connection");
                tokio::spawn(handle_connection(stream, event_tx.clone()));
            }
            Err(e) => {
                warn!(error = %e, "Failed to accept connection");
            }
        }
    }
}

/// Drive one peer connection from handshake to disconnect.
async fn handle_connection(stream: TcpStream, event_tx: mpsc::Sender<BridgeEvent>) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!(error = %e, "WebSocket handshake failed");
            return;
        }
    };

    let session_id = Uuid::new_v4();
    let (frame_tx, mut frame_rx) = mpsc::unbounded_channel::<PeerFrame>();
    let peer = PeerHandle::new(session_id, frame_tx);
    if event_tx
        .send(BridgeEvent::PeerConnected(peer))
        .await
        .is_err()
    {
        return;
    }

    let (mut ws_sink, mut ws_stream) = ws.split();

    // Writer: drains frames queued by the engine and the liveness monitor.
    // Ends when asked to close or when the peer stops accepting writes;
    // dropping the receiver is what flips the handle to "not open".
    let writer = tokio::spawn(async move {
        while let Some(frame) = frame_rx.recv().await {
            let result = match frame {
                PeerFrame::Data(payload) => ws_sink.send(Message::Binary(payload)).await,
                PeerFrame::Ping => ws_sink.send(Message::Ping(Vec::new())).await,
                PeerFrame::Close => {
                    ws_sink.send(Message::Close(None)).await.ok();
                    break;
                }
            };
            if let Err(e) = result {
                debug!(%session_id, error = %e, "Peer write failed");
                break;
            }
        }
        debug!(%session_id, "Peer writer finished");
    });

    // Reader: every Binary/Text frame is one inbound message; Pong is the
    // liveness acknowledgment, logged only.
    while let Some(msg) = ws_stream.next().await {
        match msg {
            Ok(Message::Binary(payload)) => {
                if event_tx
                    .send(BridgeEvent::PeerMessage {
                        session_id,
                        payload,
                    })
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Ok(Message::Text(text)) => {
                if event_tx
                    .send(BridgeEvent::PeerMessage {
                        session_id,
                        payload: text.into_bytes(),
                    })
                    .await
                    .is_err()
                {
                    break;
                }
            }
            Ok(Message::Pong(_)) => {
                debug!(%session_id, "Liveness acknowledgment from peer");
            }
            Ok(Message::Ping(_)) => {
                // tungstenite queues the matching pong automatically.
                debug!(%session_id, "Ping from peer");
            }
            Ok(Message::Close(_)) => {
                info!(%session_id, "Peer sent close");
                break;
            }
            Ok(Message::Frame(_)) => {}
            Err(e) => {
                warn!(%session_id, error = %e, "Peer connection error");
                break;
            }
        }
    }

    event_tx
        .send(BridgeEvent::PeerDisconnected { session_id })
        .await
        .ok();
    writer.abort();
    debug!(%session_id, "Peer connection finished");
}
