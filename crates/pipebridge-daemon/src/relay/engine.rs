//! The bridge event loop: verbatim forwarding plus shutdown orchestration.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use pipebridge_core::wire;

use crate::liveness;
use crate::session::{PeerFrame, PeerHandle, Session, SessionManager};
use crate::subprocess::{ChildEvent, ProcessSink};

use super::types::BridgeEvent;

/// Forwarding engine over the current session state.
///
/// `run` consumes the engine and returns the host exit code: the child's
/// own code on a natural exit, 1 on a subprocess stream error, 0 on a
/// signal-requested shutdown.
pub struct BridgeEngine<S: ProcessSink> {
    sink: S,
    sessions: SessionManager,
    probe_interval: Duration,
}

impl<S: ProcessSink> BridgeEngine<S> {
    pub fn new(sink: S, probe_interval: Duration) -> Self {
        Self {
            sink,
            sessions: SessionManager::new(),
            probe_interval,
        }
    }

    /// Drive the bridge until a terminal event, then tear down every peer
    /// connection and return the exit code for the host process.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<BridgeEvent>,
        mut child_events: mpsc::Receiver<ChildEvent>,
    ) -> i32 {
        loop {
            tokio::select! {
                Some(event) = events.recv() => match event {
                    BridgeEvent::PeerConnected(peer) => self.on_connect(peer),
                    BridgeEvent::PeerMessage { session_id, payload } => {
                        self.on_peer_message(session_id, &payload);
                    }
                    BridgeEvent::PeerDisconnected { session_id } => {
                        self.sessions.on_disconnect(session_id);
                    }
                    BridgeEvent::ShutdownRequested => {
                        info!("Termination signal received");
                        return self.shutdown(0);
                    }
                },
                Some(event) = child_events.recv() => match event {
                    ChildEvent::Output(payload) => self.on_child_output(&payload),
                    ChildEvent::Exited(code) => {
                        info!(code, "Subprocess exited, propagating exit code");
                        return self.shutdown(code);
                    }
                    ChildEvent::Failed(reason) => {
                        error!(%reason, "Subprocess failed");
                        return self.shutdown(1);
                    }
                },
                else => {
                    warn!("All event sources closed");
                    return self.shutdown(0);
                }
            }
        }
    }

    /// Install a new Active session, starting its liveness probe task.
    fn on_connect(&mut self, peer: PeerHandle) {
        info!(session_id = %peer.id(), "Peer connected");
        let probe = liveness::spawn_probe_task(peer.clone(), self.probe_interval);
        self.sessions.on_connect(Session::new(peer, Some(probe)));
    }

    /// Inbound: peer frame → child stdin, verbatim.
    fn on_peer_message(&mut self, session_id: Uuid, payload: &[u8]) {
        log_payload("peer->child", session_id, payload);
        if !self.sink.write(payload) {
            warn!(
                %session_id,
                len = payload.len(),
                "Child stdin not writable, dropping payload"
            );
        }
    }

    /// Outbound: child stdout chunk → Active peer, verbatim.
    ///
    /// Chunk boundaries are forwarded 1:1 as message frames with no
    /// reassembly, so a logical message spanning multiple chunks reaches
    /// the peer as multiple frames.
    fn on_child_output(&mut self, payload: &[u8]) {
        match self.sessions.current() {
            Some(session) if session.peer().is_open() => {
                log_payload("child->peer", session.id(), payload);
                if !session.peer().send(PeerFrame::Data(payload.to_vec())) {
                    warn!(
                        session_id = %session.id(),
                        len = payload.len(),
                        "Peer connection closed mid-send, dropping payload"
                    );
                }
            }
            _ => {
                warn!(len = payload.len(), "No active peer, dropping child output");
            }
        }
    }

    /// Tear down every open peer connection and yield the exit code.
    ///
    /// The caller closes the listening endpoint and terminates the child;
    /// both live outside the engine.
    fn shutdown(mut self, exit_code: i32) -> i32 {
        info!(exit_code, open = self.sessions.open_connections(), "Shutting down bridge");
        self.sessions.close_all();
        exit_code
    }
}

/// Best-effort diagnostic decode for the log line; decode failure logs the
/// payload as raw bytes and never affects forwarding.
fn log_payload(direction: &str, session_id: Uuid, payload: &[u8]) {
    match wire::summarize(payload) {
        Ok(summary) => {
            debug!(direction, %session_id, len = payload.len(), frame = %summary, "Forwarding");
        }
        Err(_) => {
            debug!(
                direction,
                %session_id,
                len = payload.len(),
                raw = %String::from_utf8_lossy(payload),
                "Forwarding opaque payload"
            );
        }
    }
}
