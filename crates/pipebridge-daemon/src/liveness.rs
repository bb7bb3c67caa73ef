//! Per-session liveness probing.
//!
//! Each session gets one probe task that periodically pings the peer while
//! its connection stays open. The task exits the first time the connection
//! is found closed and is never restarted; the session's owner additionally
//! aborts the task handle on disconnect so the timer can never outlive the
//! session. Probe acknowledgments are logged by the connection reader and
//! cause no state change.

use std::time::Duration;

use tracing::debug;

use crate::session::{PeerFrame, PeerHandle};

/// Spawn the periodic probe task for one peer connection.
pub fn spawn_probe_task(
    peer: PeerHandle,
    interval: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.tick().await; // Skip first immediate tick

        loop {
            timer.tick().await;
            if !peer.is_open() {
                debug!(session_id = %peer.id(), "Connection closed, stopping liveness probes");
                return;
            }
            if peer.send(PeerFrame::Ping) {
                debug!(session_id = %peer.id(), "Liveness probe sent");
            } else {
                debug!(session_id = %peer.id(), "Probe send failed, stopping liveness probes");
                return;
            }
        }
    })
}
