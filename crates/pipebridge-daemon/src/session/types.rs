//! Peer connection and session types.

use tokio::sync::mpsc;
use uuid::Uuid;

/// Frame queued for delivery to a connected peer.
#[derive(Debug, PartialEq, Eq)]
pub enum PeerFrame {
    /// One outbound message frame, byte-for-byte as produced by the child.
    Data(Vec<u8>),
    /// Liveness probe.
    Ping,
    /// Close the connection.
    Close,
}

/// Cheap handle to one peer connection's outbound half.
///
/// The connection's writer task holds the receiving end; when that task
/// ends the handle reports itself closed and sends become no-ops.
#[derive(Debug, Clone)]
pub struct PeerHandle {
    id: Uuid,
    frame_tx: mpsc::UnboundedSender<PeerFrame>,
}

impl PeerHandle {
    pub const fn new(id: Uuid, frame_tx: mpsc::UnboundedSender<PeerFrame>) -> Self {
        Self { id, frame_tx }
    }

    /// Session identifier this connection belongs to.
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Whether the connection is still open for writing.
    pub fn is_open(&self) -> bool {
        !self.frame_tx.is_closed()
    }

    /// Queue a frame, fire-and-forget. Returns `false` when the connection
    /// is no longer open; the frame is dropped in that case.
    pub fn send(&self, frame: PeerFrame) -> bool {
        self.frame_tx.send(frame).is_ok()
    }

    /// Ask the connection to close.
    pub fn close(&self) {
        self.frame_tx.send(PeerFrame::Close).ok();
    }
}

/// One connected peer: its connection handle plus its liveness-timer handle.
///
/// Owned exclusively by the [`SessionManager`](super::SessionManager); a
/// session is Active exactly while the manager holds it as current.
#[derive(Debug)]
pub struct Session {
    peer: PeerHandle,
    liveness: Option<tokio::task::JoinHandle<()>>,
}

impl Session {
    pub const fn new(peer: PeerHandle, liveness: Option<tokio::task::JoinHandle<()>>) -> Self {
        Self { peer, liveness }
    }

    pub const fn id(&self) -> Uuid {
        self.peer.id()
    }

    pub const fn peer(&self) -> &PeerHandle {
        &self.peer
    }

    /// Close the connection and cancel the liveness timer.
    ///
    /// The timer is aborted explicitly; it must not outlive the session
    /// even when the connection closed without the probe task noticing.
    pub fn close(&mut self) {
        self.peer.close();
        if let Some(liveness) = self.liveness.take() {
            liveness.abort();
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(liveness) = self.liveness.take() {
            liveness.abort();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn close_signals_the_peer_and_cancels_the_timer() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let timer = tokio::spawn(std::future::pending::<()>());
        let aborted = timer.abort_handle();
        let mut session = Session::new(PeerHandle::new(Uuid::new_v4(), tx), Some(timer));

        session.close();

        assert_eq!(rx.try_recv().unwrap(), PeerFrame::Close);
        tokio::task::yield_now().await;
        assert!(aborted.is_finished());
    }

    #[tokio::test]
    async fn close_is_idempotent() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut session = Session::new(PeerHandle::new(Uuid::new_v4(), tx), None);

        session.close();
        session.close();

        assert_eq!(rx.try_recv().unwrap(), PeerFrame::Close);
        assert_eq!(rx.try_recv().unwrap(), PeerFrame::Close);
        assert!(rx.try_recv().is_err());
    }
}
