//! Events delivered to the bridge event loop.

use uuid::Uuid;

use crate::session::PeerHandle;

/// Everything the event loop reacts to, other than child process events
/// (those arrive on the subprocess handle's own channel).
#[derive(Debug)]
pub enum BridgeEvent {
    /// A peer completed the handshake and becomes the Active session.
    PeerConnected(PeerHandle),
    /// One message frame arrived from a connected peer.
    PeerMessage { session_id: Uuid, payload: Vec<u8> },
    /// A peer's connection closed (its reader task ended).
    PeerDisconnected { session_id: Uuid },
    /// A termination signal asked for graceful shutdown.
    ShutdownRequested,
}
