//! Session manager: at-most-one-active arbitration.

use std::collections::HashMap;

use tracing::{debug, info};
use uuid::Uuid;

use super::types::{PeerHandle, Session};

/// Tracks the single Active session plus every connection that is still
/// open (an evicted peer lingers until its own disconnect event arrives).
#[derive(Debug, Default)]
pub struct SessionManager {
    active: Option<Session>,
    connections: HashMap<Uuid, PeerHandle>,
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new Active session, evicting the previous peer if present.
    ///
    /// The evicted session's connection is closed, which triggers its own
    /// disconnect path; its liveness timer is cancelled here, not there.
    pub fn on_connect(&mut self, session: Session) {
        if let Some(mut prior) = self.active.take() {
            info!(evicted = %prior.id(), replacement = %session.id(), "Evicting active peer");
            prior.close();
        }
        self.connections
            .insert(session.id(), session.peer().clone());
        self.active = Some(session);
    }

    /// Handle a disconnect event for `id`.
    ///
    /// Clears the Active session only when `id` matches it; a delayed
    /// disconnect from an already-evicted session must not affect the
    /// session installed after it.
    pub fn on_disconnect(&mut self, id: Uuid) {
        self.connections.remove(&id);
        match &self.active {
            Some(session) if session.id() == id => {
                if let Some(mut session) = self.active.take() {
                    session.close();
                }
                info!(%id, "Active peer disconnected");
            }
            _ => {
                debug!(%id, "Disconnect from non-active session, ignoring");
            }
        }
    }

    /// The currently Active session, if any. Pure read.
    pub const fn current(&self) -> Option<&Session> {
        self.active.as_ref()
    }

    /// Number of connections still open (Active plus lingering evicted).
    pub fn open_connections(&self) -> usize {
        self.connections.len()
    }

    /// Close every open connection, not just the Active one.
    ///
    /// Used by shutdown so lingering evicted peers are torn down too.
    pub fn close_all(&mut self) {
        if let Some(mut session) = self.active.take() {
            session.close();
        }
        for (id, peer) in self.connections.drain() {
            debug!(%id, "Closing peer connection");
            peer.close();
        }
    }
}
