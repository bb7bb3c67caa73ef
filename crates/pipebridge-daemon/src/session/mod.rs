//! Session management for the single active peer.
//!
//! The manager owns every `Session` and enforces the central invariant:
//! at most one session is Active at any instant. A new connection evicts
//! the previous peer; a stale disconnect from an evicted session never
//! touches the newer one.

mod manager;
mod types;

pub use manager::SessionManager;
pub use types::{PeerFrame, PeerHandle, Session};
