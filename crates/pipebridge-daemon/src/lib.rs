//! pipebridge Daemon Library
//!
//! Core functionality for the pipebridge daemon:
//! - Duplex handle to the single stdio subprocess
//! - Session management for the one active WebSocket peer
//! - Verbatim bidirectional forwarding between peer and subprocess
//! - Liveness probing and coordinated shutdown

pub mod liveness;
pub mod relay;
pub mod server;
pub mod session;
pub mod subprocess;
