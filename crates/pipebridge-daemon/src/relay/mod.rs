//! Forwarding engine and lifecycle control.
//!
//! One event-loop task owns all shared mutable state (the session manager,
//! the child sink) and handles every callback — connection accept, message
//! arrival, child output, child exit, signals — to completion one at a time,
//! delivered as messages over an mpsc channel.

mod engine;
mod types;

pub use engine::BridgeEngine;
pub use types::BridgeEvent;
