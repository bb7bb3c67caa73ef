//! Subprocess ownership and stdio plumbing.
//!
//! Spawns the single bridged child process once, owns it for the whole
//! daemon lifetime, and exposes its duplex stream as a writable sink plus a
//! readable chunk source with exit/error notification.

mod handle;

pub use handle::{ChildEvent, ChildHandle, ChildSink, SpawnConfig, SubprocessError};

/// Writable sink for payloads destined to the child's stdin.
///
/// The forwarding engine only depends on this capability, so tests can
/// substitute a double that does not spawn a real process.
pub trait ProcessSink: Send {
    /// Write a payload verbatim, fire-and-forget.
    ///
    /// Returns `false` when the sink is not currently writable. The caller
    /// drops the payload in that case; it is never queued for retry.
    fn write(&self, payload: &[u8]) -> bool;
}
