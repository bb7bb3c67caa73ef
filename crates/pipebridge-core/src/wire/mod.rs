//! Diagnostic decoder for the child's line-oriented message protocol.
//!
//! The bridge forwards payloads verbatim and never depends on their
//! structure; this module only extracts a short summary of JSON-RPC-shaped
//! frames for log lines, implementing a tolerant reader pattern. A payload
//! that does not decode is logged as opaque bytes — never an error.

mod parser;
mod types;

pub use parser::summarize;
pub use types::{FrameKind, FrameSummary};
