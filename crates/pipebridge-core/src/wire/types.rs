//! Summary types for diagnostically-decoded wire frames.

use std::fmt;

/// What kind of JSON-RPC-shaped frame a payload looks like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameKind {
    /// Has a method and an id.
    Request,
    /// Has an id but no method (result or error).
    Response,
    /// Has a method but no id.
    Notification,
    /// Valid JSON, but none of the above shapes.
    Unknown,
}

/// Diagnostic summary of a single forwarded payload.
///
/// Only used for log lines; forwarding never consults this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSummary {
    pub kind: FrameKind,
    pub method: Option<String>,
    pub id: Option<String>,
}

impl fmt::Display for FrameSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.method, &self.id) {
            (Some(method), Some(id)) => write!(f, "{:?} method={method} id={id}", self.kind),
            (Some(method), None) => write!(f, "{:?} method={method}", self.kind),
            (None, Some(id)) => write!(f, "{:?} id={id}", self.kind),
            (None, None) => write!(f, "{:?}", self.kind),
        }
    }
}
