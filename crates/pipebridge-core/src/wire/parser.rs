//! Tolerant summarizer for JSON-RPC-shaped payloads.

use serde_json::Value;

use super::types::{FrameKind, FrameSummary};
use crate::error::{Error, Result};

/// Summarize a raw payload for diagnostic logging.
///
/// Returns an error when the payload is not a JSON object; callers log the
/// payload as opaque bytes in that case and forward it unchanged.
pub fn summarize(payload: &[u8]) -> Result<FrameSummary> {
    let raw: Value = serde_json::from_slice(payload)?;
    summarize_value(&raw)
}

fn summarize_value(raw: &Value) -> Result<FrameSummary> {
    let obj = raw
        .as_object()
        .ok_or_else(|| Error::WireDecode("frame is not a JSON object".into()))?;

    let method = obj.get("method").and_then(|v| v.as_str()).map(String::from);
    let id = obj.get("id").map(id_to_string);

    let kind = match (&method, &id) {
        (Some(_), Some(_)) => FrameKind::Request,
        (Some(_), None) => FrameKind::Notification,
        (None, Some(_)) if obj.contains_key("result") || obj.contains_key("error") => {
            FrameKind::Response
        }
        _ => FrameKind::Unknown,
    };

    Ok(FrameSummary { kind, method, id })
}

/// Render a JSON-RPC id (string or number) as a plain string for logging.
fn id_to_string(id: &Value) -> String {
    match id {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
