//! Decoding of the upstream's SSE-framed JSON-RPC responses.
//!
//! The Web Search Prime endpoint answers every POST with a text body framed
//! as server-sent events: only lines prefixed `data:` carry payload. These
//! helpers are deliberately pure so the scan logic can be tested without any
//! HTTP in the loop.

use serde_json::Value as JsonValue;

use crate::error::{ProxyError, Result};

/// Scan an SSE body and return the first `data:` line that parses as JSON.
///
/// Non-`data:` lines, empty payloads, and malformed JSON are all skipped
/// silently. Returns `None` when no line qualifies.
pub fn first_json_message(body: &str) -> Option<JsonValue> {
    for line in body.lines() {
        if let Some(payload) = line.strip_prefix("data:") {
            let payload = payload.trim();
            if payload.is_empty() {
                continue;
            }
            if let Ok(value) = serde_json::from_str(payload) {
                return Some(value);
            }
        }
    }
    None
}

/// Extract `result.content[0].text` from a decoded JSON-RPC message.
pub fn tool_result_text(message: &JsonValue) -> Option<&str> {
    message
        .get("result")?
        .get("content")?
        .get(0)?
        .get("text")?
        .as_str()
}

/// Decode the tool result text into JSON, handling double encoding.
///
/// The upstream sometimes returns the result list as a JSON string whose
/// value is itself JSON (quoted and with escaped inner quotes). When the text
/// is wrapped in quotes the outer pair is stripped and `\"` sequences are
/// unescaped before parsing; otherwise the text is parsed as-is.
pub fn decode_result_text(text: &str) -> Result<JsonValue> {
    if text.len() >= 2 && text.starts_with('"') && text.ends_with('"') {
        let unescaped = text[1..text.len() - 1].replace("\\\"", "\"");
        serde_json::from_str(&unescaped).map_err(ProxyError::from)
    } else {
        serde_json::from_str(text).map_err(ProxyError::from)
    }
}
