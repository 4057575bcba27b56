//! Server-sent event framing helpers.
//!
//! The transport layer (out of the core's hands) serves the event
//! stream; these helpers keep the wire format and headers consistent
//! wherever it lives.

use serde::Serialize;

/// Response headers every SSE endpoint must send.
pub const SSE_HEADERS: [(&str, &str); 3] = [
    ("Cache-Control", "no-cache"),
    ("Connection", "keep-alive"),
    ("X-Accel-Buffering", "no"),
];

/// The SSE content type.
pub const SSE_CONTENT_TYPE: &str = "text/event-stream";

/// Frames one event payload: `data: {json}\n\n`.
pub fn sse_event<T: Serialize>(payload: &T) -> String {
    let json = serde_json::to_string(payload).unwrap_or_else(|_| "null".to_string());
    format!("data: {json}\n\n")
}
