//! Shared helpers: SSE framing and small text utilities.

pub mod sse;
pub mod text;

pub use sse::{sse_event, SSE_CONTENT_TYPE, SSE_HEADERS};
pub use text::{strip_fence_wrapper, truncate_chars};
