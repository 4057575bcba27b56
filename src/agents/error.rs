//! Error types for the multi-agent debate system.

use thiserror::Error;

/// Errors that can occur during agent operations.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Error from the LLM provider.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Error parsing an LLM response.
    #[error("Failed to parse LLM response: {0}")]
    ResponseParse(String),

    /// Agent or orchestrator configuration error.
    #[error("Agent configuration error: {0}")]
    Configuration(String),

    /// Invalid orchestrator state for the requested operation.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Channel communication error.
    #[error("Channel communication failed: {0}")]
    Channel(String),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<crate::error::LlmError> for AgentError {
    fn from(err: crate::error::LlmError) -> Self {
        AgentError::Llm(err.to_string())
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for AgentError {
    fn from(err: tokio::sync::mpsc::error::SendError<T>) -> Self {
        AgentError::Channel(format!("Failed to send on channel: {err}"))
    }
}

/// Result type alias for agent operations.
pub type AgentResult<T> = Result<T, AgentError>;
