//! Error types for debate-forge operations.
//!
//! Defines error types for the major subsystems:
//! - Configuration and ingress validation
//! - LLM provider interactions
//! - Record sink persistence

use thiserror::Error;

/// Errors that can occur during configuration and setup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing API key for provider '{0}': set the {1} environment variable")]
    MissingApiKey(String, String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Invalid value for '{field}': {reason}")]
    Validation { field: String, reason: String },
}

impl ConfigError {
    /// Creates a validation error for a named ingress field.
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

/// Errors that can occur during LLM operations.
///
/// Failures carry the provider and model so the caller can report where
/// the request went. The facade never retries; the caller decides.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("[{provider}/{model}] request failed: {message}")]
    RequestFailed {
        provider: String,
        model: String,
        message: String,
    },

    #[error("[{provider}/{model}] failed to parse response: {message}")]
    ParseError {
        provider: String,
        model: String,
        message: String,
    },

    #[error("[{provider}/{model}] rate limited: {message}")]
    RateLimited {
        provider: String,
        model: String,
        message: String,
    },

    #[error("[{provider}/{model}] API error ({code}): {message}")]
    ApiError {
        provider: String,
        model: String,
        code: u16,
        message: String,
    },

    #[error("[{provider}/{model}] stream interrupted: {message}")]
    StreamInterrupted {
        provider: String,
        model: String,
        message: String,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LlmError {
    /// Creates a request failure tagged with provider and model.
    pub fn request(provider: &str, model: &str, message: impl Into<String>) -> Self {
        LlmError::RequestFailed {
            provider: provider.to_string(),
            model: model.to_string(),
            message: message.into(),
        }
    }

    /// Creates a parse failure tagged with provider and model.
    pub fn parse(provider: &str, model: &str, message: impl Into<String>) -> Self {
        LlmError::ParseError {
            provider: provider.to_string(),
            model: model.to_string(),
            message: message.into(),
        }
    }
}

/// Errors that can occur while writing to a record sink.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Sink write failed after retry: {0}")]
    WriteFailed(String),
}
