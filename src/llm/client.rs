//! Uniform request surface over heterogeneous LLM providers.
//!
//! Every provider exposes two operations: a non-streaming completion and
//! a chunked streaming completion. Callers never see provider wire
//! formats, only the message list and sampling parameters.

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// Role of a chat message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A message in a conversation with an LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Sampling parameters for a completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionParams {
    /// Sampling temperature (0.0 - 2.0). Higher values = more random.
    pub temperature: f64,
    /// Maximum number of tokens to generate.
    pub max_tokens: u32,
    /// Optional seed for reproducible providers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for CompletionParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 2000,
            seed: None,
        }
    }
}

impl CompletionParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the temperature, clamped to the valid range.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    /// Set the max tokens. Values below 1 are raised to 1.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens.max(1);
        self
    }

    /// Set the reproducibility seed.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}

/// A lazy sequence of text chunks from a streaming completion.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, LlmError>> + Send>>;

/// Trait for LLM providers that can generate text.
///
/// Implementations must not retry internally; failures surface to the
/// caller with provider and model attached.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Provider name used in error tags and pool keys.
    fn provider_name(&self) -> &str;

    /// Generate the full completion for the given messages.
    async fn complete(
        &self,
        messages: &[Message],
        params: &CompletionParams,
    ) -> Result<String, LlmError>;

    /// Generate a completion as a stream of text chunks.
    async fn complete_stream(
        &self,
        messages: &[Message],
        params: &CompletionParams,
    ) -> Result<ChunkStream, LlmError>;
}
