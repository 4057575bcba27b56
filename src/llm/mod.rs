//! LLM integration for debate-forge.
//!
//! This module is the only place the rest of the crate touches language
//! models. It exposes a uniform facade (`LlmClient`) over heterogeneous
//! providers, a process-global connection pool, and a coarse cost
//! estimator.
//!
//! ```ignore
//! use debate_forge::config::{ProviderKind, ProviderSettings};
//! use debate_forge::llm::{build_client, CompletionParams, Message};
//!
//! let settings = ProviderSettings::from_env(ProviderKind::DeepSeek)?;
//! let client = build_client(&settings, "deepseek-chat", None)?;
//! let reply = client
//!     .complete(&[Message::user("hello")], &CompletionParams::default())
//!     .await?;
//! ```

pub mod client;
pub mod cost;
pub mod pool;
pub mod providers;

pub use client::{ChunkStream, CompletionParams, LlmClient, Message, Role};
pub use cost::{estimate_cost, estimate_tokens, CostEstimate, Pricing};
pub use pool::build_client;
pub use providers::{ClaudeProvider, GeminiProvider, MockProvider, OpenAiCompatProvider};
