//! Connection reuse for wire providers.
//!
//! One HTTP client is kept per (provider, key-prefix, base-url) triple
//! and shared by every session that talks to the same endpoint. The pool
//! is process-global and immutable after first use per key; `obtain` is
//! idempotent.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::config::{ProviderKind, ProviderSettings};
use crate::error::ConfigError;
use crate::llm::client::LlmClient;
use crate::llm::providers::claude::ClaudeProvider;
use crate::llm::providers::gemini::GeminiProvider;
use crate::llm::providers::mock::MockProvider;
use crate::llm::providers::openai::{build_http_client, OpenAiCompatProvider};

/// Pool key: provider name, first 8 chars of the API key, base URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct PoolKey {
    provider: &'static str,
    key_prefix: String,
    base_url: String,
}

fn pool() -> &'static Mutex<HashMap<PoolKey, reqwest::Client>> {
    static POOL: OnceLock<Mutex<HashMap<PoolKey, reqwest::Client>>> = OnceLock::new();
    POOL.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Returns the shared HTTP client for a (provider, key, base-url) triple.
fn http_client_for(provider: ProviderKind, api_key: &str, base_url: &str) -> reqwest::Client {
    let key = PoolKey {
        provider: provider.as_str(),
        key_prefix: api_key.chars().take(8).collect(),
        base_url: base_url.to_string(),
    };

    let mut guard = pool().lock().expect("client pool lock not poisoned");
    guard.entry(key).or_insert_with(build_http_client).clone()
}

/// Builds an [`LlmClient`] for the given settings, reusing pooled HTTP
/// connections for wire providers.
pub fn build_client(
    settings: &ProviderSettings,
    model: &str,
    seed: Option<u64>,
) -> Result<Arc<dyn LlmClient>, ConfigError> {
    let provider = settings.provider;
    if provider == ProviderKind::Mock {
        return Ok(Arc::new(MockProvider::new(model, seed)));
    }

    let api_key = settings.api_key.clone().ok_or_else(|| {
        ConfigError::MissingApiKey(
            provider.as_str().to_string(),
            provider.api_key_env().to_string(),
        )
    })?;
    let http = http_client_for(provider, &api_key, &settings.base_url);

    let client: Arc<dyn LlmClient> = match provider {
        ProviderKind::DeepSeek | ProviderKind::OpenAi => Arc::new(
            OpenAiCompatProvider::with_http_client(
                http,
                provider.as_str(),
                api_key,
                settings.base_url.clone(),
                model,
            ),
        ),
        ProviderKind::Gemini => Arc::new(GeminiProvider::with_http_client(
            http,
            api_key,
            settings.base_url.clone(),
            model,
        )),
        ProviderKind::Claude => Arc::new(ClaudeProvider::with_http_client(
            http,
            api_key,
            settings.base_url.clone(),
            model,
        )),
        ProviderKind::Mock => unreachable!("mock handled above"),
    };

    Ok(client)
}
