//! OpenAI-compatible chat-completion provider.
//!
//! Speaks the `/chat/completions` wire protocol used by both OpenAI and
//! DeepSeek. Streaming uses the server-sent `data:` chunk framing with a
//! terminal `[DONE]` sentinel.

use std::time::Duration;

use async_stream::try_stream;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::llm::client::{ChunkStream, CompletionParams, LlmClient, Message};

/// Connect timeout for provider requests.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Total request timeout (dominated by read).
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Idle pool timeout.
const POOL_IDLE_TIMEOUT_SECS: u64 = 10;

/// Builds the shared HTTP client used by all wire providers.
pub(crate) fn build_http_client() -> Client {
    Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .pool_idle_timeout(Duration::from_secs(POOL_IDLE_TIMEOUT_SECS))
        .build()
        .expect("Failed to build HTTP client - system TLS configuration error")
}

/// Provider for OpenAI-compatible chat-completion APIs.
pub struct OpenAiCompatProvider {
    client: Client,
    provider_name: String,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiCompatProvider {
    /// Creates a provider for any OpenAI-compatible endpoint.
    ///
    /// `provider_name` tags errors ("openai", "deepseek", ...).
    pub fn new(
        provider_name: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self::with_http_client(build_http_client(), provider_name, api_key, base_url, model)
    }

    /// Creates a provider over an already-built (pooled) HTTP client.
    pub fn with_http_client(
        client: Client,
        provider_name: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            provider_name: provider_name.into(),
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    fn request_body(&self, messages: &[Message], params: &CompletionParams, stream: bool) -> ApiRequest {
        ApiRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            temperature: Some(params.temperature),
            max_tokens: Some(params.max_tokens),
            stream,
        }
    }

    async fn post(&self, body: &ApiRequest) -> Result<reqwest::Response, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::request(&self.provider_name, &self.model, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());

            if let Ok(parsed) = serde_json::from_str::<ApiErrorResponse>(&error_text) {
                if code == 429 {
                    return Err(LlmError::RateLimited {
                        provider: self.provider_name.clone(),
                        model: self.model.clone(),
                        message: parsed.error.message,
                    });
                }
                return Err(LlmError::ApiError {
                    provider: self.provider_name.clone(),
                    model: self.model.clone(),
                    code,
                    message: parsed.error.message,
                });
            }

            return Err(LlmError::ApiError {
                provider: self.provider_name.clone(),
                model: self.model.clone(),
                code,
                message: error_text,
            });
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl LlmClient for OpenAiCompatProvider {
    fn provider_name(&self) -> &str {
        &self.provider_name
    }

    async fn complete(
        &self,
        messages: &[Message],
        params: &CompletionParams,
    ) -> Result<String, LlmError> {
        let body = self.request_body(messages, params, false);
        let response = self.post(&body).await?;

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::parse(&self.provider_name, &self.model, e.to_string()))?;

        api_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                LlmError::parse(&self.provider_name, &self.model, "response contained no choices")
            })
    }

    async fn complete_stream(
        &self,
        messages: &[Message],
        params: &CompletionParams,
    ) -> Result<ChunkStream, LlmError> {
        let body = self.request_body(messages, params, true);
        let response = self.post(&body).await?;

        let provider = self.provider_name.clone();
        let model = self.model.clone();

        let stream = try_stream! {
            let mut bytes = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(|e| LlmError::StreamInterrupted {
                    provider: provider.clone(),
                    model: model.clone(),
                    message: e.to_string(),
                })?;
                buffer.push_str(&String::from_utf8_lossy(&chunk));

                while let Some(newline) = buffer.find('\n') {
                    let line = buffer[..newline].trim().to_string();
                    buffer.drain(..=newline);

                    let Some(data) = line.strip_prefix("data:") else {
                        continue;
                    };
                    let data = data.trim();
                    if data.is_empty() || data == "[DONE]" {
                        continue;
                    }

                    let delta: StreamChunk = serde_json::from_str(data).map_err(|e| {
                        LlmError::parse(&provider, &model, format!("bad stream chunk: {e}"))
                    })?;
                    if let Some(content) = delta
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.delta.content)
                    {
                        if !content.is_empty() {
                            yield content;
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

/// Internal request structure for the OpenAI-compatible API.
#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

/// Internal response structure from the OpenAI-compatible API.
#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    content: String,
}

/// Streaming chunk from the OpenAI-compatible API.
#[derive(Debug, Deserialize)]
struct StreamChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

/// Error response from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}
