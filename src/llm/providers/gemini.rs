//! Google Gemini provider.
//!
//! Gemini receives a single flattened prompt: the message list is joined
//! into role-prefixed lines rather than sent as structured turns.

use async_stream::try_stream;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::openai::build_http_client;
use crate::error::LlmError;
use crate::llm::client::{ChunkStream, CompletionParams, LlmClient, Message, Role};

const PROVIDER_NAME: &str = "gemini";

/// Provider for the Gemini generateContent API.
pub struct GeminiProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiProvider {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self::with_http_client(build_http_client(), api_key, base_url, model)
    }

    /// Creates a provider over an already-built (pooled) HTTP client.
    pub fn with_http_client(
        client: Client,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
            model: model.into(),
        }
    }

    /// Flattens a message list into a single role-prefixed prompt.
    pub(crate) fn flatten_messages(messages: &[Message]) -> String {
        messages
            .iter()
            .map(|msg| match msg.role {
                Role::System => format!("System instruction: {}", msg.content),
                Role::Assistant => format!("Assistant: {}", msg.content),
                Role::User => format!("User: {}", msg.content),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    fn request_body(&self, messages: &[Message], params: &CompletionParams) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: Self::flatten_messages(messages),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                max_output_tokens: params.max_tokens,
            },
        }
    }

    async fn post(&self, url: &str, body: &GeminiRequest) -> Result<reqwest::Response, LlmError> {
        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| LlmError::request(PROVIDER_NAME, &self.model, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let code = status.as_u16();
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());
            return Err(LlmError::ApiError {
                provider: PROVIDER_NAME.to_string(),
                model: self.model.clone(),
                code,
                message,
            });
        }

        Ok(response)
    }
}

#[async_trait::async_trait]
impl LlmClient for GeminiProvider {
    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn complete(
        &self,
        messages: &[Message],
        params: &CompletionParams,
    ) -> Result<String, LlmError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = self.request_body(messages, params);
        let response = self.post(&url, &body).await?;

        let parsed: GeminiResponse = response
            .json()
            .await
            .map_err(|e| LlmError::parse(PROVIDER_NAME, &self.model, e.to_string()))?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| LlmError::parse(PROVIDER_NAME, &self.model, "response contained no candidates"))
    }

    async fn complete_stream(
        &self,
        messages: &[Message],
        params: &CompletionParams,
    ) -> Result<ChunkStream, LlmError> {
        let url = format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            self.base_url, self.model
        );
        let body = self.request_body(messages, params);
        let response = self.post(&url, &body).await?;

        let model = self.model.clone();
        let stream = try_stream! {
            let mut bytes = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = chunk.map_err(|e| LlmError::StreamInterrupted {
                    provider: PROVIDER_NAME.to_string(),
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
                    if data.is_empty() {
                        continue;
                    }

                    let parsed: GeminiResponse = serde_json::from_str(data).map_err(|e| {
                        LlmError::parse(PROVIDER_NAME, &model, format!("bad stream chunk: {e}"))
                    })?;
                    if let Some(text) = parsed
                        .candidates
                        .into_iter()
                        .next()
                        .and_then(|c| c.content.parts.into_iter().next())
                        .map(|p| p.text)
                    {
                        if !text.is_empty() {
                            yield text;
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_messages() {
        let flat = GeminiProvider::flatten_messages(&[
            Message::system("you are helpful"),
            Message::user("hello"),
            Message::assistant("hi there"),
        ]);
        assert!(flat.contains("System instruction: you are helpful"));
        assert!(flat.contains("User: hello"));
        assert!(flat.contains("Assistant: hi there"));
    }
}
