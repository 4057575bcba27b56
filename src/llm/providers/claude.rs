//! Anthropic Claude provider.
//!
//! Claude takes the system prompt out of band: the message list is split
//! into (system_prompt, [user/assistant] pairs) before hitting the
//! `/messages` endpoint.

use async_stream::try_stream;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::openai::build_http_client;
use crate::error::LlmError;
use crate::llm::client::{ChunkStream, CompletionParams, LlmClient, Message, Role};

const PROVIDER_NAME: &str = "claude";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Provider for the Anthropic messages API.
pub struct ClaudeProvider {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl ClaudeProvider {
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

    /// Splits a message list into the system prompt and the turn list.
    ///
    /// Claude accepts only user/assistant roles in the turn list; the
    /// last system message wins if several are present.
    pub(crate) fn split_messages(messages: &[Message]) -> (String, Vec<ClaudeMessage>) {
        let mut system_prompt = String::new();
        let mut turns = Vec::new();

        for msg in messages {
            match msg.role {
                Role::System => system_prompt = msg.content.clone(),
                Role::User | Role::Assistant => turns.push(ClaudeMessage {
                    role: msg.role.as_str().to_string(),
                    content: msg.content.clone(),
                }),
            }
        }

        (system_prompt, turns)
    }

    fn request_body(&self, messages: &[Message], params: &CompletionParams, stream: bool) -> ClaudeRequest {
        let (system, turns) = Self::split_messages(messages);
        ClaudeRequest {
            model: self.model.clone(),
            system,
            messages: turns,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
            stream,
        }
    }

    async fn post(&self, body: &ClaudeRequest) -> Result<reqwest::Response, LlmError> {
        let url = format!("{}/messages", self.base_url);
        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
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
            if code == 429 {
                return Err(LlmError::RateLimited {
                    provider: PROVIDER_NAME.to_string(),
                    model: self.model.clone(),
                    message,
                });
            }
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
impl LlmClient for ClaudeProvider {
    fn provider_name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn complete(
        &self,
        messages: &[Message],
        params: &CompletionParams,
    ) -> Result<String, LlmError> {
        let body = self.request_body(messages, params, false);
        let response = self.post(&body).await?;

        let parsed: ClaudeResponse = response
            .json()
            .await
            .map_err(|e| LlmError::parse(PROVIDER_NAME, &self.model, e.to_string()))?;

        parsed
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .map(|block| block.text)
            .ok_or_else(|| LlmError::parse(PROVIDER_NAME, &self.model, "response contained no text block"))
    }

    async fn complete_stream(
        &self,
        messages: &[Message],
        params: &CompletionParams,
    ) -> Result<ChunkStream, LlmError> {
        let body = self.request_body(messages, params, true);
        let response = self.post(&body).await?;

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

                    let event: StreamEvent = serde_json::from_str(data).map_err(|e| {
                        LlmError::parse(PROVIDER_NAME, &model, format!("bad stream event: {e}"))
                    })?;
                    if event.kind == "content_block_delta" {
                        if let Some(text) = event.delta.and_then(|d| d.text) {
                            if !text.is_empty() {
                                yield text;
                            }
                        }
                    }
                }
            }
        };

        Ok(Box::pin(stream))
    }
}

#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    system: String,
    messages: Vec<ClaudeMessage>,
    temperature: f64,
    max_tokens: u32,
    stream: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct ClaudeMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct StreamEvent {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_messages() {
        let (system, turns) = ClaudeProvider::split_messages(&[
            Message::system("you are helpful"),
            Message::user("hello"),
            Message::assistant("hi"),
        ]);
        assert_eq!(system, "you are helpful");
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[0].role, "user");
        assert_eq!(turns[1].role, "assistant");
    }

    #[test]
    fn test_system_omitted_when_empty() {
        let provider = ClaudeProvider::new("k", "http://localhost", "claude-3-sonnet");
        let body = provider.request_body(&[Message::user("q")], &CompletionParams::default(), false);
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("system").is_none());
    }
}
