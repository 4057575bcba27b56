//! Configuration for providers and debate runs.
//!
//! Provider credentials and base URLs come from the environment; run
//! parameters come from the caller, optionally seeded by a named preset.
//! Explicit parameters always override preset values.

use std::env;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Maximum topic length accepted at ingress.
pub const MAX_TOPIC_CHARS: usize = 500;

/// Valid debate round range.
pub const DEBATE_ROUNDS_RANGE: std::ops::RangeInclusive<u32> = 1..=10;

/// Dialectic rounds are clamped into this range at setup.
pub const DIALECTIC_ROUNDS_RANGE: std::ops::RangeInclusive<u32> = 5..=10;

// ============================================================================
// Providers
// ============================================================================

/// Supported LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// DeepSeek (OpenAI-compatible chat completions).
    DeepSeek,
    /// OpenAI chat completions.
    OpenAi,
    /// Google Gemini (flattened single-prompt wire format).
    Gemini,
    /// Anthropic Claude (system prompt + user/assistant pairs).
    Claude,
    /// Deterministic offline provider for tests and dry runs.
    Mock,
}

impl ProviderKind {
    /// Parses a provider name as it appears in requests.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name.to_ascii_lowercase().as_str() {
            "deepseek" => Ok(Self::DeepSeek),
            "openai" => Ok(Self::OpenAi),
            "gemini" => Ok(Self::Gemini),
            "claude" => Ok(Self::Claude),
            "mock" => Ok(Self::Mock),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }

    /// Returns the canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeepSeek => "deepseek",
            Self::OpenAi => "openai",
            Self::Gemini => "gemini",
            Self::Claude => "claude",
            Self::Mock => "mock",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            Self::DeepSeek => "DEEPSEEK_API_KEY",
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Gemini => "GEMINI_API_KEY",
            Self::Claude => "CLAUDE_API_KEY",
            Self::Mock => "",
        }
    }

    /// Default API base URL for this provider.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::DeepSeek => "https://api.deepseek.com/v1",
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta",
            Self::Claude => "https://api.anthropic.com/v1",
            Self::Mock => "",
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Resolved provider settings: credentials and endpoint.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    pub base_url: String,
}

impl ProviderSettings {
    /// Reads settings for a provider from the environment.
    ///
    /// Base URL overrides use `<PROVIDER>_API_BASE` (e.g. `DEEPSEEK_API_BASE`).
    /// A missing API key is fatal for every provider except `mock`.
    pub fn from_env(provider: ProviderKind) -> Result<Self, ConfigError> {
        if provider == ProviderKind::Mock {
            return Ok(Self {
                provider,
                api_key: None,
                base_url: String::new(),
            });
        }

        let api_key = env::var(provider.api_key_env()).ok().filter(|k| !k.is_empty());
        if api_key.is_none() {
            return Err(ConfigError::MissingApiKey(
                provider.as_str().to_string(),
                provider.api_key_env().to_string(),
            ));
        }

        let base_env = format!("{}_API_BASE", provider.as_str().to_ascii_uppercase());
        let base_url =
            env::var(base_env).unwrap_or_else(|_| provider.default_base_url().to_string());

        Ok(Self {
            provider,
            api_key,
            base_url,
        })
    }

    /// Builds settings with an explicit key, bypassing the environment.
    pub fn with_key(provider: ProviderKind, api_key: impl Into<String>) -> Self {
        Self {
            provider,
            api_key: Some(api_key.into()),
            base_url: provider.default_base_url().to_string(),
        }
    }
}

// ============================================================================
// Run presets
// ============================================================================

/// Named run presets balancing quality against cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPreset {
    /// Balanced quality and cost.
    Basic,
    /// Higher temperature and more rounds for richer debates.
    Quality,
    /// Cheap and short.
    Budget,
}

impl RunPreset {
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        match name.to_ascii_lowercase().as_str() {
            "basic" => Ok(Self::Basic),
            "quality" => Ok(Self::Quality),
            "budget" => Ok(Self::Budget),
            other => Err(ConfigError::validation(
                "preset",
                format!("unknown preset '{other}'"),
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Quality => "quality",
            Self::Budget => "budget",
        }
    }

    fn temperature(&self) -> f64 {
        match self {
            Self::Basic => 0.6,
            Self::Quality => 0.85,
            Self::Budget => 0.4,
        }
    }

    fn seed(&self) -> u64 {
        42
    }

    fn max_rounds(&self) -> u32 {
        match self {
            Self::Basic => 3,
            Self::Quality => 5,
            Self::Budget => 2,
        }
    }
}

// ============================================================================
// Run configuration
// ============================================================================

/// Resolved configuration for a single debate or dialectic run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub provider: ProviderKind,
    pub model: String,
    pub temperature: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub max_rounds: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<RunPreset>,
}

impl RunConfig {
    /// Resolves the effective run configuration.
    ///
    /// Preset values fill the gaps; explicit parameters win. The preset's
    /// `max_rounds` caps the requested round count.
    pub fn resolve(
        provider: ProviderKind,
        model: impl Into<String>,
        rounds: u32,
        temperature: Option<f64>,
        seed: Option<u64>,
        preset: Option<RunPreset>,
    ) -> Self {
        let temperature = temperature
            .or_else(|| preset.map(|p| p.temperature()))
            .unwrap_or(0.7)
            .clamp(0.0, 2.0);
        let seed = seed.or_else(|| preset.map(|p| p.seed()));
        let max_rounds = match preset {
            Some(p) => rounds.min(p.max_rounds()),
            None => rounds,
        };

        Self {
            provider,
            model: model.into(),
            temperature,
            seed,
            max_rounds,
            preset,
        }
    }
}

// ============================================================================
// Ingress validation
// ============================================================================

/// Validates a debate topic: non-empty, at most [`MAX_TOPIC_CHARS`] chars.
pub fn validate_topic(topic: &str) -> Result<(), ConfigError> {
    let len = topic.chars().count();
    if len == 0 {
        return Err(ConfigError::validation("topic", "must not be empty"));
    }
    if len > MAX_TOPIC_CHARS {
        return Err(ConfigError::validation(
            "topic",
            format!("must be at most {MAX_TOPIC_CHARS} characters, got {len}"),
        ));
    }
    Ok(())
}

/// Validates a requested debate round count.
pub fn validate_debate_rounds(rounds: u32) -> Result<(), ConfigError> {
    if DEBATE_ROUNDS_RANGE.contains(&rounds) {
        Ok(())
    } else {
        Err(ConfigError::validation(
            "rounds",
            format!(
                "must be between {} and {}, got {rounds}",
                DEBATE_ROUNDS_RANGE.start(),
                DEBATE_ROUNDS_RANGE.end()
            ),
        ))
    }
}

/// Clamps a requested dialectic round count into the valid range.
pub fn clamp_dialectic_rounds(rounds: u32) -> u32 {
    rounds.clamp(*DIALECTIC_ROUNDS_RANGE.start(), *DIALECTIC_ROUNDS_RANGE.end())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse() {
        assert_eq!(ProviderKind::parse("deepseek").unwrap(), ProviderKind::DeepSeek);
        assert_eq!(ProviderKind::parse("MOCK").unwrap(), ProviderKind::Mock);
        assert!(ProviderKind::parse("unknown_provider").is_err());
    }

    #[test]
    fn test_preset_values() {
        assert!((RunPreset::Basic.temperature() - 0.6).abs() < 1e-9);
        assert!((RunPreset::Quality.temperature() - 0.85).abs() < 1e-9);
        assert!((RunPreset::Budget.temperature() - 0.4).abs() < 1e-9);
        assert_eq!(RunPreset::Basic.max_rounds(), 3);
        assert_eq!(RunPreset::Quality.max_rounds(), 5);
        assert_eq!(RunPreset::Budget.max_rounds(), 2);
    }

    #[test]
    fn test_resolve_explicit_overrides_preset() {
        let config = RunConfig::resolve(
            ProviderKind::Mock,
            "mock",
            3,
            Some(1.1),
            Some(7),
            Some(RunPreset::Basic),
        );
        assert!((config.temperature - 1.1).abs() < 1e-9);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_resolve_preset_caps_rounds() {
        let config =
            RunConfig::resolve(ProviderKind::Mock, "mock", 9, None, None, Some(RunPreset::Budget));
        assert_eq!(config.max_rounds, 2);
        assert_eq!(config.seed, Some(42));
        assert!((config.temperature - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_topic_validation() {
        assert!(validate_topic("AI in the workplace").is_ok());
        assert!(validate_topic("").is_err());
        assert!(validate_topic(&"x".repeat(501)).is_err());
        assert!(validate_topic(&"x".repeat(500)).is_ok());
    }

    #[test]
    fn test_rounds_validation() {
        assert!(validate_debate_rounds(1).is_ok());
        assert!(validate_debate_rounds(10).is_ok());
        assert!(validate_debate_rounds(0).is_err());
        assert!(validate_debate_rounds(11).is_err());
    }

    #[test]
    fn test_dialectic_clamp() {
        assert_eq!(clamp_dialectic_rounds(1), 5);
        assert_eq!(clamp_dialectic_rounds(5), 5);
        assert_eq!(clamp_dialectic_rounds(7), 7);
        assert_eq!(clamp_dialectic_rounds(12), 10);
    }
}
