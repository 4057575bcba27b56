//! Dialectic agents: thesis, antithesis, and the observer.
//!
//! The thesis agent defends and sharpens the current thesis; the
//! antithesis agent constructs its negation; the observer fuses both
//! into a synthesis and scans the exchange for logical fallacies.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::base::{confidence_from, parse_json_or, Agent, AgentCore, ThinkResult};
use super::error::AgentResult;
use crate::llm::{CompletionParams, LlmClient, Message};
use crate::utils::text::truncate_chars;

/// Canonical synthesis used when the observer returns nothing, so the
/// loop can keep ascending.
pub const SYNTHESIS_FALLBACK: &str =
    "No synthesis emerged this round; the standing thesis carries forward under its tensions.";

// ============================================================================
// Contexts
// ============================================================================

/// One completed dialectic round, as seen by later prompts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialecticHistoryEntry {
    pub round: u32,
    pub thesis: String,
    pub antithesis: String,
    pub synthesis: String,
}

/// Context for the thesis agent.
#[derive(Debug, Clone, Default)]
pub struct ThesisContext {
    pub round: u32,
    pub thesis: String,
    pub history: Vec<DialecticHistoryEntry>,
}

/// Context for the antithesis agent.
#[derive(Debug, Clone, Default)]
pub struct AntithesisContext {
    pub round: u32,
    pub thesis: String,
    pub thesis_argument: String,
}

fn history_summary(history: &[DialecticHistoryEntry]) -> String {
    if history.is_empty() {
        return "None".to_string();
    }
    history
        .iter()
        .rev()
        .take(3)
        .rev()
        .map(|h| format!("Round {} synthesis: {}", h.round, truncate_chars(&h.synthesis, 80)))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Thesis agent
// ============================================================================

/// Defends and strengthens the current thesis.
pub struct ThesisAgent {
    core: AgentCore,
    client: Arc<dyn LlmClient>,
    params: CompletionParams,
    last_context: Option<ThesisContext>,
}

impl ThesisAgent {
    pub fn new(client: Arc<dyn LlmClient>, params: CompletionParams) -> Self {
        let mut core = AgentCore::new("Thesis", "dialectic_thesis");
        core.add_goal("Defend and strengthen the current thesis");
        core.add_goal("Argue the position with clarity and force");
        Self {
            core,
            client,
            params,
            last_context: None,
        }
    }

    fn build_analysis_prompt(&self, context: &ThesisContext) -> String {
        format!(
            r#"You are the thesis debater. Your task is to articulate and reinforce the current thesis.

[Current thesis]
{thesis}

[Round]
Round {round}

[Earlier syntheses]
{history}

Reply with a JSON object:
```json
{{
  "core_thesis": "the thesis' central claim",
  "supporting_points": ["support 1", "support 2", "support 3"],
  "assumptions": ["key premise 1", "key premise 2"],
  "confidence": 0.7
}}
```"#,
            thesis = context.thesis,
            round = context.round,
            history = history_summary(&context.history),
        )
    }

    fn build_generation_prompt(&self, analysis: &Value, context: &ThesisContext) -> String {
        let analysis_text =
            serde_json::to_string_pretty(analysis).unwrap_or_else(|_| analysis.to_string());
        format!(
            r#"You are the thesis debater. Produce the thesis argument from your analysis.

[Current thesis]
{thesis}

[Analysis]
{analysis}

Requirements:
- 200-300 words
- Clear logic, focused claims
- 2-3 supporting points
- Tight, forceful language

Output the text directly, with no formatting markers."#,
            thesis = context.thesis,
            analysis = analysis_text,
        )
    }
}

#[async_trait]
impl Agent for ThesisAgent {
    type Context = ThesisContext;

    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AgentCore {
        &mut self.core
    }

    async fn think(&mut self, context: &Self::Context) -> AgentResult<ThinkResult> {
        self.last_context = Some(context.clone());
        let prompt = self.build_analysis_prompt(context);
        let messages = [
            Message::system("You are a rigorous philosophical debater focused on articulating the thesis."),
            Message::user(prompt),
        ];

        match self.client.complete(&messages, &self.params).await {
            Ok(response) => {
                let analysis = parse_json_or(
                    &response,
                    json!({
                        "core_thesis": context.thesis,
                        "supporting_points": [],
                        "assumptions": [],
                        "confidence": 0.5
                    }),
                );
                let confidence = confidence_from(&analysis);
                Ok(ThinkResult::new(response, analysis, "generate_thesis", confidence))
            }
            Err(err) => {
                tracing::warn!(error = %err, "thesis analysis failed");
                Ok(ThinkResult::new(
                    format!("analysis failed: {err}"),
                    json!({ "core_thesis": context.thesis }),
                    "generate_thesis",
                    0.3,
                ))
            }
        }
    }

    async fn act(&mut self, think_result: &ThinkResult) -> AgentResult<String> {
        let context = self.last_context.clone().unwrap_or_default();
        let prompt = self.build_generation_prompt(&think_result.analysis, &context);
        let messages = [
            Message::system("You are a philosophical debater whose arguments are compact and forceful."),
            Message::user(prompt),
        ];

        match self.client.complete(&messages, &self.params).await {
            Ok(response) => Ok(response.trim().to_string()),
            Err(err) => {
                tracing::warn!(error = %err, "thesis generation failed");
                Ok(String::new())
            }
        }
    }
}

// ============================================================================
// Antithesis agent
// ============================================================================

/// Constructs the negation of the current thesis.
pub struct AntithesisAgent {
    core: AgentCore,
    client: Arc<dyn LlmClient>,
    params: CompletionParams,
    last_context: Option<AntithesisContext>,
}

impl AntithesisAgent {
    pub fn new(client: Arc<dyn LlmClient>, params: CompletionParams) -> Self {
        let mut core = AgentCore::new("Antithesis", "dialectic_antithesis");
        core.add_goal("State a clear antithesis and build the negative case");
        core.add_goal("Expose the thesis' key gaps and hidden premises");
        Self {
            core,
            client,
            params,
            last_context: None,
        }
    }

    fn build_analysis_prompt(&self, context: &AntithesisContext) -> String {
        format!(
            r#"You are the antithesis debater. Your task is to state the negation of the current thesis.

[Current thesis]
{thesis}

[Thesis argument]
{argument}

[Round]
Round {round}

Reply with a JSON object:
```json
{{
  "antithesis": "a clear statement of the antithesis",
  "attack_points": ["attack 1", "attack 2", "attack 3"],
  "hidden_assumptions": ["hidden premise 1", "premise 2"],
  "confidence": 0.7
}}
```"#,
            thesis = context.thesis,
            argument = context.thesis_argument,
            round = context.round,
        )
    }

    fn build_generation_prompt(&self, analysis: &Value) -> String {
        let analysis_text =
            serde_json::to_string_pretty(analysis).unwrap_or_else(|_| analysis.to_string());
        format!(
            r#"You are the antithesis debater. Produce the antithesis argument from your analysis.

[Analysis]
{analysis}

Requirements:
- 200-300 words
- State the antithesis explicitly
- Rebut the thesis argument directly
- Keep the structure clear and the pressure concentrated

Output the text directly, with no formatting markers."#,
            analysis = analysis_text,
        )
    }
}

#[async_trait]
impl Agent for AntithesisAgent {
    type Context = AntithesisContext;

    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AgentCore {
        &mut self.core
    }

    async fn think(&mut self, context: &Self::Context) -> AgentResult<ThinkResult> {
        self.last_context = Some(context.clone());
        let prompt = self.build_analysis_prompt(context);
        let messages = [
            Message::system("You are a fiercely critical philosophical debater focused on the antithesis."),
            Message::user(prompt),
        ];

        match self.client.complete(&messages, &self.params).await {
            Ok(response) => {
                let analysis = parse_json_or(
                    &response,
                    json!({
                        "antithesis": "",
                        "attack_points": [],
                        "hidden_assumptions": [],
                        "confidence": 0.5
                    }),
                );
                let confidence = confidence_from(&analysis);
                Ok(ThinkResult::new(response, analysis, "generate_antithesis", confidence))
            }
            Err(err) => {
                tracing::warn!(error = %err, "antithesis analysis failed");
                Ok(ThinkResult::new(
                    format!("analysis failed: {err}"),
                    json!({ "antithesis": "" }),
                    "generate_antithesis",
                    0.3,
                ))
            }
        }
    }

    async fn act(&mut self, think_result: &ThinkResult) -> AgentResult<String> {
        let prompt = self.build_generation_prompt(&think_result.analysis);
        let messages = [
            Message::system("You are a philosophical debater who rebuts with sharp, clean logic."),
            Message::user(prompt),
        ];

        match self.client.complete(&messages, &self.params).await {
            Ok(response) => Ok(response.trim().to_string()),
            Err(err) => {
                tracing::warn!(error = %err, "antithesis generation failed");
                Ok(String::new())
            }
        }
    }
}

// ============================================================================
// Observer agent
// ============================================================================

/// Severity of a detected fallacy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// A logical fallacy found in one side's argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fallacy {
    #[serde(rename = "type")]
    pub fallacy_type: String,
    pub quote: String,
    pub explanation: String,
    pub severity: Severity,
    /// "thesis" or "antithesis".
    pub side: String,
}

/// Result of the observer's synthesis pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisResult {
    pub synthesis: String,
    pub key_tensions: Vec<String>,
    pub confidence: f64,
}

/// Observer/recorder: synthesises the round and flags fallacies.
pub struct ObserverAgent {
    core: AgentCore,
    client: Arc<dyn LlmClient>,
    params: CompletionParams,
}

impl ObserverAgent {
    pub fn new(client: Arc<dyn LlmClient>, params: CompletionParams) -> Self {
        let mut core = AgentCore::new("Observer", "dialectic_observer");
        core.add_goal("Distil the tension and common ground into a higher synthesis");
        core.add_goal("Flag common logical fallacies in both arguments");
        Self { core, client, params }
    }

    fn build_synthesis_prompt(
        &self,
        thesis_text: &str,
        antithesis_text: &str,
        round: u32,
        history: &[DialecticHistoryEntry],
    ) -> String {
        format!(
            r#"You are the observer and recorder. Fuse the thesis and antithesis into a synthesis.

[Thesis]
{thesis_text}

[Antithesis]
{antithesis_text}

[Round]
Round {round}

[Earlier syntheses]
{history}

Reply with a JSON object:
```json
{{
  "synthesis": "a higher-level synthesis absorbing what is sound on both sides",
  "key_tensions": ["tension 1", "tension 2"],
  "confidence": 0.7
}}
```"#,
            history = history_summary(history),
        )
    }

    fn build_fallacy_prompt(&self, thesis_text: &str, antithesis_text: &str) -> String {
        format!(
            r#"Scan both arguments below for common logical fallacies (straw man, slippery slope, appeal to authority, and the like).

[Thesis argument]
{thesis_text}

[Antithesis argument]
{antithesis_text}

Reply with a JSON array; each element carries:
type: the fallacy name
quote: the triggering fragment (under 30 words)
explanation: a short explanation (under 40 words)
severity: "low" | "medium" | "high"
side: "thesis" or "antithesis"

Example:
```json
[
  {{
    "type": "straw man",
    "quote": "...",
    "explanation": "Distorts the opposing view before attacking it.",
    "severity": "medium",
    "side": "antithesis"
  }}
]
```"#,
        )
    }

    /// Produces a synthesis of the round. An empty model synthesis is
    /// replaced with [`SYNTHESIS_FALLBACK`].
    pub async fn synthesize(
        &mut self,
        thesis_text: &str,
        antithesis_text: &str,
        round: u32,
        history: &[DialecticHistoryEntry],
    ) -> SynthesisResult {
        let prompt = self.build_synthesis_prompt(thesis_text, antithesis_text, round, history);
        let messages = [
            Message::system("You are an observer with a gift for philosophical integration."),
            Message::user(prompt),
        ];

        match self.client.complete(&messages, &self.params).await {
            Ok(response) => {
                let parsed = parse_json_or(&response, json!({}));
                let synthesis = parsed["synthesis"].as_str().unwrap_or("").trim().to_string();
                SynthesisResult {
                    synthesis: if synthesis.is_empty() {
                        SYNTHESIS_FALLBACK.to_string()
                    } else {
                        synthesis
                    },
                    key_tensions: parsed["key_tensions"]
                        .as_array()
                        .map(|items| {
                            items
                                .iter()
                                .filter_map(Value::as_str)
                                .map(str::to_string)
                                .collect()
                        })
                        .unwrap_or_default(),
                    confidence: confidence_from(&parsed),
                }
            }
            Err(err) => {
                tracing::warn!(round, error = %err, "synthesis failed");
                SynthesisResult {
                    synthesis: SYNTHESIS_FALLBACK.to_string(),
                    key_tensions: Vec::new(),
                    confidence: 0.4,
                }
            }
        }
    }

    /// Scans the round's two arguments for fallacies. Failures and
    /// unparseable output degrade to an empty list.
    pub async fn detect_fallacies(
        &mut self,
        thesis_text: &str,
        antithesis_text: &str,
    ) -> Vec<Fallacy> {
        let prompt = self.build_fallacy_prompt(thesis_text, antithesis_text);
        let messages = [
            Message::system("You are a logic expert specialised in spotting argumentative fallacies."),
            Message::user(prompt),
        ];

        match self.client.complete(&messages, &self.params).await {
            Ok(response) => {
                let parsed = parse_json_or(&response, json!([]));
                serde_json::from_value(parsed).unwrap_or_default()
            }
            Err(err) => {
                tracing::warn!(error = %err, "fallacy detection failed");
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl Agent for ObserverAgent {
    type Context = Value;

    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AgentCore {
        &mut self.core
    }

    async fn think(&mut self, context: &Self::Context) -> AgentResult<ThinkResult> {
        let task = context
            .get("task")
            .and_then(Value::as_str)
            .unwrap_or("synthesize");
        Ok(ThinkResult::new(
            format!("Observer task: {task}"),
            json!({ "task": task }),
            task,
            0.6,
        ))
    }

    async fn act(&mut self, _think_result: &ThinkResult) -> AgentResult<String> {
        Ok(String::new())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockProvider;

    fn client() -> Arc<dyn LlmClient> {
        Arc::new(MockProvider::new("mock", Some(42)))
    }

    fn params() -> CompletionParams {
        CompletionParams::new().with_temperature(0.7)
    }

    #[tokio::test]
    async fn test_thesis_react() {
        let mut agent = ThesisAgent::new(client(), params());
        let (think, text) = agent
            .react(&ThesisContext {
                round: 1,
                thesis: "Knowledge requires certainty".to_string(),
                history: Vec::new(),
            })
            .await
            .unwrap();
        assert!(think.analysis.get("core_thesis").is_some());
        assert!(!text.is_empty());
    }

    #[tokio::test]
    async fn test_antithesis_react() {
        let mut agent = AntithesisAgent::new(client(), params());
        let (think, text) = agent
            .react(&AntithesisContext {
                round: 1,
                thesis: "Knowledge requires certainty".to_string(),
                thesis_argument: "Without certainty, claims are mere opinion.".to_string(),
            })
            .await
            .unwrap();
        assert!(think.analysis.get("attack_points").is_some());
        assert!(!text.is_empty());
    }

    #[tokio::test]
    async fn test_synthesize_never_empty() {
        let mut observer = ObserverAgent::new(client(), params());
        let result = observer
            .synthesize("thesis text", "antithesis text", 1, &[])
            .await;
        assert!(!result.synthesis.is_empty());
        assert!(result.confidence > 0.0);
    }

    #[tokio::test]
    async fn test_detect_fallacies_shape() {
        let mut observer = ObserverAgent::new(client(), params());
        let fallacies = observer
            .detect_fallacies("thesis text", "antithesis text")
            .await;
        for fallacy in &fallacies {
            assert!(!fallacy.fallacy_type.is_empty());
            assert!(["thesis", "antithesis"].contains(&fallacy.side.as_str()));
        }
    }

    #[test]
    fn test_history_summary_truncates() {
        let history = vec![DialecticHistoryEntry {
            round: 1,
            thesis: "t".to_string(),
            antithesis: "a".to_string(),
            synthesis: "s".repeat(200),
        }];
        let summary = history_summary(&history);
        assert!(summary.starts_with("Round 1 synthesis:"));
        assert!(summary.ends_with("..."));
    }
}
