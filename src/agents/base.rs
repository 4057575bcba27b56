//! Agent runtime: the reason-then-act contract and per-agent state.
//!
//! Every agent follows the same cycle:
//! 1. Observe - receive information into chronological memory
//! 2. Think - analyse the situation and produce a [`ThinkResult`]
//! 3. Act - turn the analysis into an utterance
//!
//! Agents keep a last-write-wins belief store, an ordered duplicate-free
//! goal list, and an append-only event memory.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::AgentResult;

// ============================================================================
// State
// ============================================================================

/// Identity and mutable state of an agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    pub name: String,
    pub role: String,
    /// Last-write-wins belief store (arbitrary JSON values).
    pub beliefs: BTreeMap<String, Value>,
    /// Ordered goal list; duplicates are ignored on insert.
    pub goals: Vec<String>,
    pub current_strategy: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AgentState {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            beliefs: BTreeMap::new(),
            goals: Vec::new(),
            current_strategy: None,
            created_at: Utc::now(),
        }
    }
}

/// One entry in an agent's chronological memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEvent {
    pub event_type: String,
    pub content: Value,
    pub timestamp: DateTime<Utc>,
}

/// State plus memory, embedded by every concrete agent.
#[derive(Debug, Clone)]
pub struct AgentCore {
    pub state: AgentState,
    memory: Vec<MemoryEvent>,
}

impl AgentCore {
    pub fn new(name: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            state: AgentState::new(name, role),
            memory: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn role(&self) -> &str {
        &self.state.role
    }

    /// Updates a belief (last write wins).
    pub fn update_belief(&mut self, key: impl Into<String>, value: Value) {
        self.state.beliefs.insert(key.into(), value);
    }

    pub fn get_belief(&self, key: &str) -> Option<&Value> {
        self.state.beliefs.get(key)
    }

    /// Adds a goal unless it is already present.
    pub fn add_goal(&mut self, goal: impl Into<String>) {
        let goal = goal.into();
        if !self.state.goals.contains(&goal) {
            self.state.goals.push(goal);
        }
    }

    pub fn set_strategy(&mut self, strategy: impl Into<String>) {
        self.state.current_strategy = Some(strategy.into());
    }

    /// Appends an event to memory. Memory is append-only.
    pub fn add_to_memory(&mut self, event_type: impl Into<String>, content: Value) {
        self.memory.push(MemoryEvent {
            event_type: event_type.into(),
            content,
            timestamp: Utc::now(),
        });
    }

    /// Returns the most recent `n` memory events.
    pub fn recent_memory(&self, n: usize) -> &[MemoryEvent] {
        let start = self.memory.len().saturating_sub(n);
        &self.memory[start..]
    }

    pub fn memory(&self) -> &[MemoryEvent] {
        &self.memory
    }
}

// ============================================================================
// Think result
// ============================================================================

/// Outcome of an agent's reasoning phase.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThinkResult {
    /// Free-text reasoning trace.
    pub reasoning: String,
    /// Structured analysis extracted from the reasoning.
    pub analysis: Value,
    /// Tag for the action the agent intends next.
    pub next_action: String,
    /// Confidence in [0, 1].
    pub confidence: f64,
}

impl ThinkResult {
    pub fn new(
        reasoning: impl Into<String>,
        analysis: Value,
        next_action: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            reasoning: reasoning.into(),
            analysis,
            next_action: next_action.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

// ============================================================================
// Agent contract
// ============================================================================

/// The reason-then-act contract.
#[async_trait]
pub trait Agent: Send {
    /// Per-agent context type fed into the reasoning phase.
    type Context: Send + Sync;

    fn core(&self) -> &AgentCore;
    fn core_mut(&mut self) -> &mut AgentCore;

    /// Reasoning phase: analyse the context.
    async fn think(&mut self, context: &Self::Context) -> AgentResult<ThinkResult>;

    /// Acting phase: produce an utterance from the analysis.
    async fn act(&mut self, think_result: &ThinkResult) -> AgentResult<String>;

    /// Full cycle: think, then act on the result.
    async fn react(&mut self, context: &Self::Context) -> AgentResult<(ThinkResult, String)> {
        let think_result = self.think(context).await?;
        let action = self.act(&think_result).await?;
        Ok((think_result, action))
    }

    /// Records an observation into memory.
    fn observe(&mut self, observation: &str, source: &str) {
        self.core_mut().add_to_memory(
            "observation",
            serde_json::json!({
                "source": source,
                "content": observation,
            }),
        );
    }
}

// ============================================================================
// Tolerant JSON extraction
// ============================================================================

/// Extracts a JSON value from free text.
///
/// Tries, in order: the body of a fenced ``` / ```json block, the whole
/// trimmed text, and the span from the first `{` or `[` to the matching
/// last `}` or `]`.
pub fn extract_json(response: &str) -> Option<Value> {
    let trimmed = response.trim();

    if let Some(fenced) = fenced_body(trimmed) {
        if let Ok(value) = serde_json::from_str(fenced.trim()) {
            return Some(value);
        }
    }

    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let (Some(start), Some(end)) = (trimmed.find(open), trimmed.rfind(close)) {
            if end > start {
                if let Ok(value) = serde_json::from_str(&trimmed[start..=end]) {
                    return Some(value);
                }
            }
        }
    }

    None
}

/// Extracts JSON or falls back to a caller-supplied default shape.
pub fn parse_json_or(response: &str, default: Value) -> Value {
    extract_json(response).unwrap_or(default)
}

/// Reads a confidence scalar out of an analysis, defaulting to 0.5.
pub fn confidence_from(analysis: &Value) -> f64 {
    analysis
        .get("confidence")
        .and_then(Value::as_f64)
        .unwrap_or(0.5)
        .clamp(0.0, 1.0)
}

fn fenced_body(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_fence = &text[start + 3..];
    // Skip an optional language tag up to the first newline.
    let body_start = after_fence.find('\n')? + 1;
    let body = &after_fence[body_start..];
    let end = body.find("```")?;
    Some(&body[..end])
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_beliefs_last_write_wins() {
        let mut core = AgentCore::new("pro", "debater_pro");
        core.update_belief("topic", json!("a"));
        core.update_belief("topic", json!("b"));
        assert_eq!(core.get_belief("topic"), Some(&json!("b")));
    }

    #[test]
    fn test_goals_deduplicated_in_order() {
        let mut core = AgentCore::new("pro", "debater_pro");
        core.add_goal("win");
        core.add_goal("rebut");
        core.add_goal("win");
        assert_eq!(core.state.goals, vec!["win", "rebut"]);
    }

    #[test]
    fn test_memory_append_only_and_recent() {
        let mut core = AgentCore::new("pro", "debater_pro");
        for i in 0..5 {
            core.add_to_memory("observation", json!({ "i": i }));
        }
        assert_eq!(core.memory().len(), 5);
        let recent = core.recent_memory(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].content["i"], 3);
    }

    #[test]
    fn test_think_result_confidence_clamped() {
        let result = ThinkResult::new("r", json!({}), "act", 1.5);
        assert!((result.confidence - 1.0).abs() < 1e-9);
        let result = ThinkResult::new("r", json!({}), "act", -0.2);
        assert!((result.confidence - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_extract_json_fenced() {
        let response = "Here you go:\n```json\n{\"a\": 1}\n```\nthanks";
        assert_eq!(extract_json(response), Some(json!({"a": 1})));

        let bare_fence = "```\n[1, 2]\n```";
        assert_eq!(extract_json(bare_fence), Some(json!([1, 2])));
    }

    #[test]
    fn test_extract_json_embedded() {
        let response = "My answer is {\"a\": 1} as requested";
        assert_eq!(extract_json(response), Some(json!({"a": 1})));
    }

    #[test]
    fn test_extract_json_failure_yields_default() {
        let default = json!({"selected_strategy": "direct_refute"});
        let parsed = parse_json_or("not json at all", default.clone());
        assert_eq!(parsed, default);
    }

    #[test]
    fn test_confidence_default() {
        assert!((confidence_from(&json!({})) - 0.5).abs() < 1e-9);
        assert!((confidence_from(&json!({"confidence": 0.8})) - 0.8).abs() < 1e-9);
        assert!((confidence_from(&json!({"confidence": 7})) - 1.0).abs() < 1e-9);
    }
}
