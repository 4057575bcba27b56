//! Debater agent: round-scoped strategist for one side of the motion.
//!
//! Each turn runs the two-phase cycle: an analysis phase that studies
//! the opponent's latest utterance and picks a rebuttal strategy, then a
//! generation phase that produces the actual argument. The streaming
//! variant surfaces the same cycle as incremental events.

use std::sync::Arc;

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::base::{confidence_from, parse_json_or, Agent, AgentCore, ThinkResult};
use super::error::AgentResult;
use crate::llm::{CompletionParams, LlmClient, Message};
use crate::utils::text::{strip_fence_wrapper, truncate_chars};

/// How many history entries the analysis prompt replays.
const HISTORY_WINDOW: usize = 4;

// ============================================================================
// Sides and strategies
// ============================================================================

/// Which side of the motion a debater argues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Pro,
    Con,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pro => "pro",
            Self::Con => "con",
        }
    }

    /// Human-readable label used in prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Pro => "Pro (supporting side)",
            Self::Con => "Con (opposing side)",
        }
    }

    pub fn opponent(&self) -> Side {
        match self {
            Self::Pro => Self::Con,
            Self::Con => Self::Pro,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rebuttal strategies a debater may select each round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Refute the core logic of the opponent's point.
    DirectRefute,
    /// Question the reliability or relevance of their evidence.
    EvidenceAttack,
    /// Redefine the framing of the question.
    Reframe,
    /// Provide a counterexample that defeats the claim.
    CounterExample,
    /// Trace the negative consequences of their position.
    Consequence,
    /// Reinforce one's own case with new material.
    Strengthen,
}

impl Strategy {
    pub fn all() -> [Self; 6] {
        [
            Self::DirectRefute,
            Self::EvidenceAttack,
            Self::Reframe,
            Self::CounterExample,
            Self::Consequence,
            Self::Strengthen,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectRefute => "direct_refute",
            Self::EvidenceAttack => "evidence_attack",
            Self::Reframe => "reframe",
            Self::CounterExample => "counter_example",
            Self::Consequence => "consequence",
            Self::Strengthen => "strengthen",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::DirectRefute => "attack the core logic of the opponent's argument",
            Self::EvidenceAttack => "question the reliability or relevance of their evidence",
            Self::Reframe => "redefine the framing of the question from a different angle",
            Self::CounterExample => "defeat the claim with a concrete counterexample",
            Self::Consequence => "trace the negative consequences of the opposing position",
            Self::Strengthen => "reinforce your own case with fresh arguments",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::all().into_iter().find(|s| s.as_str() == name)
    }
}

// ============================================================================
// Turn context
// ============================================================================

/// One prior utterance visible to a debater.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub round: u32,
    pub side: Side,
    pub content: String,
}

/// Context handed to a debater for a single turn.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DebateTurnContext {
    pub round: u32,
    pub is_opening: bool,
    pub opponent_last_argument: String,
    pub history: Vec<HistoryEntry>,
}

// ============================================================================
// Streaming events
// ============================================================================

/// Events emitted by [`DebaterAgent::stream_react`], in order: one
/// `Thinking`, then growing `Chunk`s, then one `Complete` (or a single
/// `Failed` that terminates the sequence).
#[derive(Debug, Clone)]
pub enum DebaterStreamEvent {
    Thinking {
        side: Side,
        name: String,
        analysis: Value,
        confidence: f64,
    },
    Chunk {
        side: Side,
        name: String,
        content: String,
    },
    Complete {
        side: Side,
        name: String,
        content: String,
    },
    Failed {
        side: Side,
        reason: String,
    },
}

// ============================================================================
// Debater agent
// ============================================================================

/// A debater arguing one side of the motion.
pub struct DebaterAgent {
    core: AgentCore,
    side: Side,
    topic: String,
    client: Arc<dyn LlmClient>,
    params: CompletionParams,
    argument_history: Vec<String>,
    opponent_arguments: Vec<String>,
    last_context: Option<DebateTurnContext>,
}

impl DebaterAgent {
    pub fn new(
        name: impl Into<String>,
        side: Side,
        topic: impl Into<String>,
        client: Arc<dyn LlmClient>,
        params: CompletionParams,
    ) -> Self {
        let name = name.into();
        let mut core = AgentCore::new(name, format!("debater_{}", side.as_str()));
        core.add_goal(format!("Win the debate as the {}", side.label()));
        core.add_goal("Present compelling arguments for your position");
        core.add_goal("Rebut the opponent's points effectively");

        Self {
            core,
            side,
            topic: topic.into(),
            client,
            params,
            argument_history: Vec::new(),
            opponent_arguments: Vec::new(),
            last_context: None,
        }
    }

    pub fn side(&self) -> Side {
        self.side
    }

    pub fn arguments(&self) -> &[String] {
        &self.argument_history
    }

    /// Snapshot of this debater's state for status reporting.
    pub fn stats(&self) -> Value {
        json!({
            "name": self.core.name(),
            "side": self.side.as_str(),
            "topic": self.topic,
            "arguments_count": self.argument_history.len(),
            "current_strategy": self.core.state.current_strategy,
            "goals": self.core.state.goals,
        })
    }

    fn default_analysis() -> Value {
        json!({
            "opponent_weaknesses": [],
            "selected_strategy": "direct_refute",
            "counter_points": [],
            "confidence": 0.5
        })
    }

    fn build_analysis_prompt(&self, context: &DebateTurnContext) -> String {
        if context.is_opening {
            return format!(
                r#"You are a professional debater representing the {label}.

[Debate topic]
{topic}

[Task]
This is the opening of the debate. Analyse the motion and plan your opening.

Reply with a JSON object:
```json
{{
    "topic_analysis": "your reading of the motion",
    "core_stance": "your core position",
    "opening_strategy": "how you will open",
    "key_arguments": ["prepared core argument 1", "argument 2", "argument 3"],
    "anticipated_opposition": ["arguments you expect from the other side"],
    "confidence": 0.8
}}
```"#,
                label = self.side.label(),
                topic = self.topic,
            );
        }

        let history_summary = if context.history.is_empty() {
            "No history yet".to_string()
        } else {
            context
                .history
                .iter()
                .rev()
                .take(HISTORY_WINDOW)
                .rev()
                .map(|h| {
                    format!(
                        "Round {} - {}: {}",
                        h.round,
                        h.side,
                        truncate_chars(&h.content, 100)
                    )
                })
                .collect::<Vec<_>>()
                .join("\n")
        };

        let strategies = Strategy::all()
            .iter()
            .map(|s| format!("- {}: {}", s.as_str(), s.description()))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You are a professional debater representing the {label}.

[Debate topic]
{topic}

[Current round]
Round {round}

[Opponent's latest argument]
{opponent}

[Debate history]
{history}

[Task]
Analyse the opponent's argument, find its weak points, and pick a rebuttal strategy.

Available strategies:
{strategies}

Reply with a JSON object:
```json
{{
    "opponent_main_points": ["the opponent's main points"],
    "opponent_weaknesses": ["weak links in their case"],
    "selected_strategy": "name of the chosen strategy",
    "strategy_reason": "why this strategy",
    "counter_points": ["prepared rebuttal points"],
    "new_arguments": ["new arguments for your side"],
    "confidence": 0.7
}}
```"#,
            label = self.side.label(),
            topic = self.topic,
            round = context.round,
            opponent = context.opponent_last_argument,
            history = history_summary,
            strategies = strategies,
        )
    }

    fn build_generation_prompt(&self, analysis: &Value, context: &DebateTurnContext) -> String {
        let analysis_text =
            serde_json::to_string_pretty(analysis).unwrap_or_else(|_| analysis.to_string());

        if context.is_opening {
            format!(
                r#"You are a professional debater representing the {label}.

[Debate topic]
{topic}

[Your analysis]
{analysis}

[Task]
Deliver your opening statement based on the analysis above.

Requirements:
- State your position up front
- Make 2-3 core arguments
- Support them with persuasive evidence
- Keep the language tight and forceful
- 300-400 words

Output the statement directly, with no formatting markers."#,
                label = self.side.label(),
                topic = self.topic,
                analysis = analysis_text,
            )
        } else {
            format!(
                r#"You are a professional debater representing the {label}.

[Debate topic]
{topic}

[Current round]
Round {round}

[Your strategy analysis]
{analysis}

[Task]
Deliver your response for this round based on the analysis above.

Requirements:
- Respond to the opponent's points first
- Name the problems in their argument
- Present your rebuttal evidence
- Add new arguments where they help
- Keep the logic connected and the language tight
- 300-400 words

Output the statement directly, with no formatting markers."#,
                label = self.side.label(),
                topic = self.topic,
                round = context.round,
                analysis = analysis_text,
            )
        }
    }

    fn record_argument(&mut self, round: u32, content: &str) {
        self.argument_history.push(content.to_string());
        self.core
            .add_to_memory("argument", json!({ "round": round, "content": content }));
    }

    fn note_opponent_argument(&mut self, context: &DebateTurnContext) {
        if !context.opponent_last_argument.is_empty() {
            let opponent_argument = context.opponent_last_argument.clone();
            self.observe(&opponent_argument, "opponent");
            self.opponent_arguments.push(opponent_argument);
        }
    }

    /// Streaming turn: one `Thinking` event, growing `Chunk` events, one
    /// `Complete` (or one `Failed`). Returns the full argument, empty on
    /// streaming failure.
    pub async fn stream_react(
        &mut self,
        context: &DebateTurnContext,
        tx: &mpsc::Sender<DebaterStreamEvent>,
    ) -> AgentResult<String> {
        let think_result = self.think(context).await?;
        tx.send(DebaterStreamEvent::Thinking {
            side: self.side,
            name: self.core.name().to_string(),
            analysis: think_result.analysis.clone(),
            confidence: think_result.confidence,
        })
        .await?;

        let prompt = self.build_generation_prompt(&think_result.analysis, context);
        let messages = [
            Message::system(format!(
                "You are an eloquent competitive debater representing the {}.",
                self.side.label()
            )),
            Message::user(prompt),
        ];

        let mut stream = match self.client.complete_stream(&messages, &self.params).await {
            Ok(stream) => stream,
            Err(err) => {
                tracing::warn!(side = %self.side, error = %err, "streaming generation failed to start");
                tx.send(DebaterStreamEvent::Failed {
                    side: self.side,
                    reason: err.to_string(),
                })
                .await?;
                return Ok(String::new());
            }
        };

        let mut full = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(piece) => {
                    full.push_str(&piece);
                    tx.send(DebaterStreamEvent::Chunk {
                        side: self.side,
                        name: self.core.name().to_string(),
                        content: full.clone(),
                    })
                    .await?;
                }
                Err(err) => {
                    tracing::warn!(side = %self.side, error = %err, "stream interrupted");
                    tx.send(DebaterStreamEvent::Failed {
                        side: self.side,
                        reason: err.to_string(),
                    })
                    .await?;
                    return Ok(String::new());
                }
            }
        }

        let full = strip_fence_wrapper(&full);
        self.record_argument(context.round, &full);
        tx.send(DebaterStreamEvent::Complete {
            side: self.side,
            name: self.core.name().to_string(),
            content: full.clone(),
        })
        .await?;

        Ok(full)
    }
}

#[async_trait]
impl Agent for DebaterAgent {
    type Context = DebateTurnContext;

    fn core(&self) -> &AgentCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut AgentCore {
        &mut self.core
    }

    async fn think(&mut self, context: &Self::Context) -> AgentResult<ThinkResult> {
        self.last_context = Some(context.clone());
        self.note_opponent_argument(context);

        let prompt = self.build_analysis_prompt(context);
        let messages = [
            Message::system(format!(
                "You are a sharp analytical debate strategist representing the {}.",
                self.side.label()
            )),
            Message::user(prompt),
        ];

        match self.client.complete(&messages, &self.params).await {
            Ok(response) => {
                let analysis = parse_json_or(&response, Self::default_analysis());
                let strategy = analysis
                    .get("selected_strategy")
                    .and_then(Value::as_str)
                    .unwrap_or(Strategy::DirectRefute.as_str())
                    .to_string();

                self.core.update_belief("last_analysis", analysis.clone());
                self.core.set_strategy(&strategy);
                self.core.add_to_memory(
                    "analysis",
                    json!({ "round": context.round, "analysis": analysis }),
                );

                let confidence = confidence_from(&analysis);
                Ok(ThinkResult::new(response, analysis, "generate_argument", confidence))
            }
            Err(err) => {
                tracing::warn!(side = %self.side, error = %err, "analysis phase failed");
                Ok(ThinkResult::new(
                    format!("analysis failed: {err}"),
                    Self::default_analysis(),
                    "generate_argument",
                    0.3,
                ))
            }
        }
    }

    async fn act(&mut self, think_result: &ThinkResult) -> AgentResult<String> {
        let context = self.last_context.clone().unwrap_or_default();
        let prompt = self.build_generation_prompt(&think_result.analysis, &context);
        let messages = [
            Message::system(format!(
                "You are an eloquent competitive debater representing the {}.",
                self.side.label()
            )),
            Message::user(prompt),
        ];

        match self.client.complete(&messages, &self.params).await {
            Ok(response) => {
                let cleaned = strip_fence_wrapper(&response);
                self.record_argument(context.round, &cleaned);
                Ok(cleaned)
            }
            Err(err) => {
                tracing::warn!(side = %self.side, error = %err, "argument generation failed");
                Ok(String::new())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
