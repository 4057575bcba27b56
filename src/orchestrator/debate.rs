//! Debate orchestrator: the state machine driving a pro/con/evaluator
//! session.
//!
//! Lifecycle: `not_started -> ready -> in_progress -> completed`. Each
//! round runs a fixed protocol - pro thinks and speaks, con thinks and
//! speaks, the evaluator scores, standings update - and every step is
//! appended to shared memory, published on the bus, and emitted to the
//! consumer channel. A closed consumer channel cancels the run: the
//! in-flight call finishes, then no further events are produced.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::events::DebateEvent;
use crate::agents::base::Agent;
use crate::agents::debater::{DebateTurnContext, DebaterAgent, DebaterStreamEvent, HistoryEntry, Side};
use crate::agents::error::AgentResult;
use crate::agents::evaluator::EvaluatorAgent;
use crate::config::{validate_debate_rounds, validate_topic, RunConfig};
use crate::error::ConfigError;
use crate::llm::{estimate_cost, CompletionParams, LlmClient, Pricing};
use crate::memory::shared::DebateMemory;
use crate::protocol::{AgentMessage, MessageBus, ProtocolValidator};

/// Debate session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebateState {
    NotStarted,
    Ready,
    InProgress,
    Completed,
}

/// Orchestrates one debate session.
///
/// Owns its agents, memory and bus by value; nothing outside the
/// orchestrator mutates them.
pub struct DebateOrchestrator {
    state: DebateState,
    topic: String,
    total_rounds: u32,
    current_round: u32,
    run_config: Option<RunConfig>,
    pro: Option<DebaterAgent>,
    con: Option<DebaterAgent>,
    evaluator: Option<EvaluatorAgent>,
    memory: Option<DebateMemory>,
    bus: MessageBus,
}

impl Default for DebateOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl DebateOrchestrator {
    pub fn new() -> Self {
        Self {
            state: DebateState::NotStarted,
            topic: String::new(),
            total_rounds: 0,
            current_round: 0,
            run_config: None,
            pro: None,
            con: None,
            evaluator: None,
            memory: None,
            bus: MessageBus::new(),
        }
    }

    pub fn state(&self) -> DebateState {
        self.state
    }

    pub fn memory(&self) -> Option<&DebateMemory> {
        self.memory.as_ref()
    }

    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }

    /// Validates inputs, creates the agent triple and shared memory, and
    /// moves the session to `ready`. Rejects bad input before any event
    /// is emitted.
    pub fn setup_debate(
        &mut self,
        topic: &str,
        config: RunConfig,
        client: Arc<dyn LlmClient>,
    ) -> Result<Value, ConfigError> {
        let evaluator_client = Arc::clone(&client);
        self.setup_debate_split(topic, config, Arc::clone(&client), client, evaluator_client)
    }

    /// Like [`Self::setup_debate`], but each side (and the evaluator)
    /// may run on a different provider or model.
    pub fn setup_debate_split(
        &mut self,
        topic: &str,
        config: RunConfig,
        pro_client: Arc<dyn LlmClient>,
        con_client: Arc<dyn LlmClient>,
        evaluator_client: Arc<dyn LlmClient>,
    ) -> Result<Value, ConfigError> {
        validate_topic(topic)?;
        validate_debate_rounds(config.max_rounds)?;

        let params = CompletionParams::new()
            .with_temperature(config.temperature)
            .with_seed(config.seed);

        self.topic = topic.to_string();
        self.total_rounds = config.max_rounds;
        self.current_round = 0;
        self.memory = Some(DebateMemory::new(topic, config.max_rounds));
        self.pro = Some(DebaterAgent::new(
            "Pro",
            Side::Pro,
            topic,
            pro_client,
            params.clone(),
        ));
        self.con = Some(DebaterAgent::new(
            "Con",
            Side::Con,
            topic,
            con_client,
            params.clone(),
        ));
        self.evaluator = Some(EvaluatorAgent::new(topic, evaluator_client, params));

        for agent_id in ["pro", "con", "evaluator", "orchestrator"] {
            self.bus.subscribe(
                agent_id,
                Box::new(move |message| {
                    tracing::debug!(to = agent_id, kind = ?message.kind, "bus delivery");
                    Ok(())
                }),
            );
        }

        self.publish_checked(AgentMessage::status(
            "orchestrator",
            "debate_setup",
            json!({ "topic": topic, "rounds": config.max_rounds }),
        ));

        self.run_config = Some(config);
        self.state = DebateState::Ready;

        let pro_stats = self.pro.as_ref().map(DebaterAgent::stats);
        let con_stats = self.con.as_ref().map(DebaterAgent::stats);
        Ok(json!({
            "status": "ready",
            "topic": self.topic,
            "total_rounds": self.total_rounds,
            "agents": { "pro": pro_stats, "con": con_stats, "evaluator": "seated" },
        }))
    }

    /// Publishes a message unless the validator rejects it; a rejected
    /// message is dropped and logged.
    fn publish_checked(&mut self, message: AgentMessage) -> bool {
        match ProtocolValidator::validate(&message) {
            Ok(()) => {
                self.bus.publish(message);
                true
            }
            Err(reason) => {
                tracing::warn!(%reason, sender = %message.sender, "message dropped by validator");
                false
            }
        }
    }

    /// Runs the full debate, emitting buffered (non-streaming) argument
    /// events.
    pub async fn run(&mut self, tx: mpsc::Sender<DebateEvent>) -> AgentResult<()> {
        self.run_inner(tx, false).await
    }

    /// Runs the full debate with per-chunk argument streaming.
    pub async fn run_streaming(&mut self, tx: mpsc::Sender<DebateEvent>) -> AgentResult<()> {
        self.run_inner(tx, true).await
    }

    async fn run_inner(
        &mut self,
        tx: mpsc::Sender<DebateEvent>,
        streaming: bool,
    ) -> AgentResult<()> {
        if self.state != DebateState::Ready {
            tracing::warn!(state = ?self.state, "run invoked outside the ready state");
            let _ = tx
                .send(DebateEvent::Error {
                    message: "Debate is not ready; call setup_debate first".to_string(),
                })
                .await;
            return Ok(());
        }

        self.state = DebateState::InProgress;
        let total_rounds = self.total_rounds;
        let topic = self.topic.clone();

        if let Some(memory) = self.memory.as_mut() {
            memory.start_debate();
        }

        if !emit(
            &tx,
            DebateEvent::Opening {
                content: format!("Welcome to the debate. Today's motion: {topic}"),
                topic: topic.clone(),
                total_rounds,
            },
        )
        .await
        {
            return Ok(());
        }

        let mut history: Vec<HistoryEntry> = Vec::new();

        for round in 1..=total_rounds {
            self.current_round = round;
            if let Some(memory) = self.memory.as_mut() {
                memory.start_round(round);
            }

            if !emit(&tx, DebateEvent::RoundStart { round, total_rounds }).await {
                return Ok(());
            }

            // Pro speaks first; an opening only in round one with a
            // blank slate.
            let pro_context = DebateTurnContext {
                round,
                is_opening: round == 1 && history.is_empty(),
                opponent_last_argument: history.last().map(|h| h.content.clone()).unwrap_or_default(),
                history: history.clone(),
            };
            let Some(pro_argument) = self
                .debater_turn(Side::Pro, &pro_context, &tx, streaming)
                .await?
            else {
                return Ok(());
            };
            history.push(HistoryEntry {
                round,
                side: Side::Pro,
                content: pro_argument.clone(),
            });

            // Round one is an opening for con as well, so both sides
            // deliver an opening statement.
            let con_context = DebateTurnContext {
                round,
                is_opening: round == 1,
                opponent_last_argument: pro_argument.clone(),
                history: history.clone(),
            };
            let Some(con_argument) = self
                .debater_turn(Side::Con, &con_context, &tx, streaming)
                .await?
            else {
                return Ok(());
            };
            history.push(HistoryEntry {
                round,
                side: Side::Con,
                content: con_argument.clone(),
            });

            // Evaluation, then standings.
            let prior = self
                .memory
                .as_ref()
                .map(|m| m.evaluations().to_vec())
                .unwrap_or_default();
            let Some(evaluator) = self.evaluator.as_mut() else {
                let _ = tx
                    .send(DebateEvent::Error {
                        message: "evaluator missing".to_string(),
                    })
                    .await;
                return Ok(());
            };
            let evaluation = evaluator
                .evaluate_round(&pro_argument, &con_argument, round, &prior)
                .await;

            if let Some(memory) = self.memory.as_mut() {
                memory.add_evaluation(&evaluation);
                memory.end_round(round);
            }
            self.publish_checked(AgentMessage::evaluation(
                "evaluator",
                "",
                json!({ "pro": evaluation.pro_score, "con": evaluation.con_score }),
                evaluation.commentary.clone(),
                round,
            ));

            if !emit(
                &tx,
                DebateEvent::Evaluation {
                    round,
                    pro_score: evaluation.pro_score,
                    con_score: evaluation.con_score,
                    round_winner: evaluation.round_winner,
                    commentary: evaluation.commentary.clone(),
                    highlights: evaluation.highlights.clone(),
                    suggestions: evaluation.suggestions.clone(),
                },
            )
            .await
            {
                return Ok(());
            }

            let standings = match self.memory.as_ref() {
                Some(memory) => memory.get_current_standings(),
                None => continue,
            };
            if !emit(&tx, DebateEvent::Standings { round, standings }).await {
                return Ok(());
            }
        }

        // Final verdict, completion.
        let Some(evaluator) = self.evaluator.as_mut() else {
            return Ok(());
        };
        let verdict = evaluator.final_verdict().await;

        if let Some(memory) = self.memory.as_mut() {
            memory.complete_debate(Some(verdict.clone()));
        }
        self.publish_checked(AgentMessage::verdict(
            "evaluator",
            verdict.winner.as_str(),
            verdict.pro_total_score,
            verdict.con_total_score,
            verdict.summary.clone(),
        ));

        if !emit(
            &tx,
            DebateEvent::Verdict {
                winner: verdict.winner,
                pro_total_score: verdict.pro_total_score,
                con_total_score: verdict.con_total_score,
                margin: verdict.margin,
                summary: verdict.summary.clone(),
                pro_strengths: verdict.pro_strengths.clone(),
                con_strengths: verdict.con_strengths.clone(),
                key_turning_points: verdict.key_turning_points.clone(),
            },
        )
        .await
        {
            return Ok(());
        }

        self.state = DebateState::Completed;

        let final_state = self
            .memory
            .as_ref()
            .map(DebateMemory::get_full_state)
            .unwrap_or(Value::Null);
        let _ = tx
            .send(DebateEvent::Complete {
                message: "Debate complete".to_string(),
                final_state,
                message_history: self.bus.export_history(),
            })
            .await;

        Ok(())
    }

    /// Runs one debater's turn. Returns `Ok(None)` when the consumer
    /// disconnected and the run should stop.
    async fn debater_turn(
        &mut self,
        side: Side,
        context: &DebateTurnContext,
        tx: &mpsc::Sender<DebateEvent>,
        streaming: bool,
    ) -> AgentResult<Option<String>> {
        let round = context.round;
        let debater = match side {
            Side::Pro => self.pro.as_mut(),
            Side::Con => self.con.as_mut(),
        };
        let Some(debater) = debater else {
            let _ = tx
                .send(DebateEvent::Error {
                    message: format!("{side} debater missing"),
                })
                .await;
            return Ok(None);
        };

        let argument = if streaming {
            let (agent_tx, mut agent_rx) = mpsc::channel::<DebaterStreamEvent>(32);
            let outer = tx.clone();
            let forwarder = tokio::spawn(async move {
                while let Some(event) = agent_rx.recv().await {
                    if outer.send(map_stream_event(event, round)).await.is_err() {
                        break;
                    }
                }
            });

            let result = debater.stream_react(context, &agent_tx).await;
            drop(agent_tx);
            let _ = forwarder.await;

            match result {
                Ok(argument) => argument,
                Err(err) => {
                    // The consumer hung up mid-stream.
                    tracing::debug!(%side, error = %err, "streaming turn aborted");
                    return Ok(None);
                }
            }
        } else {
            let (think, argument) = debater.react(context).await?;
            if !emit(
                tx,
                DebateEvent::Thinking {
                    round,
                    side,
                    name: debater.core().name().to_string(),
                    content: think.analysis.clone(),
                    confidence: think.confidence,
                },
            )
            .await
            {
                return Ok(None);
            }
            if !emit(
                tx,
                DebateEvent::Argument {
                    round,
                    side,
                    name: debater.core().name().to_string(),
                    content: argument.clone(),
                    complete: true,
                },
            )
            .await
            {
                return Ok(None);
            }
            argument
        };

        let (agent_name, thinking) = {
            let debater = match side {
                Side::Pro => self.pro.as_ref(),
                Side::Con => self.con.as_ref(),
            };
            let name = debater
                .map(|d| d.core().name().to_string())
                .unwrap_or_else(|| side.to_string());
            let thinking = debater
                .and_then(|d| d.core().get_belief("last_analysis").cloned());
            (name, thinking)
        };

        if let Some(memory) = self.memory.as_mut() {
            memory.add_argument(side, &agent_name, &argument, thinking);
        }
        self.publish_checked(AgentMessage::argument(side.as_str(), argument.clone(), round));

        Ok(Some(argument))
    }

    // ------------------------------------------------------------------
    // State export
    // ------------------------------------------------------------------

    /// Snapshot of the orchestrator and agent state.
    pub fn get_debate_state(&self) -> Value {
        json!({
            "state": self.state,
            "topic": self.topic,
            "total_rounds": self.total_rounds,
            "current_round": self.current_round,
            "standings": self.memory.as_ref().map(|m| m.get_current_standings()),
            "agents": {
                "pro": self.pro.as_ref().map(DebaterAgent::stats),
                "con": self.con.as_ref().map(DebaterAgent::stats),
            },
        })
    }

    /// Markdown transcript of the debate so far.
    pub fn get_transcript(&self) -> String {
        self.memory
            .as_ref()
            .map(DebateMemory::export_transcript)
            .unwrap_or_default()
    }

    /// Full memory state for persistence.
    pub fn get_full_state(&self) -> Value {
        self.memory
            .as_ref()
            .map(DebateMemory::get_full_state)
            .unwrap_or(Value::Null)
    }

    /// Evaluable trace of the completed run.
    pub fn build_trace(&self) -> Value {
        let Some(memory) = self.memory.as_ref() else {
            return json!({});
        };

        let turns: Vec<Value> = memory
            .arguments()
            .iter()
            .map(|a| {
                json!({
                    "round": a.round,
                    "side": a.side.as_str(),
                    "role": a.agent_name,
                    "thought": a.thinking,
                    "action": "argument",
                    "result": a.content,
                    "timestamp": a.timestamp,
                })
            })
            .collect();

        let cost = estimate_cost(
            memory.arguments().iter().map(|a| a.content.as_str()),
            Pricing::default(),
        );

        json!({
            "topic": memory.topic,
            "run_config": self.run_config,
            "turns": turns,
            "evaluations": memory.evaluations(),
            "verdict": memory.verdict(),
            "standings": memory.get_current_standings(),
            "cost": cost,
            "message_history": self.bus.export_history(),
        })
    }
}

/// Sends an event; returns false when the consumer has disconnected.
async fn emit(tx: &mpsc::Sender<DebateEvent>, event: DebateEvent) -> bool {
    tx.send(event).await.is_ok()
}

fn map_stream_event(event: DebaterStreamEvent, round: u32) -> DebateEvent {
    match event {
        DebaterStreamEvent::Thinking {
            side,
            name,
            analysis,
            confidence,
        } => DebateEvent::Thinking {
            round,
            side,
            name,
            content: analysis,
            confidence,
        },
        DebaterStreamEvent::Chunk { side, name, content } => DebateEvent::Argument {
            round,
            side,
            name,
            content,
            complete: false,
        },
        DebaterStreamEvent::Complete { side, name, content } => DebateEvent::ArgumentComplete {
            round,
            side,
            name,
            content,
            complete: true,
        },
        DebaterStreamEvent::Failed { side, reason } => DebateEvent::Error {
            message: format!("{side} stream failed: {reason}"),
        },
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ProviderKind, RunPreset};
    use crate::llm::MockProvider;
    use crate::memory::shared::DebateStatus;

    fn mock_config(rounds: u32, seed: u64) -> RunConfig {
        RunConfig::resolve(ProviderKind::Mock, "mock", rounds, Some(0.6), Some(seed), None)
    }

    fn mock_client(seed: u64) -> Arc<dyn LlmClient> {
        Arc::new(MockProvider::new("mock", Some(seed)))
    }

    async fn run_debate(rounds: u32, seed: u64, streaming: bool) -> Vec<DebateEvent> {
        let mut orchestrator = DebateOrchestrator::new();
        orchestrator
            .setup_debate("AI 将取代多数人类工作", mock_config(rounds, seed), mock_client(seed))
            .unwrap();

        let (tx, mut rx) = mpsc::channel(256);
        let handle = tokio::spawn(async move {
            let mut events = Vec::new();
            while let Some(event) = rx.recv().await {
                events.push(event);
            }
            events
        });

        if streaming {
            orchestrator.run_streaming(tx).await.unwrap();
        } else {
            orchestrator.run(tx).await.unwrap();
        }
        assert_eq!(orchestrator.state(), DebateState::Completed);
        handle.await.unwrap()
    }

    fn count_kind(events: &[DebateEvent], kind: &str) -> usize {
        events.iter().filter(|e| e.kind() == kind).count()
    }

    #[tokio::test]
    async fn test_run_requires_ready_state() {
        let mut orchestrator = DebateOrchestrator::new();
        let (tx, mut rx) = mpsc::channel(8);
        orchestrator.run(tx).await.unwrap();

        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind(), "error");
        assert_eq!(orchestrator.state(), DebateState::NotStarted);
    }

    #[tokio::test]
    async fn test_setup_rejects_bad_input() {
        let mut orchestrator = DebateOrchestrator::new();
        assert!(orchestrator
            .setup_debate("", mock_config(2, 1), mock_client(1))
            .is_err());
        assert!(orchestrator
            .setup_debate("topic", mock_config(11, 1), mock_client(1))
            .is_err());
        assert_eq!(orchestrator.state(), DebateState::NotStarted);
    }

    #[tokio::test]
    async fn test_two_round_debate_event_counts() {
        let events = run_debate(2, 123, false).await;

        assert_eq!(count_kind(&events, "opening"), 1);
        assert_eq!(count_kind(&events, "round_start"), 2);
        assert_eq!(count_kind(&events, "thinking"), 4);
        assert_eq!(count_kind(&events, "argument"), 4);
        assert_eq!(count_kind(&events, "evaluation"), 2);
        assert_eq!(count_kind(&events, "standings"), 2);
        assert_eq!(count_kind(&events, "verdict"), 1);
        assert_eq!(count_kind(&events, "complete"), 1);
        assert_eq!(count_kind(&events, "error"), 0);
    }

    #[tokio::test]
    async fn test_per_round_event_order() {
        let events = run_debate(1, 7, false).await;
        let kinds: Vec<&str> = events.iter().map(DebateEvent::kind).collect();
        assert_eq!(
            kinds,
            vec![
                "opening",
                "round_start",
                "thinking",
                "argument",
                "thinking",
                "argument",
                "evaluation",
                "standings",
                "verdict",
                "complete",
            ]
        );

        // Pro precedes con inside the round.
        let sides: Vec<Side> = events
            .iter()
            .filter_map(|e| match e {
                DebateEvent::Argument { side, .. } => Some(*side),
                _ => None,
            })
            .collect();
        assert_eq!(sides, vec![Side::Pro, Side::Con]);
    }

    #[tokio::test]
    async fn test_memory_invariants_after_completion() {
        let mut orchestrator = DebateOrchestrator::new();
        orchestrator
            .setup_debate("AI 将取代多数人类工作", mock_config(2, 5), mock_client(5))
            .unwrap();
        let (tx, mut rx) = mpsc::channel(256);
        let drain = tokio::spawn(async move { while rx.recv().await.is_some() {} });
        orchestrator.run(tx).await.unwrap();
        drain.await.unwrap();

        let memory = orchestrator.memory().unwrap();
        assert_eq!(memory.status, DebateStatus::Completed);
        assert_eq!(memory.evaluations().len(), 2);
        assert_eq!(memory.arguments().len(), 4);
        assert!(memory.verdict().is_some());

        let expected_pro: u32 = memory.evaluations().iter().map(|e| e.pro_score.total()).sum();
        assert_eq!(memory.get_current_standings().pro_total_score, expected_pro);
    }

    #[tokio::test]
    async fn test_deterministic_replay_with_fixed_seed() {
        let left = run_debate(2, 123, false).await;
        let right = run_debate(2, 123, false).await;

        let normalize = |events: &[DebateEvent]| -> Vec<Value> {
            events
                .iter()
                .map(|e| {
                    let mut value = serde_json::to_value(e).unwrap();
                    strip_volatile(&mut value);
                    value
                })
                .collect()
        };

        assert_eq!(normalize(&left), normalize(&right));
    }

    /// Removes timestamps and generated ids ahead of comparison.
    fn strip_volatile(value: &mut Value) {
        match value {
            Value::Object(map) => {
                map.remove("timestamp");
                map.remove("created_at");
                map.remove("id");
                for child in map.values_mut() {
                    strip_volatile(child);
                }
            }
            Value::Array(items) => {
                for child in items {
                    strip_volatile(child);
                }
            }
            _ => {}
        }
    }

    #[tokio::test]
    async fn test_streaming_sequence_per_side() {
        let events = run_debate(1, 9, true).await;

        for side in [Side::Pro, Side::Con] {
            let side_events: Vec<&DebateEvent> = events
                .iter()
                .filter(|e| match e {
                    DebateEvent::Thinking { side: s, .. }
                    | DebateEvent::Argument { side: s, .. }
                    | DebateEvent::ArgumentComplete { side: s, .. } => *s == side,
                    _ => false,
                })
                .collect();

            assert!(matches!(side_events.first(), Some(DebateEvent::Thinking { .. })));
            assert!(matches!(
                side_events.last(),
                Some(DebateEvent::ArgumentComplete { complete: true, .. })
            ));

            let mut prev_len = 0;
            let mut chunks = 0;
            for event in &side_events[1..side_events.len() - 1] {
                match event {
                    DebateEvent::Argument { content, complete, .. } => {
                        assert!(!complete);
                        assert!(content.len() >= prev_len, "chunks must grow monotonically");
                        prev_len = content.len();
                        chunks += 1;
                    }
                    other => panic!("unexpected event inside stream: {other:?}"),
                }
            }
            assert!(chunks >= 1);
        }
    }

    #[tokio::test]
    async fn test_argument_complete_matches_memory() {
        let mut orchestrator = DebateOrchestrator::new();
        orchestrator
            .setup_debate("AI 将取代多数人类工作", mock_config(1, 11), mock_client(11))
            .unwrap();
        let (tx, mut rx) = mpsc::channel(256);
        let collect = tokio::spawn(async move {
            let mut events = Vec::new();
            while let Some(event) = rx.recv().await {
                events.push(event);
            }
            events
        });
        orchestrator.run_streaming(tx).await.unwrap();
        let events = collect.await.unwrap();

        let memory = orchestrator.memory().unwrap();
        for event in &events {
            if let DebateEvent::ArgumentComplete { side, content, .. } = event {
                let stored = memory.get_last_argument(Some(*side)).unwrap();
                assert_eq!(&stored.content, content);
            }
        }
    }

    #[tokio::test]
    async fn test_consumer_disconnect_stops_production() {
        let mut orchestrator = DebateOrchestrator::new();
        orchestrator
            .setup_debate("AI 将取代多数人类工作", mock_config(3, 2), mock_client(2))
            .unwrap();

        let (tx, mut rx) = mpsc::channel(4);
        {
            // Take the opening and the first round_start, then hang up.
            let run = orchestrator.run(tx);
            tokio::pin!(run);

            let mut received = 0;
            loop {
                tokio::select! {
                    result = &mut run => {
                        result.unwrap();
                        break;
                    }
                    event = rx.recv() => {
                        if event.is_some() {
                            received += 1;
                            if received == 2 {
                                rx.close();
                            }
                        }
                    }
                }
            }
        }

        // The session never reached completion.
        assert_ne!(orchestrator.state(), DebateState::Completed);
    }

    #[tokio::test]
    async fn test_single_round_verdict_matches_round_winner() {
        let events = run_debate(1, 123, false).await;
        let round_winner = events.iter().find_map(|e| match e {
            DebateEvent::Evaluation { round_winner, .. } => Some(*round_winner),
            _ => None,
        });
        let verdict_winner = events.iter().find_map(|e| match e {
            DebateEvent::Verdict { winner, .. } => Some(*winner),
            _ => None,
        });
        assert_eq!(round_winner.unwrap(), verdict_winner.unwrap());
    }

    #[tokio::test]
    async fn test_preset_caps_rounds_in_setup() {
        let config = RunConfig::resolve(
            ProviderKind::Mock,
            "mock",
            9,
            None,
            Some(1),
            Some(RunPreset::Budget),
        );
        let mut orchestrator = DebateOrchestrator::new();
        orchestrator
            .setup_debate("topic", config, mock_client(1))
            .unwrap();
        let state = orchestrator.get_debate_state();
        assert_eq!(state["total_rounds"], 2);
    }

    #[tokio::test]
    async fn test_trace_has_turns_and_cost() {
        let mut orchestrator = DebateOrchestrator::new();
        orchestrator
            .setup_debate("AI 将取代多数人类工作", mock_config(1, 3), mock_client(3))
            .unwrap();
        let (tx, mut rx) = mpsc::channel(256);
        let drain = tokio::spawn(async move { while rx.recv().await.is_some() {} });
        orchestrator.run(tx).await.unwrap();
        drain.await.unwrap();

        let trace = orchestrator.build_trace();
        assert_eq!(trace["turns"].as_array().unwrap().len(), 2);
        assert!(trace["cost"]["total_tokens"].as_u64().unwrap() > 0);
        assert!(trace["evaluations"].as_array().unwrap().len() == 1);
        assert!(!trace["message_history"].as_array().unwrap().is_empty());
    }
}
