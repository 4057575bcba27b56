//! Dialectic orchestrator: the thesis -> antithesis -> synthesis loop.
//!
//! Each round argues the standing thesis, negates it, fuses both into a
//! synthesis, and scans the exchange for fallacies; the synthesis then
//! ascends to become the next round's thesis. Round records accumulate
//! in dialectic memory, which rebuilds the argument evolution tree after
//! every round.

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::mpsc;

use super::events::DialecticEvent;
use crate::agents::base::Agent;
use crate::agents::dialectic::{
    AntithesisAgent, AntithesisContext, ObserverAgent, ThesisAgent, ThesisContext,
};
use crate::agents::error::AgentResult;
use crate::config::{clamp_dialectic_rounds, validate_topic, RunConfig};
use crate::error::ConfigError;
use crate::llm::{CompletionParams, LlmClient};
use crate::memory::dialectic::DialecticMemory;

/// Orchestrates one dialectic session.
pub struct DialecticOrchestrator {
    topic: String,
    total_rounds: u32,
    current_round: u32,
    run_config: Option<RunConfig>,
    memory: Option<DialecticMemory>,
    thesis_agent: Option<ThesisAgent>,
    antithesis_agent: Option<AntithesisAgent>,
    observer: Option<ObserverAgent>,
}

impl Default for DialecticOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl DialecticOrchestrator {
    pub fn new() -> Self {
        Self {
            topic: String::new(),
            total_rounds: 0,
            current_round: 0,
            run_config: None,
            memory: None,
            thesis_agent: None,
            antithesis_agent: None,
            observer: None,
        }
    }

    pub fn memory(&self) -> Option<&DialecticMemory> {
        self.memory.as_ref()
    }

    /// Validates the topic, clamps the round count into [5, 10], and
    /// creates the agent trio.
    pub fn setup(
        &mut self,
        topic: &str,
        config: RunConfig,
        client: Arc<dyn LlmClient>,
    ) -> Result<Value, ConfigError> {
        validate_topic(topic)?;
        let total_rounds = clamp_dialectic_rounds(config.max_rounds);

        let params = CompletionParams::new()
            .with_temperature(config.temperature)
            .with_seed(config.seed);
        // The observer runs cooler than the debaters.
        let observer_params = params
            .clone()
            .with_temperature((config.temperature - 0.2).max(0.2));

        self.topic = topic.to_string();
        self.total_rounds = total_rounds;
        self.current_round = 0;
        self.memory = Some(DialecticMemory::new(topic, total_rounds));
        self.thesis_agent = Some(ThesisAgent::new(Arc::clone(&client), params.clone()));
        self.antithesis_agent = Some(AntithesisAgent::new(Arc::clone(&client), params));
        self.observer = Some(ObserverAgent::new(client, observer_params));
        self.run_config = Some(RunConfig {
            max_rounds: total_rounds,
            ..config
        });

        Ok(json!({
            "status": "ready",
            "topic": topic,
            "total_rounds": total_rounds,
            "run_config": self.run_config,
        }))
    }

    /// Runs the full dialectic loop, emitting events to the consumer.
    pub async fn run(&mut self, tx: mpsc::Sender<DialecticEvent>) -> AgentResult<()> {
        if self.memory.is_none() {
            let _ = tx
                .send(DialecticEvent::Error {
                    message: "Dialectic engine is not initialised; call setup first".to_string(),
                })
                .await;
            return Ok(());
        }

        let total_rounds = self.total_rounds;
        let mut current_thesis = self.topic.clone();

        if !emit(
            &tx,
            DialecticEvent::Opening {
                topic: self.topic.clone(),
                total_rounds,
            },
        )
        .await
        {
            return Ok(());
        }

        for round in 1..=total_rounds {
            self.current_round = round;

            if !emit(
                &tx,
                DialecticEvent::RoundStart {
                    round,
                    thesis: current_thesis.clone(),
                },
            )
            .await
            {
                return Ok(());
            }

            let history = self
                .memory
                .as_ref()
                .map(|m| m.history())
                .unwrap_or_default();

            // Thesis.
            let Some(thesis_agent) = self.thesis_agent.as_mut() else {
                return Ok(());
            };
            let (thesis_think, thesis_text) = thesis_agent
                .react(&ThesisContext {
                    round,
                    thesis: current_thesis.clone(),
                    history: history.clone(),
                })
                .await?;
            if !emit(
                &tx,
                DialecticEvent::Thesis {
                    round,
                    content: thesis_text.clone(),
                    thinking: thesis_think.analysis,
                },
            )
            .await
            {
                return Ok(());
            }

            // Antithesis.
            let Some(antithesis_agent) = self.antithesis_agent.as_mut() else {
                return Ok(());
            };
            let (antithesis_think, antithesis_text) = antithesis_agent
                .react(&AntithesisContext {
                    round,
                    thesis: current_thesis.clone(),
                    thesis_argument: thesis_text.clone(),
                })
                .await?;
            if !emit(
                &tx,
                DialecticEvent::Antithesis {
                    round,
                    content: antithesis_text.clone(),
                    thinking: antithesis_think.analysis,
                },
            )
            .await
            {
                return Ok(());
            }

            // Synthesis and fallacy scan.
            let Some(observer) = self.observer.as_mut() else {
                return Ok(());
            };
            let synthesis = observer
                .synthesize(&thesis_text, &antithesis_text, round, &history)
                .await;
            if !emit(
                &tx,
                DialecticEvent::Synthesis {
                    round,
                    content: synthesis.synthesis.clone(),
                    key_tensions: synthesis.key_tensions.clone(),
                    confidence: synthesis.confidence,
                },
            )
            .await
            {
                return Ok(());
            }

            let fallacies = observer
                .detect_fallacies(&thesis_text, &antithesis_text)
                .await;
            if !emit(
                &tx,
                DialecticEvent::Fallacy {
                    round,
                    items: fallacies.clone(),
                },
            )
            .await
            {
                return Ok(());
            }

            // Record the round and refresh the tree.
            let tree = {
                let Some(memory) = self.memory.as_mut() else {
                    return Ok(());
                };
                memory.add_round(
                    round,
                    thesis_text,
                    antithesis_text,
                    synthesis.synthesis.clone(),
                    fallacies,
                );
                memory.build_tree()
            };
            if !emit(
                &tx,
                DialecticEvent::TreeUpdate {
                    round,
                    nodes: tree.nodes,
                    edges: tree.edges,
                },
            )
            .await
            {
                return Ok(());
            }

            // The synthesis ascends into the next round.
            current_thesis = synthesis.synthesis;
        }

        let (trace, tree) = match self.memory.as_ref() {
            Some(memory) => (memory.build_trace(), memory.build_tree()),
            None => (Value::Null, Default::default()),
        };
        let _ = tx
            .send(DialecticEvent::Complete {
                final_thesis: current_thesis,
                trace,
                tree,
            })
            .await;

        Ok(())
    }

    /// Serializable trace of the session, including the run config.
    pub fn build_trace(&self) -> Value {
        let Some(memory) = self.memory.as_ref() else {
            return json!({});
        };
        let mut trace = memory.build_trace();
        if let Value::Object(map) = &mut trace {
            map.insert(
                "run_config".to_string(),
                serde_json::to_value(&self.run_config).unwrap_or(Value::Null),
            );
            let final_thesis = memory
                .rounds()
                .last()
                .map(|r| Value::String(r.synthesis.clone()))
                .unwrap_or(Value::Null);
            map.insert("final_thesis".to_string(), final_thesis);
        }
        trace
    }
}

async fn emit(tx: &mpsc::Sender<DialecticEvent>, event: DialecticEvent) -> bool {
    tx.send(event).await.is_ok()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;
    use crate::llm::MockProvider;

    fn mock_config(rounds: u32) -> RunConfig {
        RunConfig::resolve(ProviderKind::Mock, "mock", rounds, Some(0.7), Some(21), None)
    }

    async fn run_dialectic(rounds: u32) -> (DialecticOrchestrator, Vec<DialecticEvent>) {
        let mut orchestrator = DialecticOrchestrator::new();
        orchestrator
            .setup(
                "Does technology expand human freedom?",
                mock_config(rounds),
                Arc::new(MockProvider::new("mock", Some(21))),
            )
            .unwrap();

        let (tx, mut rx) = mpsc::channel(512);
        let collect = tokio::spawn(async move {
            let mut events = Vec::new();
            while let Some(event) = rx.recv().await {
                events.push(event);
            }
            events
        });
        orchestrator.run(tx).await.unwrap();
        let events = collect.await.unwrap();
        (orchestrator, events)
    }

    fn count_kind(events: &[DialecticEvent], kind: &str) -> usize {
        events.iter().filter(|e| e.kind() == kind).count()
    }

    #[tokio::test]
    async fn test_round_clamp_applied_at_setup() {
        let mut orchestrator = DialecticOrchestrator::new();
        let summary = orchestrator
            .setup(
                "topic",
                mock_config(1),
                Arc::new(MockProvider::new("mock", Some(1))),
            )
            .unwrap();
        assert_eq!(summary["total_rounds"], 5);

        let summary = orchestrator
            .setup(
                "topic",
                mock_config(12),
                Arc::new(MockProvider::new("mock", Some(1))),
            )
            .unwrap();
        assert_eq!(summary["total_rounds"], 10);
    }

    #[tokio::test]
    async fn test_run_without_setup_emits_error() {
        let mut orchestrator = DialecticOrchestrator::new();
        let (tx, mut rx) = mpsc::channel(4);
        orchestrator.run(tx).await.unwrap();
        let event = rx.recv().await.unwrap();
        assert_eq!(event.kind(), "error");
    }

    #[tokio::test]
    async fn test_five_round_loop_event_counts() {
        let (_orchestrator, events) = run_dialectic(5).await;

        assert_eq!(count_kind(&events, "opening"), 1);
        assert_eq!(count_kind(&events, "round_start"), 5);
        assert_eq!(count_kind(&events, "thesis"), 5);
        assert_eq!(count_kind(&events, "antithesis"), 5);
        assert_eq!(count_kind(&events, "synthesis"), 5);
        assert_eq!(count_kind(&events, "fallacy"), 5);
        assert_eq!(count_kind(&events, "tree_update"), 5);
        assert_eq!(count_kind(&events, "complete"), 1);
    }

    #[tokio::test]
    async fn test_final_tree_shape() {
        let (orchestrator, events) = run_dialectic(5).await;

        let tree = orchestrator.memory().unwrap().build_tree();
        assert_eq!(tree.nodes.len(), 15);
        assert_eq!(tree.edges.len(), 19);

        // The complete event carries the same tree.
        let complete_tree = events.iter().rev().find_map(|e| match e {
            DialecticEvent::Complete { tree, .. } => Some(tree),
            _ => None,
        });
        assert_eq!(complete_tree.unwrap().nodes.len(), 15);
    }

    #[tokio::test]
    async fn test_synthesis_becomes_next_thesis() {
        let (_orchestrator, events) = run_dialectic(5).await;

        let syntheses: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                DialecticEvent::Synthesis { content, .. } => Some(content.as_str()),
                _ => None,
            })
            .collect();
        let round_starts: Vec<&str> = events
            .iter()
            .filter_map(|e| match e {
                DialecticEvent::RoundStart { thesis, .. } => Some(thesis.as_str()),
                _ => None,
            })
            .collect();

        // Round r+1 opens on round r's synthesis.
        for (i, thesis) in round_starts.iter().enumerate().skip(1) {
            assert_eq!(*thesis, syntheses[i - 1]);
        }
        assert_eq!(round_starts[0], "Does technology expand human freedom?");
    }

    #[tokio::test]
    async fn test_trace_includes_run_config() {
        let (orchestrator, _events) = run_dialectic(5).await;
        let trace = orchestrator.build_trace();
        assert_eq!(trace["run_config"]["provider"], "mock");
        assert_eq!(trace["rounds"].as_array().unwrap().len(), 5);
        assert!(trace["final_thesis"].is_string());
    }
}
