//! Shared debate memory: the append-only per-session transcript.
//!
//! Owned by one orchestrator, read by everything else. Stores the
//! utterances, round evaluations and event log of a debate, derives the
//! live standings, and serializes to a full-state JSON that reconstructs
//! an equal memory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agents::debater::{HistoryEntry, Side};
use crate::agents::evaluator::{FinalVerdict, RoundEvaluation, Winner};
use crate::utils::text::truncate_chars;

/// Lifecycle of a debate session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebateStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// One recorded utterance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgumentRecord {
    pub id: String,
    pub round: u32,
    pub side: Side,
    pub agent_name: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thinking: Option<Value>,
    pub timestamp: DateTime<Utc>,
}

/// One entry in the memory's event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateMemoryEvent {
    pub event_type: String,
    #[serde(default)]
    pub round: u32,
    #[serde(default)]
    pub agent: String,
    pub content: Value,
    pub timestamp: DateTime<Utc>,
}

/// Live standings derived from the recorded evaluations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStandings {
    pub current_round: u32,
    pub total_rounds: u32,
    pub pro_total_score: u32,
    pub con_total_score: u32,
    pub pro_round_wins: u32,
    pub con_round_wins: u32,
    pub ties: u32,
    pub status: DebateStatus,
}

/// Append-only shared memory for one debate session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateMemory {
    pub topic: String,
    pub total_rounds: u32,
    pub current_round: u32,
    pub status: DebateStatus,
    arguments: Vec<ArgumentRecord>,
    evaluations: Vec<RoundEvaluation>,
    events: Vec<DebateMemoryEvent>,
    pro_total: u32,
    con_total: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    verdict: Option<FinalVerdict>,
}

impl DebateMemory {
    pub fn new(topic: impl Into<String>, total_rounds: u32) -> Self {
        Self {
            topic: topic.into(),
            total_rounds,
            current_round: 0,
            status: DebateStatus::NotStarted,
            arguments: Vec::new(),
            evaluations: Vec::new(),
            events: Vec::new(),
            pro_total: 0,
            con_total: 0,
            verdict: None,
        }
    }

    fn push_event(&mut self, event_type: &str, round: u32, agent: &str, content: Value) {
        self.events.push(DebateMemoryEvent {
            event_type: event_type.to_string(),
            round,
            agent: agent.to_string(),
            content,
            timestamp: Utc::now(),
        });
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    pub fn start_debate(&mut self) {
        self.status = DebateStatus::InProgress;
        self.current_round = 1;
        self.push_event(
            "debate_start",
            0,
            "",
            serde_json::json!({ "topic": self.topic, "total_rounds": self.total_rounds }),
        );
    }

    pub fn start_round(&mut self, round: u32) {
        self.current_round = round;
        self.push_event("round_start", round, "", Value::Null);
    }

    /// Appends an utterance for the current round.
    pub fn add_argument(
        &mut self,
        side: Side,
        agent_name: &str,
        content: &str,
        thinking: Option<Value>,
    ) -> &ArgumentRecord {
        let record = ArgumentRecord {
            id: format!("arg_{}_{}", self.current_round, side.as_str()),
            round: self.current_round,
            side,
            agent_name: agent_name.to_string(),
            content: content.to_string(),
            thinking,
            timestamp: Utc::now(),
        };
        self.arguments.push(record);

        let preview = truncate_chars(content, 100);
        let round = self.current_round;
        self.push_event(
            "argument",
            round,
            agent_name,
            serde_json::json!({ "side": side.as_str(), "content_preview": preview }),
        );

        self.arguments.last().expect("argument just appended")
    }

    /// Appends a round evaluation and folds its sub-score sums into the
    /// running totals.
    pub fn add_evaluation(&mut self, evaluation: &RoundEvaluation) {
        self.pro_total += evaluation.pro_score.total();
        self.con_total += evaluation.con_score.total();
        self.push_event(
            "evaluation",
            evaluation.round,
            "",
            serde_json::json!({ "winner": evaluation.round_winner.as_str() }),
        );
        self.evaluations.push(evaluation.clone());
    }

    pub fn end_round(&mut self, round: u32) {
        self.push_event("round_end", round, "", Value::Null);
    }

    pub fn complete_debate(&mut self, verdict: Option<FinalVerdict>) {
        self.status = DebateStatus::Completed;
        let verdict_value = verdict
            .as_ref()
            .map(|v| serde_json::to_value(v).unwrap_or(Value::Null))
            .unwrap_or(Value::Null);
        self.verdict = verdict;
        self.push_event("debate_complete", self.current_round, "", verdict_value);
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn arguments(&self) -> &[ArgumentRecord] {
        &self.arguments
    }

    pub fn evaluations(&self) -> &[RoundEvaluation] {
        &self.evaluations
    }

    pub fn events(&self) -> &[DebateMemoryEvent] {
        &self.events
    }

    pub fn verdict(&self) -> Option<&FinalVerdict> {
        self.verdict.as_ref()
    }

    pub fn get_round_arguments(&self, round: u32) -> Vec<&ArgumentRecord> {
        self.arguments.iter().filter(|a| a.round == round).collect()
    }

    pub fn get_side_arguments(&self, side: Side) -> Vec<&ArgumentRecord> {
        self.arguments.iter().filter(|a| a.side == side).collect()
    }

    /// Last utterance overall, or the last from one side.
    pub fn get_last_argument(&self, side: Option<Side>) -> Option<&ArgumentRecord> {
        match side {
            None => self.arguments.last(),
            Some(side) => self.arguments.iter().rev().find(|a| a.side == side),
        }
    }

    pub fn get_current_standings(&self) -> MemoryStandings {
        let wins = |winner: Winner| -> u32 {
            self.evaluations
                .iter()
                .filter(|e| e.round_winner == winner)
                .count() as u32
        };

        MemoryStandings {
            current_round: self.current_round,
            total_rounds: self.total_rounds,
            pro_total_score: self.pro_total,
            con_total_score: self.con_total,
            pro_round_wins: wins(Winner::Pro),
            con_round_wins: wins(Winner::Con),
            ties: wins(Winner::Tie),
            status: self.status,
        }
    }

    /// The transcript as turn-context history entries.
    pub fn get_debate_history(&self) -> Vec<HistoryEntry> {
        self.arguments
            .iter()
            .map(|a| HistoryEntry {
                round: a.round,
                side: a.side,
                content: a.content.clone(),
            })
            .collect()
    }

    /// Serializes the complete state.
    pub fn get_full_state(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Reconstructs a memory from its full-state JSON.
    pub fn from_full_state(state: Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(state)
    }

    /// Renders the transcript as Markdown.
    pub fn export_transcript(&self) -> String {
        let mut lines = vec![
            "# Debate Transcript".to_string(),
            String::new(),
            format!("**Topic**: {}", self.topic),
            format!("**Rounds**: {}", self.total_rounds),
            format!(
                "**Status**: {}",
                serde_json::to_value(self.status)
                    .ok()
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default()
            ),
            String::new(),
            "---".to_string(),
            String::new(),
        ];

        for round in 1..=self.current_round {
            lines.push(format!("## Round {round}"));
            lines.push(String::new());

            for argument in self.get_round_arguments(round) {
                let label = match argument.side {
                    Side::Pro => "Pro",
                    Side::Con => "Con",
                };
                lines.push(format!("### {label}"));
                lines.push(String::new());
                lines.push(argument.content.clone());
                lines.push(String::new());
            }

            for evaluation in self.evaluations.iter().filter(|e| e.round == round) {
                lines.push(format!("**Judge's commentary**: {}", evaluation.commentary));
                lines.push(format!(
                    "**Round winner**: {}",
                    evaluation.round_winner.as_str()
                ));
                lines.push(String::new());
            }

            lines.push("---".to_string());
            lines.push(String::new());
        }

        let standings = self.get_current_standings();
        lines.push("## Final Score".to_string());
        lines.push(String::new());
        lines.push(format!("- Pro total: {}", standings.pro_total_score));
        lines.push(format!("- Con total: {}", standings.con_total_score));
        lines.push(format!("- Pro round wins: {}", standings.pro_round_wins));
        lines.push(format!("- Con round wins: {}", standings.con_round_wins));

        lines.join("\n")
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::evaluator::{RoundScore, Suggestions};

    fn evaluation(round: u32, pro: u8, con: u8, winner: Winner) -> RoundEvaluation {
        RoundEvaluation {
            round,
            pro_score: RoundScore::new(pro, pro, pro, pro),
            con_score: RoundScore::new(con, con, con, con),
            round_winner: winner,
            commentary: "solid round".to_string(),
            highlights: Vec::new(),
            suggestions: Suggestions::default(),
        }
    }

    fn populated_memory() -> DebateMemory {
        let mut memory = DebateMemory::new("AI will replace most human jobs", 2);
        memory.start_debate();
        memory.start_round(1);
        memory.add_argument(Side::Pro, "Pro", "pro r1", None);
        memory.add_argument(Side::Con, "Con", "con r1", None);
        memory.add_evaluation(&evaluation(1, 7, 6, Winner::Pro));
        memory.end_round(1);
        memory.start_round(2);
        memory.add_argument(Side::Pro, "Pro", "pro r2", Some(serde_json::json!({"s": 1})));
        memory.add_argument(Side::Con, "Con", "con r2", None);
        memory.add_evaluation(&evaluation(2, 6, 8, Winner::Con));
        memory.end_round(2);
        memory
    }

    #[test]
    fn test_running_totals_equal_sum_of_subscores() {
        let memory = populated_memory();
        let standings = memory.get_current_standings();
        assert_eq!(standings.pro_total_score, 7 * 4 + 6 * 4);
        assert_eq!(standings.con_total_score, 6 * 4 + 8 * 4);
        assert_eq!(standings.pro_round_wins, 1);
        assert_eq!(standings.con_round_wins, 1);
        assert_eq!(standings.ties, 0);
    }

    #[test]
    fn test_round_numbers_monotonic() {
        let memory = populated_memory();
        let rounds: Vec<u32> = memory.arguments().iter().map(|a| a.round).collect();
        assert!(rounds.windows(2).all(|w| w[0] <= w[1]));
        let eval_rounds: Vec<u32> = memory.evaluations().iter().map(|e| e.round).collect();
        assert!(eval_rounds.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_queries() {
        let memory = populated_memory();
        assert_eq!(memory.get_round_arguments(1).len(), 2);
        assert_eq!(memory.get_side_arguments(Side::Pro).len(), 2);
        assert_eq!(memory.get_last_argument(None).unwrap().content, "con r2");
        assert_eq!(
            memory.get_last_argument(Some(Side::Pro)).unwrap().content,
            "pro r2"
        );
        assert_eq!(memory.get_debate_history().len(), 4);
    }

    #[test]
    fn test_completed_state_holds_verdict() {
        let mut memory = populated_memory();
        memory.complete_debate(Some(FinalVerdict::neutral("done")));
        assert_eq!(memory.status, DebateStatus::Completed);
        assert!(memory.verdict().is_some());
    }

    #[test]
    fn test_full_state_round_trip() {
        let mut memory = populated_memory();
        memory.complete_debate(Some(FinalVerdict::neutral("done")));

        let state = memory.get_full_state();
        let rebuilt = DebateMemory::from_full_state(state.clone()).unwrap();

        assert_eq!(rebuilt.get_full_state(), state);
        assert_eq!(rebuilt.arguments().len(), memory.arguments().len());
        assert_eq!(rebuilt.status, DebateStatus::Completed);
        let standings = rebuilt.get_current_standings();
        assert_eq!(standings.pro_total_score, 52);
    }

    #[test]
    fn test_export_transcript_shape() {
        let memory = populated_memory();
        let transcript = memory.export_transcript();
        assert!(transcript.contains("# Debate Transcript"));
        assert!(transcript.contains("## Round 1"));
        assert!(transcript.contains("## Round 2"));
        assert!(transcript.contains("### Pro"));
        assert!(transcript.contains("pro r2"));
        assert!(transcript.contains("- Pro total: 52"));
    }

    #[test]
    fn test_event_log_order() {
        let memory = populated_memory();
        let kinds: Vec<&str> = memory.events().iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(
            kinds,
            vec![
                "debate_start",
                "round_start",
                "argument",
                "argument",
                "evaluation",
                "round_end",
                "round_start",
                "argument",
                "argument",
                "evaluation",
                "round_end",
            ]
        );
    }
}
