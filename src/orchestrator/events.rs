//! Observable events emitted by the orchestrators.
//!
//! Events are tagged enums serialized with a `type` discriminator, so a
//! transport layer can frame them directly (see `utils::sse`). Consumers
//! must tolerate unknown kinds; producers never emit outside the closed
//! sets below.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agents::debater::Side;
use crate::agents::dialectic::Fallacy;
use crate::agents::evaluator::{Margin, RoundScore, Suggestions, Winner};
use crate::memory::dialectic::{EvolutionTree, TreeEdge, TreeNode};
use crate::memory::shared::MemoryStandings;

/// Events of a debate run, in emission order within a round:
/// `round_start`, `thinking`(pro), `argument`(pro), `thinking`(con),
/// `argument`(con), `evaluation`, `standings`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DebateEvent {
    Opening {
        content: String,
        topic: String,
        total_rounds: u32,
    },
    RoundStart {
        round: u32,
        total_rounds: u32,
    },
    Thinking {
        round: u32,
        side: Side,
        name: String,
        content: Value,
        confidence: f64,
    },
    Argument {
        round: u32,
        side: Side,
        name: String,
        content: String,
        complete: bool,
    },
    ArgumentComplete {
        round: u32,
        side: Side,
        name: String,
        content: String,
        complete: bool,
    },
    Evaluation {
        round: u32,
        pro_score: RoundScore,
        con_score: RoundScore,
        round_winner: Winner,
        commentary: String,
        highlights: Vec<String>,
        suggestions: Suggestions,
    },
    Standings {
        round: u32,
        standings: MemoryStandings,
    },
    Verdict {
        winner: Winner,
        pro_total_score: u32,
        con_total_score: u32,
        margin: Margin,
        summary: String,
        pro_strengths: Vec<String>,
        con_strengths: Vec<String>,
        key_turning_points: Vec<String>,
    },
    Complete {
        message: String,
        final_state: Value,
        message_history: Vec<Value>,
    },
    Error {
        message: String,
    },
}

impl DebateEvent {
    /// The round this event refers to, if any.
    pub fn round(&self) -> Option<u32> {
        match self {
            Self::RoundStart { round, .. }
            | Self::Thinking { round, .. }
            | Self::Argument { round, .. }
            | Self::ArgumentComplete { round, .. }
            | Self::Evaluation { round, .. }
            | Self::Standings { round, .. } => Some(*round),
            _ => None,
        }
    }

    /// The serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Opening { .. } => "opening",
            Self::RoundStart { .. } => "round_start",
            Self::Thinking { .. } => "thinking",
            Self::Argument { .. } => "argument",
            Self::ArgumentComplete { .. } => "argument_complete",
            Self::Evaluation { .. } => "evaluation",
            Self::Standings { .. } => "standings",
            Self::Verdict { .. } => "verdict",
            Self::Complete { .. } => "complete",
            Self::Error { .. } => "error",
        }
    }
}

/// Events of a dialectic run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DialecticEvent {
    Opening {
        topic: String,
        total_rounds: u32,
    },
    RoundStart {
        round: u32,
        thesis: String,
    },
    Thesis {
        round: u32,
        content: String,
        thinking: Value,
    },
    Antithesis {
        round: u32,
        content: String,
        thinking: Value,
    },
    Synthesis {
        round: u32,
        content: String,
        key_tensions: Vec<String>,
        confidence: f64,
    },
    Fallacy {
        round: u32,
        items: Vec<Fallacy>,
    },
    TreeUpdate {
        round: u32,
        nodes: Vec<TreeNode>,
        edges: Vec<TreeEdge>,
    },
    Complete {
        final_thesis: String,
        trace: Value,
        tree: EvolutionTree,
    },
    Error {
        message: String,
    },
}

impl DialecticEvent {
    /// The serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Opening { .. } => "opening",
            Self::RoundStart { .. } => "round_start",
            Self::Thesis { .. } => "thesis",
            Self::Antithesis { .. } => "antithesis",
            Self::Synthesis { .. } => "synthesis",
            Self::Fallacy { .. } => "fallacy",
            Self::TreeUpdate { .. } => "tree_update",
            Self::Complete { .. } => "complete",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debate_event_tags() {
        let event = DebateEvent::RoundStart {
            round: 1,
            total_rounds: 3,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "round_start");
        assert_eq!(json["round"], 1);

        let event = DebateEvent::ArgumentComplete {
            round: 2,
            side: Side::Con,
            name: "Con".to_string(),
            content: "done".to_string(),
            complete: true,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "argument_complete");
        assert_eq!(json["side"], "con");
        assert_eq!(json["complete"], true);
    }

    #[test]
    fn test_round_accessor() {
        let with_round = DebateEvent::Standings {
            round: 2,
            standings: crate::memory::shared::MemoryStandings {
                current_round: 2,
                total_rounds: 3,
                pro_total_score: 0,
                con_total_score: 0,
                pro_round_wins: 0,
                con_round_wins: 0,
                ties: 0,
                status: crate::memory::shared::DebateStatus::InProgress,
            },
        };
        assert_eq!(with_round.round(), Some(2));

        let without = DebateEvent::Error {
            message: "x".to_string(),
        };
        assert_eq!(without.round(), None);
    }

    #[test]
    fn test_dialectic_event_tags() {
        let event = DialecticEvent::TreeUpdate {
            round: 1,
            nodes: Vec::new(),
            edges: Vec::new(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "tree_update");
    }
}
