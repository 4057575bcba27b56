//! Dialectic memory and the argument evolution tree.
//!
//! Stores one record per completed thesis/antithesis/synthesis round and
//! lays the rounds out as a visualisation-ready tree: three nodes per
//! round at fixed columns and rows, with ascent edges carrying each
//! synthesis into the next round's thesis.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::agents::dialectic::{DialecticHistoryEntry, Fallacy};

/// Horizontal gap between round columns.
const COLUMN_GAP: f64 = 260.0;

/// Vertical rows for the three node kinds.
const ROW_THESIS: f64 = 0.0;
const ROW_ANTITHESIS: f64 = 140.0;
const ROW_SYNTHESIS: f64 = 280.0;

/// One completed dialectic round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialecticRoundRecord {
    pub round: u32,
    pub thesis: String,
    pub antithesis: String,
    pub synthesis: String,
    #[serde(default)]
    pub fallacies: Vec<Fallacy>,
    pub timestamp: DateTime<Utc>,
}

/// Kind of an evolution-tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeNodeKind {
    Thesis,
    Antithesis,
    Synthesis,
}

/// Position of a node on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreePosition {
    pub x: f64,
    pub y: f64,
}

/// A node of the argument evolution tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeNode {
    pub id: String,
    pub kind: TreeNodeKind,
    pub round: u32,
    pub label: String,
    pub position: TreePosition,
}

/// An edge of the argument evolution tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    pub label: String,
}

/// The full tree: 3 nodes per round, 3 intra-round edges plus an ascent
/// edge for every round but the last.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionTree {
    pub nodes: Vec<TreeNode>,
    pub edges: Vec<TreeEdge>,
}

/// Memory for one dialectic session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialecticMemory {
    pub topic: String,
    pub total_rounds: u32,
    rounds: Vec<DialecticRoundRecord>,
}

impl DialecticMemory {
    pub fn new(topic: impl Into<String>, total_rounds: u32) -> Self {
        Self {
            topic: topic.into(),
            total_rounds,
            rounds: Vec::new(),
        }
    }

    pub fn rounds(&self) -> &[DialecticRoundRecord] {
        &self.rounds
    }

    /// Appends a completed round.
    pub fn add_round(
        &mut self,
        round: u32,
        thesis: impl Into<String>,
        antithesis: impl Into<String>,
        synthesis: impl Into<String>,
        fallacies: Vec<Fallacy>,
    ) -> &DialecticRoundRecord {
        self.rounds.push(DialecticRoundRecord {
            round,
            thesis: thesis.into(),
            antithesis: antithesis.into(),
            synthesis: synthesis.into(),
            fallacies,
            timestamp: Utc::now(),
        });
        self.rounds.last().expect("round just appended")
    }

    /// History entries for prompt context.
    pub fn history(&self) -> Vec<DialecticHistoryEntry> {
        self.rounds
            .iter()
            .map(|r| DialecticHistoryEntry {
                round: r.round,
                thesis: r.thesis.clone(),
                antithesis: r.antithesis.clone(),
                synthesis: r.synthesis.clone(),
            })
            .collect()
    }

    /// Builds the argument evolution tree over the recorded rounds.
    pub fn build_tree(&self) -> EvolutionTree {
        let mut tree = EvolutionTree::default();

        for record in &self.rounds {
            let x = f64::from(record.round - 1) * COLUMN_GAP;
            let t_id = format!("t{}", record.round);
            let a_id = format!("a{}", record.round);
            let s_id = format!("s{}", record.round);

            tree.nodes.push(TreeNode {
                id: t_id.clone(),
                kind: TreeNodeKind::Thesis,
                round: record.round,
                label: record.thesis.clone(),
                position: TreePosition { x, y: ROW_THESIS },
            });
            tree.nodes.push(TreeNode {
                id: a_id.clone(),
                kind: TreeNodeKind::Antithesis,
                round: record.round,
                label: record.antithesis.clone(),
                position: TreePosition { x, y: ROW_ANTITHESIS },
            });
            tree.nodes.push(TreeNode {
                id: s_id.clone(),
                kind: TreeNodeKind::Synthesis,
                round: record.round,
                label: record.synthesis.clone(),
                position: TreePosition { x, y: ROW_SYNTHESIS },
            });

            tree.edges.push(TreeEdge {
                id: format!("e_{t_id}_{a_id}"),
                source: t_id.clone(),
                target: a_id.clone(),
                label: "antithesis".to_string(),
            });
            tree.edges.push(TreeEdge {
                id: format!("e_{t_id}_{s_id}"),
                source: t_id.clone(),
                target: s_id.clone(),
                label: "synthesis".to_string(),
            });
            tree.edges.push(TreeEdge {
                id: format!("e_{a_id}_{s_id}"),
                source: a_id,
                target: s_id.clone(),
                label: "synthesis".to_string(),
            });

            // The synthesis ascends into the next round's thesis.
            if record.round < self.total_rounds {
                let next_t = format!("t{}", record.round + 1);
                tree.edges.push(TreeEdge {
                    id: format!("e_{s_id}_{next_t}"),
                    source: s_id,
                    target: next_t,
                    label: "ascent".to_string(),
                });
            }
        }

        tree
    }

    /// Serializes the full session trace.
    pub fn build_trace(&self) -> Value {
        serde_json::json!({
            "topic": self.topic,
            "total_rounds": self.total_rounds,
            "rounds": self.rounds,
            "created_at": self.rounds.first().map(|r| r.timestamp),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn filled_memory(total_rounds: u32, completed: u32) -> DialecticMemory {
        let mut memory = DialecticMemory::new("What is knowledge?", total_rounds);
        for round in 1..=completed {
            memory.add_round(
                round,
                format!("thesis {round}"),
                format!("antithesis {round}"),
                format!("synthesis {round}"),
                Vec::new(),
            );
        }
        memory
    }

    #[test]
    fn test_tree_shape_five_rounds() {
        let memory = filled_memory(5, 5);
        let tree = memory.build_tree();
        assert_eq!(tree.nodes.len(), 15);
        assert_eq!(tree.edges.len(), 19); // 15 intra-round + 4 ascent
    }

    #[test]
    fn test_ascent_edges_only_before_last_round() {
        let memory = filled_memory(5, 5);
        let tree = memory.build_tree();
        let ascents: Vec<&TreeEdge> =
            tree.edges.iter().filter(|e| e.label == "ascent").collect();
        assert_eq!(ascents.len(), 4);
        for (i, edge) in ascents.iter().enumerate() {
            let round = i as u32 + 1;
            assert_eq!(edge.source, format!("s{round}"));
            assert_eq!(edge.target, format!("t{}", round + 1));
        }
        assert!(!tree.edges.iter().any(|e| e.source == "s5" && e.label == "ascent"));
    }

    #[test]
    fn test_node_positions() {
        let memory = filled_memory(5, 2);
        let tree = memory.build_tree();
        let t2 = tree.nodes.iter().find(|n| n.id == "t2").unwrap();
        assert!((t2.position.x - 260.0).abs() < 1e-9);
        assert!((t2.position.y - 0.0).abs() < 1e-9);
        let s1 = tree.nodes.iter().find(|n| n.id == "s1").unwrap();
        assert!((s1.position.y - 280.0).abs() < 1e-9);
    }

    #[test]
    fn test_trace_contains_rounds() {
        let memory = filled_memory(5, 3);
        let trace = memory.build_trace();
        assert_eq!(trace["total_rounds"], 5);
        assert_eq!(trace["rounds"].as_array().unwrap().len(), 3);
        assert_eq!(trace["rounds"][0]["thesis"], "thesis 1");
    }
}
