//! Argument graph: the relational model over a debate transcript.
//!
//! Nodes are utterances, edges are inferred relations between them
//! (attack, support, and their variants). The graph derives a score for
//! each side from node strength, rebuttal state and attack edges, and
//! exports JSON and Mermaid renderings for visualisation.
//!
//! Construction from a transcript uses a positional heuristic by
//! default: every adjacent pair of utterances gets an `attacks` edge
//! when the authors differ, `builds_on` otherwise. The AI-driven
//! [`ArgumentAnalyzer`] can replace that heuristic with model-derived
//! relations.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::agents::base::extract_json;
use crate::agents::debater::{HistoryEntry, Side};
use crate::agents::evaluator::Winner;
use crate::llm::{CompletionParams, LlmClient, Message};
use crate::utils::text::truncate_chars;

/// Content shorter than this is a weak argument.
const WEAK_CONTENT_CHARS: usize = 100;

/// Content longer than this is a strong argument.
const STRONG_CONTENT_CHARS: usize = 400;

/// Default strength for heuristic attack edges.
const HEURISTIC_ATTACK_STRENGTH: f64 = 0.6;

/// Default strength for heuristic builds-on edges.
const HEURISTIC_BUILDS_ON_STRENGTH: f64 = 0.5;

// ============================================================================
// Relations, strengths, nodes, edges
// ============================================================================

/// Relation between two arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    /// Reinforces an argument on the same side.
    Supports,
    /// Directly refutes the opposing argument.
    Attacks,
    /// Targets the opposing argument's reasoning.
    Rebuts,
    /// Questions the opposing argument's evidential basis.
    Undermines,
    /// Develops a previous argument on the same side.
    BuildsOn,
}

impl RelationKind {
    /// Attack-class relations mark their target as rebutted.
    pub fn is_attack(&self) -> bool {
        matches!(self, Self::Attacks | Self::Rebuts | Self::Undermines)
    }

    /// Support-class relations credit their source.
    pub fn is_support(&self) -> bool {
        matches!(self, Self::Supports | Self::BuildsOn)
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "supports" => Some(Self::Supports),
            "attacks" => Some(Self::Attacks),
            "rebuts" => Some(Self::Rebuts),
            "undermines" => Some(Self::Undermines),
            "builds_on" => Some(Self::BuildsOn),
            _ => None,
        }
    }
}

/// Strength band of an argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentStrength {
    Weak,
    Moderate,
    Strong,
    Decisive,
}

impl ArgumentStrength {
    /// Numeric weight used by the scoring formula.
    pub fn value(&self) -> u32 {
        match self {
            Self::Weak => 1,
            Self::Moderate => 2,
            Self::Strong => 3,
            Self::Decisive => 4,
        }
    }

    /// Infers strength from content length.
    pub fn from_content(content: &str) -> Self {
        let chars = content.chars().count();
        if chars < WEAK_CONTENT_CHARS {
            Self::Weak
        } else if chars > STRONG_CONTENT_CHARS {
            Self::Strong
        } else {
            Self::Moderate
        }
    }
}

/// What kind of move an utterance makes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgumentType {
    Claim,
    Evidence,
    Rebuttal,
    Example,
}

/// One utterance in the graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgumentNode {
    pub id: String,
    pub content: String,
    pub author: Side,
    pub round: u32,
    pub argument_type: ArgumentType,
    pub strength: ArgumentStrength,
    pub is_rebutted: bool,
    pub rebuttal_count: u32,
    pub support_count: u32,
    #[serde(default)]
    pub key_points: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl ArgumentNode {
    fn to_export(&self) -> Value {
        json!({
            "id": self.id,
            "content": truncate_chars(&self.content, 200),
            "author": self.author.as_str(),
            "round": self.round,
            "type": self.argument_type,
            "strength": self.strength,
            "is_rebutted": self.is_rebutted,
            "rebuttal_count": self.rebuttal_count,
            "support_count": self.support_count,
            "key_points": self.key_points,
        })
    }
}

/// A relation edge between two arguments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArgumentEdge {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub relation: RelationKind,
    pub strength: f64,
    pub description: String,
}

/// Derived scoring over the whole graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DebateScore {
    pub pro_score: f64,
    pub con_score: f64,
    pub pro_percentage: f64,
    pub con_percentage: f64,
    pub leader: Winner,
    pub pro_unaddressed: u32,
    pub con_unaddressed: u32,
    pub total_arguments: usize,
    pub total_relations: usize,
}

// ============================================================================
// Graph
// ============================================================================

/// The argument graph for one debate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArgumentGraph {
    pub topic: String,
    nodes: Vec<ArgumentNode>,
    edges: Vec<ArgumentEdge>,
    #[serde(skip)]
    node_index: HashMap<String, usize>,
    node_counter: u32,
    edge_counter: u32,
}

impl ArgumentGraph {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    pub fn nodes(&self) -> &[ArgumentNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[ArgumentEdge] {
        &self.edges
    }

    pub fn get_node(&self, id: &str) -> Option<&ArgumentNode> {
        self.node_index.get(id).map(|&i| &self.nodes[i])
    }

    /// Adds an argument node and returns its id.
    pub fn add_argument(
        &mut self,
        content: &str,
        author: Side,
        round: u32,
        argument_type: ArgumentType,
        key_points: Vec<String>,
        strength: ArgumentStrength,
    ) -> String {
        self.node_counter += 1;
        let id = format!("arg_{}_{}_{}", round, author.as_str(), self.node_counter);

        self.nodes.push(ArgumentNode {
            id: id.clone(),
            content: content.to_string(),
            author,
            round,
            argument_type,
            strength,
            is_rebutted: false,
            rebuttal_count: 0,
            support_count: 0,
            key_points,
            timestamp: Utc::now(),
        });
        self.node_index.insert(id.clone(), self.nodes.len() - 1);
        id
    }

    /// Adds a relation between two existing nodes; returns the edge id,
    /// or `None` when either endpoint is unknown.
    ///
    /// Attack-class relations mark the target as rebutted and bump its
    /// rebuttal counter; support-class relations bump the source's
    /// support counter.
    pub fn add_relation(
        &mut self,
        source_id: &str,
        target_id: &str,
        relation: RelationKind,
        strength: f64,
        description: &str,
    ) -> Option<String> {
        let &source_idx = self.node_index.get(source_id)?;
        let &target_idx = self.node_index.get(target_id)?;

        self.edge_counter += 1;
        let id = format!("edge_{}", self.edge_counter);
        self.edges.push(ArgumentEdge {
            id: id.clone(),
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            relation,
            strength: strength.clamp(0.0, 1.0),
            description: description.to_string(),
        });

        if relation.is_attack() {
            let target = &mut self.nodes[target_idx];
            target.is_rebutted = true;
            target.rebuttal_count += 1;
        } else if relation.is_support() {
            self.nodes[source_idx].support_count += 1;
        }

        Some(id)
    }

    /// Opponent arguments the given side has not yet rebutted.
    pub fn get_unaddressed_arguments(&self, side: Side) -> Vec<&ArgumentNode> {
        let opponent = side.opponent();
        self.nodes
            .iter()
            .filter(|n| n.author == opponent && !n.is_rebutted)
            .collect()
    }

    /// The side's strongest arguments by strength, support and rebuttal
    /// state.
    pub fn get_strongest_arguments(&self, side: Side, limit: usize) -> Vec<&ArgumentNode> {
        let score = |node: &ArgumentNode| -> f64 {
            let base = f64::from(node.strength.value() * 10);
            let support = f64::from(node.support_count * 2);
            let penalty = if node.is_rebutted {
                f64::from(node.rebuttal_count * 3)
            } else {
                0.0
            };
            base + support - penalty
        };

        let mut nodes: Vec<&ArgumentNode> =
            self.nodes.iter().filter(|n| n.author == side).collect();
        nodes.sort_by(|a, b| score(b).partial_cmp(&score(a)).unwrap_or(std::cmp::Ordering::Equal));
        nodes.truncate(limit);
        nodes
    }

    /// Scores both sides from the graph structure.
    pub fn calculate_debate_score(&self) -> DebateScore {
        let mut pro_score = 0.0;
        let mut con_score = 0.0;

        for node in &self.nodes {
            let mut base = f64::from(node.strength.value() * 5);
            if !node.is_rebutted {
                base += 10.0;
            } else {
                base -= 3.0 * f64::from(node.rebuttal_count);
            }
            base += 2.0 * f64::from(node.support_count);

            match node.author {
                Side::Pro => pro_score += base,
                Side::Con => con_score += base,
            }
        }

        for edge in &self.edges {
            if matches!(edge.relation, RelationKind::Attacks | RelationKind::Rebuts) {
                if let Some(attacker) = self.get_node(&edge.source_id) {
                    let attack_value = edge.strength * 5.0;
                    match attacker.author {
                        Side::Pro => pro_score += attack_value,
                        Side::Con => con_score += attack_value,
                    }
                }
            }
        }

        let total = pro_score + con_score;
        let pro_percentage = if total > 0.0 {
            pro_score / total * 100.0
        } else {
            50.0
        };

        let leader = if pro_score > con_score {
            Winner::Pro
        } else if con_score > pro_score {
            Winner::Con
        } else {
            Winner::Tie
        };

        DebateScore {
            pro_score: (pro_score * 10.0).round() / 10.0,
            con_score: (con_score * 10.0).round() / 10.0,
            pro_percentage: (pro_percentage * 10.0).round() / 10.0,
            con_percentage: ((100.0 - pro_percentage) * 10.0).round() / 10.0,
            leader,
            pro_unaddressed: self.get_unaddressed_arguments(Side::Con).len() as u32,
            con_unaddressed: self.get_unaddressed_arguments(Side::Pro).len() as u32,
            total_arguments: self.nodes.len(),
            total_relations: self.edges.len(),
        }
    }

    /// Summary block for exports.
    pub fn summary(&self) -> Value {
        let count = |side: Side| self.nodes.iter().filter(|n| n.author == side).count();
        json!({
            "topic": self.topic,
            "pro_arguments": count(Side::Pro),
            "con_arguments": count(Side::Con),
            "total_relations": self.edges.len(),
            "scores": self.calculate_debate_score(),
            "pro_strongest": self
                .get_strongest_arguments(Side::Pro, 2)
                .iter()
                .map(|n| n.to_export())
                .collect::<Vec<_>>(),
            "con_strongest": self
                .get_strongest_arguments(Side::Con, 2)
                .iter()
                .map(|n| n.to_export())
                .collect::<Vec<_>>(),
        })
    }

    /// JSON export: nodes, edges, summary.
    pub fn to_json(&self) -> Value {
        json!({
            "topic": self.topic,
            "nodes": self.nodes.iter().map(|n| n.to_export()).collect::<Vec<_>>(),
            "edges": self.edges,
            "summary": self.summary(),
        })
    }

    /// Mermaid graph description for visualisation.
    pub fn to_mermaid(&self) -> String {
        let mut lines = vec!["graph TB".to_string()];

        for node in &self.nodes {
            let label = truncate_chars(&node.content.replace('"', "'"), 30);
            let (open, close) = match node.author {
                Side::Pro => ("([", "])"),
                Side::Con => ("[[", "]]"),
            };
            let class = match node.author {
                Side::Pro => ":::pro",
                Side::Con => ":::con",
            };
            lines.push(format!("    {}{}\"{}\"{}{}", node.id, open, label, close, class));
        }

        for edge in &self.edges {
            let arrow = if edge.relation.is_support() {
                "-->"
            } else {
                "-.->|attacks|"
            };
            lines.push(format!("    {} {} {}", edge.source_id, arrow, edge.target_id));
        }

        lines.push("    classDef pro fill:#3b82f6,color:#fff".to_string());
        lines.push("    classDef con fill:#f97316,color:#fff".to_string());
        lines.join("\n")
    }

    /// Restores the node index after deserialization.
    pub fn rebuild_index(&mut self) {
        self.node_index = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id.clone(), i))
            .collect();
    }

    /// Builds a graph from a transcript with the positional heuristic:
    /// strength from content length bands, up to three key points by
    /// sentence splitting, and an edge between every adjacent pair
    /// (`attacks` across authors, `builds_on` within one).
    pub fn from_transcript(topic: impl Into<String>, entries: &[HistoryEntry]) -> Self {
        let mut graph = Self::new(topic);
        let mut ids = Vec::with_capacity(entries.len());

        for entry in entries {
            let id = graph.add_argument(
                &entry.content,
                entry.side,
                entry.round,
                ArgumentType::Claim,
                extract_key_points(&entry.content),
                ArgumentStrength::from_content(&entry.content),
            );
            ids.push(id);
        }

        for (i, window) in entries.windows(2).enumerate() {
            let (previous, current) = (&window[0], &window[1]);
            if current.side != previous.side {
                graph.add_relation(
                    &ids[i + 1],
                    &ids[i],
                    RelationKind::Attacks,
                    HEURISTIC_ATTACK_STRENGTH,
                    "adjacent opposing utterance",
                );
            } else {
                graph.add_relation(
                    &ids[i + 1],
                    &ids[i],
                    RelationKind::BuildsOn,
                    HEURISTIC_BUILDS_ON_STRENGTH,
                    "continues own line",
                );
            }
        }

        graph
    }
}

/// Splits content into sentences and keeps up to three as key points.
pub fn extract_key_points(content: &str) -> Vec<String> {
    let splitter = Regex::new(r"[.!?。！？]+").expect("static sentence splitter regex");
    splitter
        .split(content)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .take(3)
        .map(str::to_string)
        .collect()
}

// ============================================================================
// AI-driven analyzer
// ============================================================================

/// Replaces the positional heuristic with model-derived key points and
/// relations.
pub struct ArgumentAnalyzer {
    client: Arc<dyn LlmClient>,
    params: CompletionParams,
}

impl ArgumentAnalyzer {
    pub fn new(client: Arc<dyn LlmClient>, params: CompletionParams) -> Self {
        Self { client, params }
    }

    /// Extracts 2-4 key points from one argument.
    pub async fn extract_key_points(&self, argument: &str) -> Vec<String> {
        let prompt = format!(
            r#"Extract 2-4 core claims from the debate argument below, one sentence each.

Argument:
{argument}

Reply with the core claims as a JSON array, for example:
["core claim 1", "core claim 2", "core claim 3"]"#,
        );
        let messages = [Message::user(prompt)];

        match self.client.complete(&messages, &self.params).await {
            Ok(response) => extract_json(&response)
                .and_then(|v| serde_json::from_value(v).ok())
                .unwrap_or_default(),
            Err(err) => {
                tracing::warn!(error = %err, "key point extraction failed");
                Vec::new()
            }
        }
    }

    /// Classifies the relation of one argument to another, if any.
    pub async fn analyze_relation(
        &self,
        source: &str,
        target: &str,
        source_author: Side,
        target_author: Side,
    ) -> Option<(RelationKind, f64, String)> {
        let prompt = format!(
            r#"Classify the relation between the two debate arguments below.

[Argument A] ({source_author})
{source_excerpt}

[Argument B] ({target_author})
{target_excerpt}

Judge how argument A relates to argument B and reply with a JSON object:
```json
{{
    "has_relation": true or false,
    "relation_type": "attacks" | "rebuts" | "supports" | "undermines" | "builds_on" | "none",
    "strength": 0.1-1.0,
    "description": "the relation in under ten words"
}}
```"#,
            source_excerpt = truncate_chars(source, 300),
            target_excerpt = truncate_chars(target, 300),
        );
        let messages = [Message::user(prompt)];

        let response = match self.client.complete(&messages, &self.params).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "relation analysis failed");
                return None;
            }
        };

        let parsed = extract_json(&response)?;
        if !parsed.get("has_relation").and_then(Value::as_bool).unwrap_or(false) {
            return None;
        }
        let relation = RelationKind::parse(parsed.get("relation_type")?.as_str()?)?;
        let strength = parsed
            .get("strength")
            .and_then(Value::as_f64)
            .unwrap_or(0.5);
        let description = parsed
            .get("description")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        Some((relation, strength, description))
    }

    /// Builds a graph from a transcript with model-derived key points
    /// and relations between adjacent opposing utterances.
    pub async fn build_graph(
        &self,
        topic: impl Into<String>,
        entries: &[HistoryEntry],
    ) -> ArgumentGraph {
        let mut graph = ArgumentGraph::new(topic);
        let mut ids = Vec::with_capacity(entries.len());

        for entry in entries {
            let key_points = self.extract_key_points(&entry.content).await;
            let id = graph.add_argument(
                &entry.content,
                entry.side,
                entry.round,
                ArgumentType::Claim,
                key_points,
                ArgumentStrength::from_content(&entry.content),
            );
            ids.push(id);
        }

        for (i, window) in entries.windows(2).enumerate() {
            let (previous, current) = (&window[0], &window[1]);
            if current.side == previous.side {
                continue;
            }
            if let Some((relation, strength, description)) = self
                .analyze_relation(&current.content, &previous.content, current.side, previous.side)
                .await
            {
                graph.add_relation(&ids[i + 1], &ids[i], relation, strength, &description);
            }
        }

        graph
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_bands() {
        assert_eq!(ArgumentStrength::from_content("short"), ArgumentStrength::Weak);
        assert_eq!(
            ArgumentStrength::from_content(&"x".repeat(250)),
            ArgumentStrength::Moderate
        );
        assert_eq!(
            ArgumentStrength::from_content(&"x".repeat(500)),
            ArgumentStrength::Strong
        );
    }

    #[test]
    fn test_attack_marks_target_rebutted() {
        let mut graph = ArgumentGraph::new("t");
        let p1 = graph.add_argument(
            "pro claim",
            Side::Pro,
            1,
            ArgumentType::Claim,
            vec![],
            ArgumentStrength::Strong,
        );
        let c1 = graph.add_argument(
            "con rebuttal",
            Side::Con,
            1,
            ArgumentType::Rebuttal,
            vec![],
            ArgumentStrength::Moderate,
        );

        graph
            .add_relation(&c1, &p1, RelationKind::Attacks, 0.6, "")
            .unwrap();

        let target = graph.get_node(&p1).unwrap();
        assert!(target.is_rebutted);
        assert_eq!(target.rebuttal_count, 1);
    }

    #[test]
    fn test_support_credits_source() {
        let mut graph = ArgumentGraph::new("t");
        let p1 = graph.add_argument(
            "pro claim",
            Side::Pro,
            1,
            ArgumentType::Claim,
            vec![],
            ArgumentStrength::Moderate,
        );
        let p2 = graph.add_argument(
            "pro follow-up",
            Side::Pro,
            2,
            ArgumentType::Evidence,
            vec![],
            ArgumentStrength::Moderate,
        );

        graph
            .add_relation(&p2, &p1, RelationKind::BuildsOn, 0.5, "")
            .unwrap();
        assert_eq!(graph.get_node(&p2).unwrap().support_count, 1);
        assert!(!graph.get_node(&p1).unwrap().is_rebutted);
    }

    #[test]
    fn test_relation_rejects_unknown_nodes() {
        let mut graph = ArgumentGraph::new("t");
        assert!(graph
            .add_relation("nope", "missing", RelationKind::Attacks, 0.5, "")
            .is_none());
        assert!(graph.edges().is_empty());
    }

    #[test]
    fn test_scoring_scenario() {
        // pro = [P1 strong, P2 moderate]; con = [C1 moderate attacks P1 @ 0.6]
        let mut graph = ArgumentGraph::new("t");
        let p1 = graph.add_argument("p1", Side::Pro, 1, ArgumentType::Claim, vec![], ArgumentStrength::Strong);
        let _p2 = graph.add_argument("p2", Side::Pro, 2, ArgumentType::Claim, vec![], ArgumentStrength::Moderate);
        let c1 = graph.add_argument("c1", Side::Con, 1, ArgumentType::Rebuttal, vec![], ArgumentStrength::Moderate);
        graph.add_relation(&c1, &p1, RelationKind::Attacks, 0.6, "").unwrap();

        let p1_node = graph.get_node(&p1).unwrap();
        assert!(p1_node.is_rebutted);
        assert_eq!(p1_node.rebuttal_count, 1);

        let score = graph.calculate_debate_score();
        // P1: 3*5 - 3 = 12; P2: 2*5 + 10 = 20 -> pro 32
        assert!((score.pro_score - 32.0).abs() < 1e-6);
        // C1: 2*5 + 10 = 20, plus attack credit 0.6*5 = 3 -> con 23
        assert!((score.con_score - 23.0).abs() < 1e-6);
        assert_eq!(score.leader, Winner::Pro);
        assert_eq!(score.pro_unaddressed, 1); // P2 stands unrebutted
        assert_eq!(score.con_unaddressed, 1); // C1 stands unrebutted
    }

    #[test]
    fn test_heuristic_transcript_builder() {
        let entries = vec![
            HistoryEntry { round: 1, side: Side::Pro, content: "short pro".to_string() },
            HistoryEntry { round: 1, side: Side::Con, content: "x".repeat(250) },
            HistoryEntry { round: 2, side: Side::Pro, content: "x".repeat(500) },
        ];
        let graph = ArgumentGraph::from_transcript("topic", &entries);

        assert_eq!(graph.nodes().len(), 3);
        assert_eq!(graph.edges().len(), 2);
        assert!(graph.edges().iter().all(|e| e.relation == RelationKind::Attacks));
        assert!((graph.edges()[0].strength - 0.6).abs() < 1e-9);
        assert_eq!(graph.nodes()[0].strength, ArgumentStrength::Weak);
        assert_eq!(graph.nodes()[2].strength, ArgumentStrength::Strong);
    }

    #[test]
    fn test_key_point_extraction() {
        let points = extract_key_points("First point. Second point! Third? Fourth.");
        assert_eq!(points.len(), 3);
        assert_eq!(points[0], "First point");

        let chinese = extract_key_points("第一点。第二点。");
        assert_eq!(chinese.len(), 2);
    }

    #[test]
    fn test_exports() {
        let entries = vec![
            HistoryEntry { round: 1, side: Side::Pro, content: "pro claim here".to_string() },
            HistoryEntry { round: 1, side: Side::Con, content: "con answer here".to_string() },
        ];
        let graph = ArgumentGraph::from_transcript("topic", &entries);

        let exported = graph.to_json();
        assert_eq!(exported["nodes"].as_array().unwrap().len(), 2);
        assert_eq!(exported["edges"].as_array().unwrap().len(), 1);
        assert!(exported["summary"]["scores"]["leader"].is_string());

        let mermaid = graph.to_mermaid();
        assert!(mermaid.starts_with("graph TB"));
        assert!(mermaid.contains("classDef pro"));
        assert!(mermaid.contains("-.->|attacks|"));
    }

    #[tokio::test]
    async fn test_analyzer_builds_relations() {
        use crate::llm::MockProvider;
        let analyzer = ArgumentAnalyzer::new(
            Arc::new(MockProvider::new("mock", Some(11))),
            CompletionParams::new().with_temperature(0.3),
        );
        let entries = vec![
            HistoryEntry { round: 1, side: Side::Pro, content: "pro argues the motion".to_string() },
            HistoryEntry { round: 1, side: Side::Con, content: "con answers the pro".to_string() },
        ];
        let graph = analyzer.build_graph("topic", &entries).await;

        assert_eq!(graph.nodes().len(), 2);
        assert_eq!(graph.edges().len(), 1);
        assert!(graph.edges()[0].relation.is_attack());
        assert!(!graph.nodes()[0].key_points.is_empty());
    }
}
