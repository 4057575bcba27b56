//! Evaluator agent: per-round scoring and the final verdict.
//!
//! The evaluator is a neutral third party. It scores each round on a
//! fixed four-dimension rubric and aggregates the recorded sub-scores
//! into a final ruling. Cumulative totals are authoritative for the
//! winner; the model's own verdict can only override them by declaring
//! an explicit tie when the totals are within five percent.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::base::{parse_json_or, Agent, AgentCore, ThinkResult};
use super::debater::Side;
use super::error::AgentResult;
use crate::llm::{CompletionParams, LlmClient, Message};

/// Relative gap above which a verdict is decisive.
const DECISIVE_GAP: f64 = 0.15;

/// Relative gap below which a verdict is marginal.
const MARGINAL_GAP: f64 = 0.05;

// ============================================================================
// Scores
// ============================================================================

/// Sub-scores for one side in one round, each in [1, 10].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundScore {
    pub logic: u8,
    pub evidence: u8,
    pub rhetoric: u8,
    pub rebuttal: u8,
}

impl RoundScore {
    pub fn new(logic: u8, evidence: u8, rhetoric: u8, rebuttal: u8) -> Self {
        Self {
            logic: logic.clamp(1, 10),
            evidence: evidence.clamp(1, 10),
            rhetoric: rhetoric.clamp(1, 10),
            rebuttal: rebuttal.clamp(1, 10),
        }
    }

    /// Neutral score used when evaluation output cannot be parsed.
    pub fn neutral() -> Self {
        Self::new(5, 5, 5, 5)
    }

    /// Parses a `{logic, evidence, rhetoric, rebuttal}` map, clamping
    /// each dimension and defaulting missing ones to 5.
    pub fn from_value(value: &Value) -> Self {
        let dim = |key: &str| -> u8 {
            value
                .get(key)
                .and_then(Value::as_i64)
                .map(|v| v.clamp(1, 10) as u8)
                .unwrap_or(5)
        };
        Self::new(dim("logic"), dim("evidence"), dim("rhetoric"), dim("rebuttal"))
    }

    pub fn total(&self) -> u32 {
        u32::from(self.logic) + u32::from(self.evidence) + u32::from(self.rhetoric)
            + u32::from(self.rebuttal)
    }

    pub fn average(&self) -> f64 {
        f64::from(self.total()) / 4.0
    }
}

/// Winner of a round or of the whole debate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Winner {
    Pro,
    Con,
    Tie,
}

impl Winner {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pro => "pro",
            Self::Con => "con",
            Self::Tie => "tie",
        }
    }

    pub fn parse(name: &str) -> Self {
        match name {
            "pro" => Self::Pro,
            "con" => Self::Con,
            _ => Self::Tie,
        }
    }

    fn from_totals(pro: u32, con: u32) -> Self {
        match pro.cmp(&con) {
            std::cmp::Ordering::Greater => Self::Pro,
            std::cmp::Ordering::Less => Self::Con,
            std::cmp::Ordering::Equal => Self::Tie,
        }
    }
}

impl From<Side> for Winner {
    fn from(side: Side) -> Self {
        match side {
            Side::Pro => Self::Pro,
            Side::Con => Self::Con,
        }
    }
}

/// Suggestions for both sides after a round.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Suggestions {
    #[serde(default)]
    pub pro: Vec<String>,
    #[serde(default)]
    pub con: Vec<String>,
}

/// Full evaluation of one round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundEvaluation {
    pub round: u32,
    pub pro_score: RoundScore,
    pub con_score: RoundScore,
    pub round_winner: Winner,
    pub commentary: String,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub suggestions: Suggestions,
}

/// How clear-cut the final result is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Margin {
    /// Relative gap above 15%.
    Decisive,
    /// Relative gap between 5% and 15%.
    Close,
    /// Relative gap below 5%.
    Marginal,
}

impl Margin {
    fn from_totals(pro: u32, con: u32) -> Self {
        let max = pro.max(con);
        if max == 0 {
            return Self::Marginal;
        }
        let gap = f64::from(pro.abs_diff(con)) / f64::from(max);
        if gap > DECISIVE_GAP {
            Self::Decisive
        } else if gap >= MARGINAL_GAP {
            Self::Close
        } else {
            Self::Marginal
        }
    }
}

/// The final ruling over the whole debate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinalVerdict {
    pub winner: Winner,
    pub pro_total_score: u32,
    pub con_total_score: u32,
    pub margin: Margin,
    pub summary: String,
    #[serde(default)]
    pub pro_strengths: Vec<String>,
    #[serde(default)]
    pub con_strengths: Vec<String>,
    #[serde(default)]
    pub key_turning_points: Vec<String>,
}

impl FinalVerdict {
    /// Neutral verdict for a debate with no recorded evaluations.
    pub fn neutral(summary: impl Into<String>) -> Self {
        Self {
            winner: Winner::Tie,
            pro_total_score: 0,
            con_total_score: 0,
            margin: Margin::Marginal,
            summary: summary.into(),
            pro_strengths: Vec::new(),
            con_strengths: Vec::new(),
            key_turning_points: Vec::new(),
        }
    }
}

/// Live standings derived from recorded evaluations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Standings {
    pub rounds_completed: u32,
    pub pro_total_score: u32,
    pub con_total_score: u32,
    pub pro_round_wins: u32,
    pub con_round_wins: u32,
    pub ties: u32,
    pub leader: Winner,
}

// ============================================================================
// Evaluator agent
// ============================================================================

/// Scoring rubric, also spelled out in the evaluation prompt.
const SCORING_CRITERIA: [(&str, &str); 4] = [
    ("logic", "is the argument clear, structured and free of contradictions"),
    ("evidence", "is the supporting material sufficient, credible and relevant"),
    ("rhetoric", "is the language persuasive and precise"),
    ("rebuttal", "does it answer the opposing case effectively"),
];

/// The neutral evaluator.
pub struct EvaluatorAgent {
    core: AgentCore,
    topic: String,
    client: Arc<dyn LlmClient>,
    params: CompletionParams,
    evaluations: Vec<RoundEvaluation>,
}

impl EvaluatorAgent {
    pub fn new(
        topic: impl Into<String>,
        client: Arc<dyn LlmClient>,
        params: CompletionParams,
    ) -> Self {
        let mut core = AgentCore::new("Evaluator", "evaluator");
        core.add_goal("Judge the debate fairly and objectively");
        core.add_goal("Give constructive feedback to both sides");

        Self {
            core,
            topic: topic.into(),
            client,
            params,
            evaluations: Vec::new(),
        }
    }

    pub fn evaluations(&self) -> &[RoundEvaluation] {
        &self.evaluations
    }

    fn build_evaluation_prompt(
        &self,
        pro_argument: &str,
        con_argument: &str,
        round: u32,
        history: &[RoundEvaluation],
    ) -> String {
        let history_context = if history.is_empty() {
            String::new()
        } else {
            let mut lines = vec!["\n[Earlier rounds]".to_string()];
            for evaluation in history.iter().rev().take(2).rev() {
                lines.push(format!(
                    "- Round {}: {} won",
                    evaluation.round,
                    evaluation.round_winner.as_str()
                ));
            }
            lines.join("\n")
        };

        let criteria = SCORING_CRITERIA
            .iter()
            .map(|(name, description)| format!("- {name}: {description}"))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"You are an experienced debate judge. Evaluate round {round} fairly.

[Debate topic]
{topic}

[Pro's statement]
{pro_argument}

[Con's statement]
{con_argument}
{history_context}

[Scoring criteria]
{criteria}

Reply with a JSON object:
```json
{{
    "pro_score": {{"logic": 1-10, "evidence": 1-10, "rhetoric": 1-10, "rebuttal": 1-10}},
    "con_score": {{"logic": 1-10, "evidence": 1-10, "rhetoric": 1-10, "rebuttal": 1-10}},
    "round_winner": "pro" or "con" or "tie",
    "commentary": "professional commentary on the round, under 100 words",
    "highlights": ["standout moments, if any"],
    "suggestions": {{
        "pro": ["advice for the pro side"],
        "con": ["advice for the con side"]
    }}
}}
```

[Fairness requirements]
- Score on performance, not on your own view of the motion
- The second speaker has an information advantage when rebutting; account for it
- Weigh originality and construction alongside rebuttal effectiveness
- Do not systematically favour either side; both must have an equal path to winning"#,
            topic = self.topic,
        )
    }

    fn build_verdict_prompt(&self, pro_total: u32, con_total: u32) -> String {
        let rounds_summary = self
            .evaluations
            .iter()
            .map(|e| {
                format!(
                    "Round {}: pro {} vs con {} ({} won)",
                    e.round,
                    e.pro_score.total(),
                    e.con_score.total(),
                    e.round_winner.as_str()
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        let detail = serde_json::to_string_pretty(&self.evaluations)
            .unwrap_or_else(|_| "[]".to_string());

        format!(
            r#"You are the presiding judge. Deliver the final ruling from the round scores.

[Debate topic]
{topic}

[Round scores]
{rounds_summary}

[Cumulative totals]
Pro total: {pro_total}
Con total: {con_total}

[Round evaluations]
{detail}

Reply with a JSON object:
```json
{{
    "winner": "pro" or "con" or "tie",
    "pro_total_score": {pro_total},
    "con_total_score": {con_total},
    "margin": "decisive" (gap > 15%) or "close" (5-15%) or "marginal" (< 5%),
    "summary": "reasoning for the ruling, under 200 words",
    "pro_strengths": ["pro's main strengths"],
    "con_strengths": ["con's main strengths"],
    "key_turning_points": ["moments that decided the outcome"]
}}
```"#,
            topic = self.topic,
        )
    }

    fn fallback_evaluation(round: u32, detail: &str) -> RoundEvaluation {
        RoundEvaluation {
            round,
            pro_score: RoundScore::neutral(),
            con_score: RoundScore::neutral(),
            round_winner: Winner::Tie,
            commentary: format!("Evaluation failed: {detail}"),
            highlights: Vec::new(),
            suggestions: Suggestions::default(),
        }
    }

    /// Scores one round. Non-conforming model output falls back to a
    /// neutral all-fives evaluation with the failure recorded in the
    /// commentary.
    pub async fn evaluate_round(
        &mut self,
        pro_argument: &str,
        con_argument: &str,
        round: u32,
        history: &[RoundEvaluation],
    ) -> RoundEvaluation {
        let prompt = self.build_evaluation_prompt(pro_argument, con_argument, round, history);
        let messages = [
            Message::system("You are a fair, professional debate judge known for objective scoring."),
            Message::user(prompt),
        ];

        let evaluation = match self.client.complete(&messages, &self.params).await {
            Ok(response) => {
                let parsed = parse_json_or(&response, Value::Null);
                if parsed.is_null() {
                    tracing::warn!(round, "evaluation response was not valid JSON");
                    Self::fallback_evaluation(round, "could not parse judge response")
                } else {
                    RoundEvaluation {
                        round,
                        pro_score: RoundScore::from_value(&parsed["pro_score"]),
                        con_score: RoundScore::from_value(&parsed["con_score"]),
                        round_winner: parsed["round_winner"]
                            .as_str()
                            .map(Winner::parse)
                            .unwrap_or(Winner::Tie),
                        commentary: parsed["commentary"].as_str().unwrap_or("").to_string(),
                        highlights: string_list(&parsed["highlights"]),
                        suggestions: Suggestions {
                            pro: string_list(&parsed["suggestions"]["pro"]),
                            con: string_list(&parsed["suggestions"]["con"]),
                        },
                    }
                }
            }
            Err(err) => {
                tracing::warn!(round, error = %err, "evaluation request failed");
                Self::fallback_evaluation(round, &err.to_string())
            }
        };

        self.core.add_to_memory(
            "evaluation",
            json!({ "round": round, "winner": evaluation.round_winner.as_str() }),
        );
        self.evaluations.push(evaluation.clone());
        evaluation
    }

    /// Delivers the final verdict over all recorded evaluations.
    ///
    /// The cumulative totals decide the winner. The model's ruling is
    /// honoured only when it declares an explicit tie and the totals
    /// differ by less than five percent.
    pub async fn final_verdict(&mut self) -> FinalVerdict {
        if self.evaluations.is_empty() {
            return FinalVerdict::neutral("No evaluations recorded");
        }

        let pro_total: u32 = self.evaluations.iter().map(|e| e.pro_score.total()).sum();
        let con_total: u32 = self.evaluations.iter().map(|e| e.con_score.total()).sum();
        let totals_winner = Winner::from_totals(pro_total, con_total);
        let margin = Margin::from_totals(pro_total, con_total);

        let prompt = self.build_verdict_prompt(pro_total, con_total);
        let messages = [
            Message::system("You are the presiding judge of the debate. Rule fairly."),
            Message::user(prompt),
        ];

        let parsed = match self.client.complete(&messages, &self.params).await {
            Ok(response) => parse_json_or(&response, json!({})),
            Err(err) => {
                tracing::warn!(error = %err, "verdict request failed, ruling on totals alone");
                json!({})
            }
        };

        let model_winner = parsed["winner"].as_str().map(Winner::parse);
        let winner = match model_winner {
            Some(Winner::Tie) if margin == Margin::Marginal => Winner::Tie,
            _ => totals_winner,
        };

        let verdict = FinalVerdict {
            winner,
            pro_total_score: pro_total,
            con_total_score: con_total,
            margin,
            summary: parsed["summary"].as_str().unwrap_or("").to_string(),
            pro_strengths: string_list(&parsed["pro_strengths"]),
            con_strengths: string_list(&parsed["con_strengths"]),
            key_turning_points: string_list(&parsed["key_turning_points"]),
        };

        self.core.update_belief(
            "final_verdict",
            serde_json::to_value(&verdict).unwrap_or(Value::Null),
        );
        verdict
    }

    /// Current standings over the recorded evaluations.
    pub fn current_standings(&self) -> Standings {
        let pro_total: u32 = self.evaluations.iter().map(|e| e.pro_score.total()).sum();
        let con_total: u32 = self.evaluations.iter().map(|e| e.con_score.total()).sum();

        let wins = |winner: Winner| -> u32 {
            self.evaluations
                .iter()
                .filter(|e| e.round_winner == winner)
                .count() as u32
        };

        Standings {
            rounds_completed: self.evaluations.len() as u32,
            pro_total_score: pro_total,
            con_total_score: con_total,
            pro_round_wins: wins(Winner::Pro),
            con_round_wins: wins(Winner::Con),
            ties: wins(Winner::Tie),
            leader: Winner::from_totals(pro_total, con_total),
        }
    }

    /// Clears all recorded evaluations and beliefs.
    pub fn reset(&mut self) {
        self.evaluations.clear();
        self.core.state.beliefs.clear();
    }
}

#[async_trait]
impl Agent for EvaluatorAgent {
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
            .unwrap_or("evaluate_round");
        Ok(ThinkResult::new(
            format!("Preparing task: {task}"),
            json!({ "task": task }),
            task,
            0.9,
        ))
    }

    async fn act(&mut self, _think_result: &ThinkResult) -> AgentResult<String> {
        // Evaluation and verdicts run through their dedicated entry points.
        Ok(String::new())
    }
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockProvider;

    fn mock_evaluator() -> EvaluatorAgent {
        EvaluatorAgent::new(
            "AI will replace most human jobs",
            Arc::new(MockProvider::new("mock", Some(123))),
            CompletionParams::new().with_temperature(0.5),
        )
    }

    #[test]
    fn test_round_score_clamping() {
        let score = RoundScore::new(0, 11, 5, 7);
        assert_eq!(score.logic, 1);
        assert_eq!(score.evidence, 10);
        assert_eq!(score.total(), 23);
        assert!((score.average() - 5.75).abs() < 1e-9);
    }

    #[test]
    fn test_round_score_from_value_defaults() {
        let score = RoundScore::from_value(&json!({"logic": 8}));
        assert_eq!(score.logic, 8);
        assert_eq!(score.evidence, 5);
        assert_eq!(score.rebuttal, 5);

        let score = RoundScore::from_value(&json!("not a map"));
        assert_eq!(score, RoundScore::neutral());
    }

    #[test]
    fn test_margin_policy() {
        assert_eq!(Margin::from_totals(100, 80), Margin::Decisive); // 20%
        assert_eq!(Margin::from_totals(100, 90), Margin::Close); // 10%
        assert_eq!(Margin::from_totals(100, 97), Margin::Marginal); // 3%
        assert_eq!(Margin::from_totals(0, 0), Margin::Marginal);
    }

    #[tokio::test]
    async fn test_evaluate_round_records_scores() {
        let mut evaluator = mock_evaluator();
        let evaluation = evaluator
            .evaluate_round("pro statement", "con statement", 1, &[])
            .await;

        assert_eq!(evaluation.round, 1);
        assert!(evaluation.pro_score.total() >= 4);
        assert_eq!(evaluator.evaluations().len(), 1);
    }

    #[tokio::test]
    async fn test_fallback_on_unparseable_output() {
        // An argument-shaped prompt is impossible here; instead force the
        // failure path by asking the evaluator to judge with a provider
        // that answers plain prose. The mock answers the evaluation shape
        // for evaluation prompts, so simulate the parse failure directly.
        let evaluation = EvaluatorAgent::fallback_evaluation(2, "could not parse judge response");
        assert_eq!(evaluation.pro_score, RoundScore::neutral());
        assert_eq!(evaluation.con_score, RoundScore::neutral());
        assert_eq!(evaluation.round_winner, Winner::Tie);
        assert!(evaluation.commentary.contains("could not parse"));
    }

    #[tokio::test]
    async fn test_final_verdict_matches_totals() {
        let mut evaluator = mock_evaluator();
        for round in 1..=2 {
            evaluator
                .evaluate_round("pro statement", "con statement", round, &[])
                .await;
        }

        let verdict = evaluator.final_verdict().await;
        let pro_total: u32 = evaluator.evaluations().iter().map(|e| e.pro_score.total()).sum();
        let con_total: u32 = evaluator.evaluations().iter().map(|e| e.con_score.total()).sum();
        assert_eq!(verdict.pro_total_score, pro_total);
        assert_eq!(verdict.con_total_score, con_total);

        if verdict.winner != Winner::Tie {
            assert_eq!(verdict.winner, Winner::from_totals(pro_total, con_total));
        }
    }

    #[tokio::test]
    async fn test_empty_verdict_is_neutral_tie() {
        let mut evaluator = mock_evaluator();
        let verdict = evaluator.final_verdict().await;
        assert_eq!(verdict.winner, Winner::Tie);
        assert_eq!(verdict.pro_total_score, 0);
        assert_eq!(verdict.margin, Margin::Marginal);
    }

    #[tokio::test]
    async fn test_standings_track_wins() {
        let mut evaluator = mock_evaluator();
        evaluator
            .evaluate_round("pro statement", "con statement", 1, &[])
            .await;

        let standings = evaluator.current_standings();
        assert_eq!(standings.rounds_completed, 1);
        assert_eq!(
            standings.pro_round_wins + standings.con_round_wins + standings.ties,
            1
        );
    }
}
