//! Post-hoc evaluation of completed debate traces.
//!
//! Works on the serialized trace shape rather than live sessions, so it
//! tolerates loosely-typed input: per-side scores may be sub-score maps
//! or bare scalars, and traces without judge evaluations fall back to
//! text-statistic heuristics over the turns.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-dimension score breakdown on a 0-10 scale.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub logic: f64,
    pub evidence: f64,
    pub rebuttal: f64,
    pub clarity: f64,
    pub total: f64,
}

/// Evaluation of a single trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    pub overall: f64,
    pub dimensions: ScoreBreakdown,
    pub consistency: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pro_average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub con_average: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
    pub notes: Vec<String>,
}

/// Element-wise deltas between two evaluations (right minus left).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct EvaluationDelta {
    pub overall: f64,
    pub consistency: f64,
    pub logic: f64,
    pub evidence: f64,
    pub rebuttal: f64,
    pub clarity: f64,
}

/// Result of comparing two traces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareResult {
    pub left: EvaluationResult,
    pub right: EvaluationResult,
    pub delta: EvaluationDelta,
    /// "left", "right" or "tie".
    pub winner: String,
}

const LOGIC_TOKENS: [&str; 4] = ["therefore", "because", "thus", "hence"];
const EVIDENCE_TOKENS: [&str; 4] = ["data", "research", "study", "statistics"];
const REBUTTAL_TOKENS: [&str; 4] = ["however", "but", "contrary", "rebut"];

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn avg(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        round2(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn clamp10(value: f64) -> f64 {
    value.clamp(0.0, 10.0)
}

/// Sum of a side's score, whether it is a sub-score map or a scalar.
fn side_total(evaluation: &Value, key: &str) -> f64 {
    match evaluation.get(key) {
        Some(Value::Object(map)) => map.values().filter_map(Value::as_f64).sum(),
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Mean of one dimension across both sides, per evaluation.
fn dimension_scores(evaluations: &[Value], key: &str) -> Vec<f64> {
    evaluations
        .iter()
        .map(|e| {
            let pro = e
                .get("pro_score")
                .and_then(|s| s.get(key))
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            let con = e
                .get("con_score")
                .and_then(|s| s.get(key))
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            (pro + con) / 2.0
        })
        .collect()
}

/// Population standard deviation.
fn pstdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Score stability across rounds: 10 minus half the spread of per-turn
/// totals, clamped to [0, 10].
fn compute_consistency(evaluations: &[Value]) -> f64 {
    let mut totals = Vec::with_capacity(evaluations.len() * 2);
    for evaluation in evaluations {
        totals.push(side_total(evaluation, "pro_score"));
        totals.push(side_total(evaluation, "con_score"));
    }
    if totals.len() < 2 {
        return 0.0;
    }
    round2(clamp10(10.0 - pstdev(&totals) / 2.0))
}

/// Token-count heuristic for traces without judge evaluations.
fn infer_from_text(turns: &[Value]) -> ScoreBreakdown {
    let text = turns
        .iter()
        .filter_map(|t| t.get("result").and_then(Value::as_str))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    let length = text.len().max(1);

    let hits = |tokens: &[&str]| -> f64 {
        tokens.iter().filter(|t| text.contains(**t)).count() as f64
    };

    let logic = clamp10(hits(&LOGIC_TOKENS) * 2.0);
    let evidence = clamp10(hits(&EVIDENCE_TOKENS) * 2.0);
    let rebuttal = clamp10(hits(&REBUTTAL_TOKENS) * 2.0);
    let clarity = clamp10(10.0 - (length as f64 / 2000.0) * 2.0);
    let total = round2((logic + evidence + rebuttal + clarity) / 4.0);

    ScoreBreakdown {
        logic: round2(logic),
        evidence: round2(evidence),
        rebuttal: round2(rebuttal),
        clarity: round2(clarity),
        total,
    }
}

/// Scores a completed trace.
pub fn evaluate_trace(trace: &Value) -> EvaluationResult {
    let evaluations: Vec<Value> = trace
        .get("evaluations")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let turns: Vec<Value> = trace
        .get("turns")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let mut notes = Vec::new();

    let (dimensions, consistency) = if !evaluations.is_empty() {
        let logic = avg(&dimension_scores(&evaluations, "logic"));
        let evidence = avg(&dimension_scores(&evaluations, "evidence"));
        let rebuttal = avg(&dimension_scores(&evaluations, "rebuttal"));
        // Rhetoric doubles as the clarity dimension in judge scores.
        let clarity = avg(&dimension_scores(&evaluations, "rhetoric"));
        let total = avg(&[logic, evidence, rebuttal, clarity]);
        notes.push("aggregated from judge scores".to_string());
        (
            ScoreBreakdown {
                logic,
                evidence,
                rebuttal,
                clarity,
                total,
            },
            compute_consistency(&evaluations),
        )
    } else {
        notes.push("heuristic text statistics".to_string());
        (infer_from_text(&turns), 0.0)
    };

    let pro_totals: Vec<f64> = evaluations.iter().map(|e| side_total(e, "pro_score")).collect();
    let con_totals: Vec<f64> = evaluations.iter().map(|e| side_total(e, "con_score")).collect();

    let winner = if evaluations.is_empty() {
        None
    } else {
        let pro: f64 = pro_totals.iter().sum();
        let con: f64 = con_totals.iter().sum();
        Some(if pro > con {
            "pro".to_string()
        } else if con > pro {
            "con".to_string()
        } else {
            "tie".to_string()
        })
    };

    EvaluationResult {
        trace_id: trace
            .get("trace_id")
            .and_then(Value::as_str)
            .map(str::to_string),
        overall: dimensions.total,
        dimensions,
        consistency,
        pro_average: (!pro_totals.is_empty()).then(|| avg(&pro_totals)),
        con_average: (!con_totals.is_empty()).then(|| avg(&con_totals)),
        winner,
        notes,
    }
}

/// Compares two traces element-wise.
pub fn compare_traces(left: &Value, right: &Value) -> CompareResult {
    let left_result = evaluate_trace(left);
    let right_result = evaluate_trace(right);

    let delta = EvaluationDelta {
        overall: round2(right_result.overall - left_result.overall),
        consistency: round2(right_result.consistency - left_result.consistency),
        logic: round2(right_result.dimensions.logic - left_result.dimensions.logic),
        evidence: round2(right_result.dimensions.evidence - left_result.dimensions.evidence),
        rebuttal: round2(right_result.dimensions.rebuttal - left_result.dimensions.rebuttal),
        clarity: round2(right_result.dimensions.clarity - left_result.dimensions.clarity),
    };

    let winner = if right_result.overall > left_result.overall {
        "right"
    } else if left_result.overall > right_result.overall {
        "left"
    } else {
        "tie"
    };

    CompareResult {
        left: left_result,
        right: right_result,
        delta,
        winner: winner.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn scored_trace(logic_bonus: i64) -> Value {
        let eval = |round: u32| {
            json!({
                "round": round,
                "pro_score": {"logic": 6 + logic_bonus, "evidence": 6, "rhetoric": 6, "rebuttal": 6},
                "con_score": {"logic": 5 + logic_bonus, "evidence": 5, "rhetoric": 5, "rebuttal": 5},
                "round_winner": "pro"
            })
        };
        json!({
            "trace_id": "t1",
            "topic": "x",
            "turns": [],
            "evaluations": [eval(1), eval(2)],
        })
    }

    #[test]
    fn test_evaluate_scored_trace() {
        let result = evaluate_trace(&scored_trace(0));
        assert!((result.dimensions.logic - 5.5).abs() < 1e-9);
        assert!(result.overall > 0.0);
        assert_eq!(result.winner.as_deref(), Some("pro"));
        assert_eq!(result.trace_id.as_deref(), Some("t1"));
        // Identical rounds per side: spread comes only from the pro/con
        // gap of 4 points.
        assert!(result.consistency > 7.0);
    }

    #[test]
    fn test_scalar_scores_tolerated() {
        let trace = json!({
            "turns": [],
            "evaluations": [
                {"round": 1, "pro_score": 28, "con_score": {"logic": 5, "evidence": 5, "rhetoric": 5, "rebuttal": 5}, "round_winner": "pro"}
            ],
        });
        let result = evaluate_trace(&trace);
        assert_eq!(result.pro_average, Some(28.0));
        assert_eq!(result.con_average, Some(20.0));
        assert_eq!(result.winner.as_deref(), Some("pro"));
    }

    #[test]
    fn test_heuristic_fallback() {
        let trace = json!({
            "turns": [
                {"result": "Because the data shows a trend, therefore the claim holds. However, critics disagree."},
            ],
            "evaluations": [],
        });
        let result = evaluate_trace(&trace);
        assert!(result.dimensions.logic > 0.0);
        assert!(result.dimensions.evidence > 0.0);
        assert!(result.dimensions.rebuttal > 0.0);
        assert!(result.dimensions.clarity > 9.0);
        assert_eq!(result.winner, None);
        assert!(result.notes[0].contains("heuristic"));
    }

    #[test]
    fn test_compare_logic_bonus_wins() {
        let comparison = compare_traces(&scored_trace(0), &scored_trace(2));
        assert_eq!(comparison.winner, "right");
        assert!(comparison.delta.overall > 0.0);
        assert!((comparison.delta.logic - 2.0).abs() < 1e-9);
        assert!((comparison.delta.evidence - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_compare_identical_is_tie() {
        let comparison = compare_traces(&scored_trace(1), &scored_trace(1));
        assert_eq!(comparison.winner, "tie");
        assert!((comparison.delta.overall - 0.0).abs() < 1e-9);
    }

    #[test]
    fn test_pstdev() {
        assert!((pstdev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]) - 2.0).abs() < 1e-9);
        assert!((pstdev(&[5.0]) - 0.0).abs() < 1e-9);
    }
}
