//! Coarse token and cost estimation.
//!
//! Character-count heuristics only; real accounting belongs to the
//! provider bill. Prompt tokens are estimated at 1.2x the completion
//! tokens since the orchestrator replays a growing history each turn.

use serde::{Deserialize, Serialize};

/// Per-1K-token pricing for a model.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Pricing {
    /// USD per 1K prompt tokens.
    pub prompt: f64,
    /// USD per 1K completion tokens.
    pub completion: f64,
}

/// Coarse cost estimate for a set of generated texts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostEstimate {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
    pub estimated_usd: f64,
    pub price_per_1k_prompt: f64,
    pub price_per_1k_completion: f64,
}

/// Estimates the token count of a text: `ceil(len / 4)`, at least 1 for
/// non-empty input.
pub fn estimate_tokens(text: &str) -> u64 {
    if text.is_empty() {
        return 0;
    }
    (text.len() as u64).div_ceil(4).max(1)
}

/// Estimates the cost of a run from its generated texts.
pub fn estimate_cost<'a, I>(texts: I, pricing: Pricing) -> CostEstimate
where
    I: IntoIterator<Item = &'a str>,
{
    let completion_tokens: u64 = texts.into_iter().map(estimate_tokens).sum();
    let prompt_tokens = (completion_tokens as f64 * 1.2) as u64;
    let total_tokens = prompt_tokens + completion_tokens;

    let estimated_usd = (prompt_tokens as f64 / 1000.0) * pricing.prompt
        + (completion_tokens as f64 / 1000.0) * pricing.completion;

    CostEstimate {
        prompt_tokens,
        completion_tokens,
        total_tokens,
        estimated_usd: (estimated_usd * 1e6).round() / 1e6,
        price_per_1k_prompt: pricing.prompt,
        price_per_1k_completion: pricing.completion,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
        assert_eq!(estimate_tokens(&"x".repeat(400)), 100);
    }

    #[test]
    fn test_estimate_cost() {
        let texts = vec!["x".repeat(4000)];
        let estimate = estimate_cost(
            texts.iter().map(String::as_str),
            Pricing {
                prompt: 1.0,
                completion: 2.0,
            },
        );
        assert_eq!(estimate.completion_tokens, 1000);
        assert_eq!(estimate.prompt_tokens, 1200);
        assert_eq!(estimate.total_tokens, 2200);
        // 1.2 * 1.0 + 1.0 * 2.0
        assert!((estimate.estimated_usd - 3.2).abs() < 1e-9);
    }

    #[test]
    fn test_zero_pricing() {
        let estimate = estimate_cost(["hello world"], Pricing::default());
        assert!((estimate.estimated_usd - 0.0).abs() < 1e-12);
        assert!(estimate.total_tokens > 0);
    }
}
