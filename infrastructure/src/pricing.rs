//! Per-model token pricing.
//!
//! Prices are USD per 1K tokens, matched by model-id prefix. Longer
//! prefixes are listed first so `gpt-4o-mini` is not priced as `gpt-4o`.
//! Unknown models fall back to a conservative default so cost totals stay
//! non-zero rather than silently under-reporting.

use panel_domain::TokenUsage;

/// (model-id prefix, input USD per 1K tokens, output USD per 1K tokens)
const PRICING_TABLE: &[(&str, f64, f64)] = &[
    ("gpt-4o-mini", 0.000_15, 0.000_6),
    ("gpt-4o", 0.002_5, 0.01),
    ("gpt-4.1-mini", 0.000_4, 0.001_6),
    ("gpt-4.1", 0.002, 0.008),
    ("o3-mini", 0.001_1, 0.004_4),
    ("o3", 0.002, 0.008),
    ("claude-opus", 0.015, 0.075),
    ("claude-sonnet", 0.003, 0.015),
    ("claude-haiku", 0.000_8, 0.004),
    ("gemini-2.5-pro", 0.001_25, 0.01),
    ("gemini", 0.000_3, 0.002_5),
];

const DEFAULT_INPUT_PER_1K: f64 = 0.001;
const DEFAULT_OUTPUT_PER_1K: f64 = 0.002;

/// Per-1K rates for a model id.
pub fn rates_for(model_id: &str) -> (f64, f64) {
    PRICING_TABLE
        .iter()
        .find(|(prefix, _, _)| model_id.starts_with(prefix))
        .map(|(_, input, output)| (*input, *output))
        .unwrap_or((DEFAULT_INPUT_PER_1K, DEFAULT_OUTPUT_PER_1K))
}

/// Cost in USD attributed to one completed call.
pub fn cost_for(model_id: &str, usage: TokenUsage) -> f64 {
    let (input_rate, output_rate) = rates_for(model_id);
    f64::from(usage.prompt_tokens) / 1000.0 * input_rate
        + f64::from(usage.completion_tokens) / 1000.0 * output_rate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longer_prefix_wins() {
        let (mini_in, _) = rates_for("gpt-4o-mini-2024-07-18");
        let (full_in, _) = rates_for("gpt-4o-2024-08-06");
        assert!(mini_in < full_in);
    }

    #[test]
    fn unknown_model_uses_default_rates() {
        assert_eq!(
            rates_for("somevendor-experimental"),
            (DEFAULT_INPUT_PER_1K, DEFAULT_OUTPUT_PER_1K)
        );
    }

    #[test]
    fn cost_scales_with_usage() {
        let cost = cost_for("gpt-4o", TokenUsage::new(1000, 1000));
        assert!((cost - (0.002_5 + 0.01)).abs() < 1e-9);

        let zero = cost_for("gpt-4o", TokenUsage::default());
        assert_eq!(zero, 0.0);
    }
}
