//! Worker output value objects.
//!
//! A [`WorkerOutput`] is created once per worker per run. Text is appended
//! incrementally while the worker streams and becomes immutable once the
//! call settles (success or failure).

use crate::worker::Worker;
use serde::{Deserialize, Serialize};

/// Token usage reported by the provider for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// The settled result of one worker's call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerOutput {
    pub worker_id: String,
    pub display_name: String,
    pub model_id: String,
    pub text: String,
    pub cost_usd: f64,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    /// Set when the worker's call failed; the run continues without it
    pub error: Option<String>,
}

impl WorkerOutput {
    /// Create a successful output.
    pub fn success(
        worker: &Worker,
        text: impl Into<String>,
        usage: TokenUsage,
        cost_usd: f64,
    ) -> Self {
        Self {
            worker_id: worker.id.clone(),
            display_name: worker.display_name.clone(),
            model_id: worker.model_id.clone(),
            text: text.into(),
            cost_usd,
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            error: None,
        }
    }

    /// Create an error-stub output for a failed call.
    ///
    /// Stub outputs keep the roster shape intact so later pipeline/debate
    /// workers can proceed with degraded context.
    pub fn failure(worker: &Worker, error: impl Into<String>) -> Self {
        Self {
            worker_id: worker.id.clone(),
            display_name: worker.display_name.clone(),
            model_id: worker.model_id.clone(),
            text: String::new(),
            cost_usd: 0.0,
            prompt_tokens: 0,
            completion_tokens: 0,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    pub fn usage(&self) -> TokenUsage {
        TokenUsage::new(self.prompt_tokens, self.completion_tokens)
    }

    /// Merge a later debate-round result into this output.
    ///
    /// Text is replaced by the latest round; cost and tokens accumulate
    /// across rounds.
    pub fn absorb_round(&mut self, text: impl Into<String>, usage: TokenUsage, cost_usd: f64) {
        self.text = text.into();
        self.prompt_tokens += usage.prompt_tokens;
        self.completion_tokens += usage.completion_tokens;
        self.cost_usd += cost_usd;
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker() -> Worker {
        Worker::new("w1", "Analyst", "gpt-4o")
    }

    #[test]
    fn success_output() {
        let output = WorkerOutput::success(&worker(), "growing market", TokenUsage::new(10, 20), 0.01);
        assert!(output.is_success());
        assert_eq!(output.usage().total(), 30);
        assert_eq!(output.worker_id, "w1");
    }

    #[test]
    fn failure_output_is_stub() {
        let output = WorkerOutput::failure(&worker(), "rate limited");
        assert!(!output.is_success());
        assert!(output.text.is_empty());
        assert_eq!(output.cost_usd, 0.0);
        assert_eq!(output.error.as_deref(), Some("rate limited"));
    }

    #[test]
    fn absorb_round_accumulates_cost() {
        let mut output = WorkerOutput::success(&worker(), "round 1", TokenUsage::new(10, 10), 0.01);
        output.absorb_round("round 2", TokenUsage::new(20, 20), 0.02);

        assert_eq!(output.text, "round 2");
        assert_eq!(output.prompt_tokens, 30);
        assert!((output.cost_usd - 0.03).abs() < 1e-9);
    }
}
