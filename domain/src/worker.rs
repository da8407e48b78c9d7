//! Worker entity and sampling configuration.
//!
//! A [`Worker`] is one independently configured model persona participating
//! in a panel run. Workers are owned by the caller's configuration layer and
//! are never mutated by the orchestrator.

use serde::{Deserialize, Serialize};

/// Sampling parameters forwarded verbatim to the inference provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    pub temperature: f32,
    pub top_p: Option<f32>,
    pub max_tokens: u32,
    pub presence_penalty: Option<f32>,
    pub frequency_penalty: Option<f32>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: None,
            max_tokens: 2048,
            presence_penalty: None,
            frequency_penalty: None,
        }
    }
}

impl SamplingConfig {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }
}

/// One configured panel member (Entity)
///
/// Immutable for the duration of a run; referenced by id in all outputs
/// and progress events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Worker {
    /// Stable identifier, unique within one roster
    pub id: String,
    /// Human-readable name used in prompts and verdicts
    pub display_name: String,
    /// Provider model identifier (e.g. "gpt-4o", "claude-sonnet-4.5")
    pub model_id: String,
    /// System persona injected as the first message
    pub system_persona: String,
    /// Sampling parameters for this worker's calls
    pub sampling: SamplingConfig,
    /// Whether this worker's persona assumes external tool access
    pub has_external_tools: bool,
}

impl Worker {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            model_id: model_id.into(),
            system_persona: String::new(),
            sampling: SamplingConfig::default(),
            has_external_tools: false,
        }
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.system_persona = persona.into();
        self
    }

    pub fn with_sampling(mut self, sampling: SamplingConfig) -> Self {
        self.sampling = sampling;
        self
    }

    pub fn with_external_tools(mut self) -> Self {
        self.has_external_tools = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_builder() {
        let worker = Worker::new("w1", "Analyst", "gpt-4o")
            .with_persona("You are a market analyst.")
            .with_sampling(SamplingConfig::default().with_temperature(0.3));

        assert_eq!(worker.id, "w1");
        assert_eq!(worker.display_name, "Analyst");
        assert_eq!(worker.sampling.temperature, 0.3);
        assert!(!worker.has_external_tools);
    }

    #[test]
    fn sampling_defaults() {
        let sampling = SamplingConfig::default();
        assert_eq!(sampling.max_tokens, 2048);
        assert!(sampling.top_p.is_none());
    }
}
