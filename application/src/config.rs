//! Synthesis configuration.

use panel_domain::{SamplingConfig, Tier};

/// Caller-supplied configuration for the synthesis stage.
///
/// Tier presets supply sampling defaults; `temperature`/`max_tokens`
/// override them per run. Passed in verbatim from the configuration layer
/// and never mutated by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisConfig {
    pub tier: Tier,
    pub synthesizer_model_id: String,
    pub fallback_model_id: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub custom_instructions: Option<String>,
    pub structured_output: bool,
    pub use_weighting: bool,
    pub use_cache: bool,
    pub use_streaming: bool,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            tier: Tier::default(),
            synthesizer_model_id: "gpt-4o".to_string(),
            fallback_model_id: None,
            temperature: None,
            max_tokens: None,
            custom_instructions: None,
            structured_output: true,
            use_weighting: true,
            use_cache: true,
            use_streaming: false,
        }
    }
}

impl SynthesisConfig {
    pub fn new(synthesizer_model_id: impl Into<String>) -> Self {
        Self {
            synthesizer_model_id: synthesizer_model_id.into(),
            ..Default::default()
        }
    }

    pub fn with_tier(mut self, tier: Tier) -> Self {
        self.tier = tier;
        self
    }

    pub fn with_fallback(mut self, model_id: impl Into<String>) -> Self {
        self.fallback_model_id = Some(model_id.into());
        self
    }

    pub fn with_custom_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.custom_instructions = Some(instructions.into());
        self
    }

    pub fn without_cache(mut self) -> Self {
        self.use_cache = false;
        self
    }

    pub fn without_weighting(mut self) -> Self {
        self.use_weighting = false;
        self
    }

    pub fn without_structured_output(mut self) -> Self {
        self.structured_output = false;
        self
    }

    pub fn with_streaming(mut self) -> Self {
        self.use_streaming = true;
        self
    }

    /// Effective sampling parameters: per-run overrides, else tier presets.
    pub fn sampling(&self) -> SamplingConfig {
        SamplingConfig {
            temperature: self.temperature.unwrap_or(self.tier.default_temperature()),
            max_tokens: self.max_tokens.unwrap_or(self.tier.default_max_tokens()),
            top_p: None,
            presence_penalty: None,
            frequency_penalty: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sampling_uses_tier_presets_by_default() {
        let config = SynthesisConfig::new("gpt-4o").with_tier(Tier::Deep);
        let sampling = config.sampling();
        assert_eq!(sampling.temperature, Tier::Deep.default_temperature());
        assert_eq!(sampling.max_tokens, Tier::Deep.default_max_tokens());
    }

    #[test]
    fn overrides_beat_tier_presets() {
        let mut config = SynthesisConfig::new("gpt-4o").with_tier(Tier::Quick);
        config.temperature = Some(0.9);
        config.max_tokens = Some(512);

        let sampling = config.sampling();
        assert_eq!(sampling.temperature, 0.9);
        assert_eq!(sampling.max_tokens, 512);
    }

    #[test]
    fn builder_flags() {
        let config = SynthesisConfig::new("gpt-4o")
            .with_fallback("gpt-4o-mini")
            .without_cache()
            .with_streaming();

        assert_eq!(config.fallback_model_id.as_deref(), Some("gpt-4o-mini"));
        assert!(!config.use_cache);
        assert!(config.use_streaming);
    }
}
