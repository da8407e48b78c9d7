//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted to domain/application types
//! with `to_*` methods; unknown enum values fall back to defaults with a
//! logged warning rather than failing the whole load.

use panel_application::{RetryPolicy, RunPanelInput, SynthesisConfig};
use panel_domain::{DebateConfig, SamplingConfig, Tier, Topology, Worker};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Provider endpoint and credentials
    pub provider: ProviderSettings,
    /// Synthesis stage settings
    pub synthesis: FileSynthesisConfig,
    /// Retry/backoff settings
    pub retry: FileRetryConfig,
    /// Run-level settings (topology, debate rounds)
    pub run: FileRunConfig,
    /// Worker roster (`[[workers]]` tables)
    pub workers: Vec<FileWorkerConfig>,
}

impl FileConfig {
    /// Validate the configuration, returning all detected issues.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.synthesis.tier.parse::<Tier>().is_err() {
            issues.push(format!(
                "synthesis.tier: unknown value '{}', falling back to 'balanced'",
                self.synthesis.tier
            ));
        }
        if self.run.topology.parse::<Topology>().is_err() {
            issues.push(format!(
                "run.topology: unknown value '{}', falling back to 'synthesis'",
                self.run.topology
            ));
        }
        if self.synthesis.model.trim().is_empty() {
            issues.push("synthesis.model: model name cannot be empty".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        for (index, worker) in self.workers.iter().enumerate() {
            if worker.model.trim().is_empty() {
                issues.push(format!("workers[{index}].model: model name cannot be empty"));
            }
            if let Some(id) = &worker.id
                && !seen.insert(id.as_str())
            {
                issues.push(format!("workers[{index}].id: duplicate worker id '{id}'"));
            }
        }

        issues
    }

    /// Build the worker roster, skipping entries without a model id.
    pub fn to_workers(&self) -> Vec<Worker> {
        self.workers
            .iter()
            .enumerate()
            .filter_map(|(index, w)| w.to_worker(index))
            .collect()
    }

    /// Assemble a complete run input for the given task.
    pub fn to_run_input(&self, task: impl Into<String>) -> RunPanelInput {
        RunPanelInput::new(task, self.to_workers())
            .with_topology(self.run.parse_topology())
            .with_synthesis(self.synthesis.to_synthesis_config())
            .with_debate(DebateConfig::new(self.run.debate_rounds))
    }
}

/// Provider settings (`[provider]` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// OpenAI-compatible API base URL
    pub base_url: String,
    /// Bearer token; usually supplied via `PANEL_PROVIDER__API_KEY`
    pub api_key: Option<String>,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            request_timeout_secs: 120,
            connect_timeout_secs: 10,
        }
    }
}

/// Synthesis settings (`[synthesis]` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSynthesisConfig {
    pub tier: String,
    pub model: String,
    pub fallback_model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    pub custom_instructions: Option<String>,
    pub structured_output: bool,
    pub use_weighting: bool,
    pub use_cache: bool,
    pub use_streaming: bool,
}

impl Default for FileSynthesisConfig {
    fn default() -> Self {
        let defaults = SynthesisConfig::default();
        Self {
            tier: defaults.tier.to_string(),
            model: defaults.synthesizer_model_id,
            fallback_model: None,
            temperature: None,
            max_tokens: None,
            custom_instructions: None,
            structured_output: defaults.structured_output,
            use_weighting: defaults.use_weighting,
            use_cache: defaults.use_cache,
            use_streaming: defaults.use_streaming,
        }
    }
}

impl FileSynthesisConfig {
    pub fn to_synthesis_config(&self) -> SynthesisConfig {
        let tier = self.tier.parse::<Tier>().unwrap_or_else(|_| {
            warn!(tier = %self.tier, "unknown synthesis tier, using balanced");
            Tier::default()
        });

        SynthesisConfig {
            tier,
            synthesizer_model_id: self.model.clone(),
            fallback_model_id: self.fallback_model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            custom_instructions: self.custom_instructions.clone(),
            structured_output: self.structured_output,
            use_weighting: self.use_weighting,
            use_cache: self.use_cache,
            use_streaming: self.use_streaming,
        }
    }
}

/// Retry settings (`[retry]` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRetryConfig {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for FileRetryConfig {
    fn default() -> Self {
        let defaults = RetryPolicy::default();
        Self {
            max_attempts: defaults.max_attempts,
            base_delay_ms: defaults.base_delay.as_millis() as u64,
        }
    }
}

impl FileRetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts, Duration::from_millis(self.base_delay_ms))
    }
}

/// Run-level settings (`[run]` section)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRunConfig {
    pub topology: String,
    pub debate_rounds: u32,
}

impl Default for FileRunConfig {
    fn default() -> Self {
        Self {
            topology: Topology::default().to_string(),
            debate_rounds: DebateConfig::default().rounds(),
        }
    }
}

impl FileRunConfig {
    pub fn parse_topology(&self) -> Topology {
        self.topology.parse().unwrap_or_else(|_| {
            warn!(topology = %self.topology, "unknown topology, using synthesis");
            Topology::default()
        })
    }
}

/// One worker entry (`[[workers]]` table)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileWorkerConfig {
    /// Stable id; defaults to `worker-{position}` when omitted
    pub id: Option<String>,
    pub name: String,
    pub model: String,
    pub persona: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl FileWorkerConfig {
    fn to_worker(&self, index: usize) -> Option<Worker> {
        if self.model.trim().is_empty() {
            warn!(index, "worker entry has no model id, skipping");
            return None;
        }

        let id = self
            .id
            .clone()
            .unwrap_or_else(|| format!("worker-{}", index + 1));
        let name = if self.name.trim().is_empty() {
            id.clone()
        } else {
            self.name.clone()
        };

        let mut worker = Worker::new(id, name, self.model.clone());
        if let Some(persona) = &self.persona {
            worker = worker.with_persona(persona.clone());
        }

        let mut sampling = SamplingConfig::default();
        if let Some(temperature) = self.temperature {
            sampling = sampling.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            sampling = sampling.with_max_tokens(max_tokens);
        }
        Some(worker.with_sampling(sampling))
    }
}
