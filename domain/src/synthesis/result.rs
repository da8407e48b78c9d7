//! Synthesis result and cache entry value objects.

use crate::synthesis::structured::StructuredSynthesis;
use crate::synthesis::tier::Tier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The synthesized verdict for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SynthesisResult {
    pub verdict_text: String,
    pub tier: Tier,
    /// Model that actually produced the verdict, including on cache
    /// replays (the fallback model after a failover)
    pub model_id: String,
    pub cost_usd: f64,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub structured: Option<StructuredSynthesis>,
    /// Whether this verdict was served from the cache at zero cost
    pub from_cache: bool,
}

impl SynthesisResult {
    /// Rehydrate a result from a cache entry with zero incremental cost.
    /// The reported model is the one that produced the stored verdict, not
    /// whatever synthesizer is currently configured.
    pub fn from_cache_entry(entry: &CacheEntry, tier: Tier) -> Self {
        Self {
            verdict_text: entry.verdict_text.clone(),
            tier,
            model_id: entry.model_id.clone(),
            cost_usd: 0.0,
            prompt_tokens: 0,
            completion_tokens: 0,
            structured: entry.structured.clone(),
            from_cache: true,
        }
    }
}

/// One stored synthesis computation, keyed by content fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub verdict_text: String,
    pub structured: Option<StructuredSynthesis>,
    /// What the original computation cost; replays cost nothing
    pub cost_usd: f64,
    /// Model that produced the verdict (the fallback after a failover)
    pub model_id: String,
    pub created_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn new(
        fingerprint: impl Into<String>,
        verdict_text: impl Into<String>,
        structured: Option<StructuredSynthesis>,
        cost_usd: f64,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            fingerprint: fingerprint.into(),
            verdict_text: verdict_text.into(),
            structured,
            cost_usd,
            model_id: model_id.into(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_replay_costs_nothing_and_keeps_the_producing_model() {
        let entry = CacheEntry::new("abc123", "The market is growing", None, 0.05, "gpt-4o-mini");
        let result = SynthesisResult::from_cache_entry(&entry, Tier::Balanced);

        assert!(result.from_cache);
        assert_eq!(result.cost_usd, 0.0);
        assert_eq!(result.verdict_text, "The market is growing");
        assert_eq!(result.tier, Tier::Balanced);
        assert_eq!(result.model_id, "gpt-4o-mini");
    }
}
