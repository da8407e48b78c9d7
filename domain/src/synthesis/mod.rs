//! Synthesis stage domain logic: tiers, prompts, structured parsing,
//! fingerprints, and result types.

pub mod fingerprint;
pub mod prompt;
pub mod result;
pub mod structured;
pub mod tier;

pub use fingerprint::synthesis_fingerprint;
pub use prompt::SynthesisPrompt;
pub use result::{CacheEntry, SynthesisResult};
pub use structured::{Conflict, KeyInsight, StructuredSynthesis, parse_structured};
pub use tier::Tier;
