//! Domain layer for the panel orchestrator
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Panel
//!
//! A panel is a roster of independently configured model workers that each
//! analyze the same task. The execution [`Topology`] decides how their calls
//! are dispatched (parallel, pipeline, debate, or synthesis).
//!
//! ## Synthesis
//!
//! Under the synthesis topology the workers' outputs are merged by a
//! synthesizer model into a single verdict, optionally weighted by each
//! output's reliability score and cached by content fingerprint.

pub mod core;
pub mod events;
pub mod output;
pub mod run;
pub mod stream;
pub mod synthesis;
pub mod topology;
pub mod weighting;
pub mod worker;

// Re-export commonly used types
pub use core::task::Task;
pub use events::ProgressEvent;
pub use output::{TokenUsage, WorkerOutput};
pub use run::{CostBreakdown, RunPhase};
pub use stream::StreamEvent;
pub use synthesis::{
    CacheEntry, Conflict, KeyInsight, StructuredSynthesis, SynthesisPrompt, SynthesisResult, Tier,
    parse_structured, synthesis_fingerprint,
};
pub use topology::{DebateConfig, Topology};
pub use weighting::{
    DOMINANCE_THRESHOLD, ImbalanceReport, WeightedOutput, compute_weights, detect_imbalance,
};
pub use worker::{SamplingConfig, Worker};
