//! Application layer for the panel orchestrator
//!
//! Coordinates panel runs: dispatching worker calls under an execution
//! topology, collecting streaming output and cost, and driving the synthesis
//! pipeline (cache lookup, weighting, prompt build, inference with
//! retry/failover, structured parse, cache write).
//!
//! The layer depends on the domain crate for types and on ports (traits)
//! for everything with a side effect; adapters live in the infrastructure
//! crate.

pub mod config;
pub mod ports;
pub mod resilience;
pub mod use_cases;

#[cfg(test)]
pub(crate) mod testing;

pub use config::SynthesisConfig;
pub use ports::{
    ChannelNotifier, ChatMessage, ChatRole, Completion, InferenceClient, InferenceError, NoProgress,
    NullCache, ProgressNotifier, StreamHandle, SynthesisCache,
};
pub use resilience::{RetryPolicy, SynthesisExhausted};
pub use use_cases::{
    FALLBACK_VERDICT, PanelRunResult, RunPanelError, RunPanelInput, RunPanelUseCase,
};
