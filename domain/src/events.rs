//! Immutable progress events emitted during a run.
//!
//! The coordinator never exposes mutable state to observers. Instead it
//! emits [`ProgressEvent`] values; UI or persistence layers subscribe and
//! project their own state keyed by `worker_id`. There is no ordering
//! guarantee across workers under concurrent topologies.

use crate::run::RunPhase;
use serde::{Deserialize, Serialize};

/// One observable moment in a panel run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProgressEvent {
    /// The run transitioned to a new phase.
    PhaseChanged { phase: RunPhase },
    /// A worker's call was dispatched.
    WorkerStarted { worker_id: String },
    /// An incremental text delta from a streaming worker.
    WorkerDelta { worker_id: String, delta: String },
    /// A worker call settled, successfully or not.
    WorkerSettled { worker_id: String, success: bool },
    /// The running worker-cost total changed.
    CostUpdated { workers_usd: f64 },
    /// The synthesis stage was served from cache at zero cost.
    CacheHit { fingerprint: String },
    /// An incremental text delta from the streaming synthesizer.
    SynthesisDelta { delta: String },
}
