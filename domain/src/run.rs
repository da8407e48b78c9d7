//! Run state machine and cost value objects.

use serde::{Deserialize, Serialize};

/// Phase of a panel run.
///
/// `Idle → RunningWorkers → WorkersComplete → RunningSynthesis → Complete`,
/// with `Cancelled` and `Error` as terminal exits reachable from any
/// non-terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunPhase {
    Idle,
    RunningWorkers,
    WorkersComplete,
    RunningSynthesis,
    Complete,
    Cancelled,
    Error,
}

impl RunPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunPhase::Idle => "idle",
            RunPhase::RunningWorkers => "running-workers",
            RunPhase::WorkersComplete => "workers-complete",
            RunPhase::RunningSynthesis => "running-synthesis",
            RunPhase::Complete => "complete",
            RunPhase::Cancelled => "cancelled",
            RunPhase::Error => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunPhase::Complete | RunPhase::Cancelled | RunPhase::Error
        )
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cost totals for one run, split by stage.
///
/// Private to a single run invocation; never shared across concurrent runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// Accumulated cost of all settled worker calls
    pub workers_usd: f64,
    /// Cost of the synthesis call (zero on a cache hit)
    pub synthesis_usd: f64,
}

impl CostBreakdown {
    pub fn total_usd(&self) -> f64 {
        self.workers_usd + self.synthesis_usd
    }
}
