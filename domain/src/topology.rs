//! Execution topology for a panel run.
//!
//! [`Topology`] is the dispatch/ordering discipline for worker calls:
//!
//! - **Parallel**: all workers independent, dispatched concurrently
//! - **Pipeline**: worker *i* sees the outputs of workers `1..i-1`
//! - **Debate**: workers see all peers' current-round outputs and respond
//! - **Synthesis**: parallel execution followed by an explicit merge stage
//!   (the default path)

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dispatch/ordering discipline for worker calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Topology {
    /// All workers independent, dispatched concurrently
    Parallel,
    /// Workers invoked strictly in roster order, each seeing prior outputs
    Pipeline,
    /// Round-based: each worker sees all peers' latest text and rebuts
    Debate,
    /// Parallel execution followed by a synthesized verdict
    #[default]
    Synthesis,
}

impl fmt::Display for Topology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topology::Parallel => write!(f, "parallel"),
            Topology::Pipeline => write!(f, "pipeline"),
            Topology::Debate => write!(f, "debate"),
            Topology::Synthesis => write!(f, "synthesis"),
        }
    }
}

impl std::str::FromStr for Topology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "parallel" => Ok(Topology::Parallel),
            "pipeline" => Ok(Topology::Pipeline),
            "debate" => Ok(Topology::Debate),
            "synthesis" => Ok(Topology::Synthesis),
            _ => Err(format!("Invalid topology: {}", s)),
        }
    }
}

/// Round configuration for the debate topology.
///
/// Rounds are bounded so a misconfigured caller cannot trigger an
/// unbounded sequence of paid calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebateConfig {
    rounds: u32,
}

impl DebateConfig {
    pub const MIN_ROUNDS: u32 = 1;
    pub const MAX_ROUNDS: u32 = 4;

    /// Create a debate config, clamping rounds to the supported range.
    pub fn new(rounds: u32) -> Self {
        Self {
            rounds: rounds.clamp(Self::MIN_ROUNDS, Self::MAX_ROUNDS),
        }
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self { rounds: 2 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_roundtrip() {
        for topology in [
            Topology::Parallel,
            Topology::Pipeline,
            Topology::Debate,
            Topology::Synthesis,
        ] {
            let parsed: Topology = topology.to_string().parse().unwrap();
            assert_eq!(parsed, topology);
        }
    }

    #[test]
    fn default_is_synthesis() {
        assert_eq!(Topology::default(), Topology::Synthesis);
    }

    #[test]
    fn invalid_topology_rejected() {
        assert!("ring".parse::<Topology>().is_err());
    }

    #[test]
    fn debate_rounds_clamped() {
        assert_eq!(DebateConfig::new(0).rounds(), 1);
        assert_eq!(DebateConfig::new(2).rounds(), 2);
        assert_eq!(DebateConfig::new(99).rounds(), 4);
        assert_eq!(DebateConfig::default().rounds(), 2);
    }
}
