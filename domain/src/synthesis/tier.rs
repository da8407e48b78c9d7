//! Synthesis depth tiers.
//!
//! A [`Tier`] is a preset depth/cost profile for the merge stage. Each tier
//! selects sampling defaults and a distinct instruction template; callers
//! can override temperature and token budget per run.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Preset synthesis depth/cost profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Shallow merge, cheapest
    Quick,
    /// Standard cross-comparison
    #[default]
    Balanced,
    /// Full cross-examination of agreements and conflicts
    Deep,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Quick => "quick",
            Tier::Balanced => "balanced",
            Tier::Deep => "deep",
        }
    }

    /// Default sampling temperature for this tier.
    pub fn default_temperature(&self) -> f32 {
        match self {
            Tier::Quick => 0.3,
            Tier::Balanced => 0.5,
            Tier::Deep => 0.7,
        }
    }

    /// Default completion-token budget for this tier.
    pub fn default_max_tokens(&self) -> u32 {
        match self {
            Tier::Quick => 1024,
            Tier::Balanced => 2048,
            Tier::Deep => 4096,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quick" | "q" => Ok(Tier::Quick),
            "balanced" | "b" => Ok(Tier::Balanced),
            "deep" | "d" => Ok(Tier::Deep),
            _ => Err(format!("Invalid tier: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_roundtrip() {
        for tier in [Tier::Quick, Tier::Balanced, Tier::Deep] {
            let parsed: Tier = tier.to_string().parse().unwrap();
            assert_eq!(parsed, tier);
        }
    }

    #[test]
    fn default_is_balanced() {
        assert_eq!(Tier::default(), Tier::Balanced);
    }

    #[test]
    fn presets_deepen_with_tier() {
        assert!(Tier::Quick.default_max_tokens() < Tier::Deep.default_max_tokens());
        assert!(Tier::Quick.default_temperature() < Tier::Deep.default_temperature());
    }

    #[test]
    fn invalid_tier_rejected() {
        assert!("extreme".parse::<Tier>().is_err());
    }
}
