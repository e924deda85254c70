//! Tunable scoring policy.
//!
//! The few scoring rules that have more than one reasonable reading are
//! named knobs here. Defaults reproduce the canonical scores.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum PolicyError {
    #[error("Unknown positivity policy: {0} (expected strict or lax)")]
    UnknownPositivity(String),

    #[error("Unknown aggregation mode: {0} (expected sum or weighted)")]
    UnknownAggregation(String),

    #[error("Invalid tier thresholds: {0}")]
    InvalidThresholds(String),
}

/// Which ratio metrics must be strictly positive to score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PositivityPolicy {
    /// P/E, PEG, P/B, dividend yield and payout ratio all require > 0
    #[default]
    Strict,
    /// P/B and dividend yield only need to be present
    Lax,
}

impl FromStr for PositivityPolicy {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(PositivityPolicy::Strict),
            "lax" => Ok(PositivityPolicy::Lax),
            other => Err(PolicyError::UnknownPositivity(other.to_string())),
        }
    }
}

/// How sub-scores combine into the total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// Plain sum of the capped sub-scores
    #[default]
    Sum,
    /// `Σ sub × cap / 100`. Applies the caps a second time as weights, so
    /// totals land far below the sum. Kept for comparison only.
    Weighted,
}

impl FromStr for AggregationMode {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sum" => Ok(AggregationMode::Sum),
            "weighted" => Ok(AggregationMode::Weighted),
            other => Err(PolicyError::UnknownAggregation(other.to_string())),
        }
    }
}

/// Lower bounds of the display tiers. Anything below `weak` is "Very Weak".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub excellent: u32,
    pub good: u32,
    pub average: u32,
    pub weak: u32,
}

impl TierThresholds {
    pub fn new(excellent: u32, good: u32, average: u32, weak: u32) -> Result<Self, PolicyError> {
        if excellent > 100 {
            return Err(PolicyError::InvalidThresholds(format!(
                "excellent threshold {} exceeds 100",
                excellent
            )));
        }
        if !(excellent > good && good > average && average > weak) {
            return Err(PolicyError::InvalidThresholds(format!(
                "thresholds must strictly decrease, got {}/{}/{}/{}",
                excellent, good, average, weak
            )));
        }
        Ok(Self {
            excellent,
            good,
            average,
            weak,
        })
    }
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            excellent: 80,
            good: 70,
            average: 50,
            weak: 35,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub positivity: PositivityPolicy,
    pub aggregation: AggregationMode,
    pub tiers: TierThresholds,
}

impl ScoringPolicy {
    pub fn with_positivity(mut self, positivity: PositivityPolicy) -> Self {
        self.positivity = positivity;
        self
    }

    pub fn with_aggregation(mut self, aggregation: AggregationMode) -> Self {
        self.aggregation = aggregation;
        self
    }

    pub fn with_tiers(mut self, tiers: TierThresholds) -> Self {
        self.tiers = tiers;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_policies() {
        assert_eq!("strict".parse::<PositivityPolicy>(), Ok(PositivityPolicy::Strict));
        assert_eq!(" LAX ".parse::<PositivityPolicy>(), Ok(PositivityPolicy::Lax));
        assert!("loose".parse::<PositivityPolicy>().is_err());

        assert_eq!("sum".parse::<AggregationMode>(), Ok(AggregationMode::Sum));
        assert_eq!("Weighted".parse::<AggregationMode>(), Ok(AggregationMode::Weighted));
        assert!("average".parse::<AggregationMode>().is_err());
    }

    #[test]
    fn test_tier_thresholds_validation() {
        assert!(TierThresholds::new(80, 65, 41, 35).is_ok());
        assert!(TierThresholds::new(80, 80, 50, 35).is_err());
        assert!(TierThresholds::new(120, 70, 50, 35).is_err());
        assert!(TierThresholds::new(80, 50, 70, 35).is_err());
    }

    #[test]
    fn test_defaults() {
        let policy = ScoringPolicy::default();
        assert_eq!(policy.positivity, PositivityPolicy::Strict);
        assert_eq!(policy.aggregation, AggregationMode::Sum);
        assert_eq!(policy.tiers.good, 70);
        assert_eq!(policy.tiers.average, 50);
    }
}
