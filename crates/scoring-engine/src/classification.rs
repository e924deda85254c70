use scoring_core::ScoreTier;

use crate::policy::TierThresholds;

/// Display tier for a total. Depends on `total` and the thresholds only.
pub fn classify(total: u32, tiers: &TierThresholds) -> ScoreTier {
    if total >= tiers.excellent {
        ScoreTier::Excellent
    } else if total >= tiers.good {
        ScoreTier::Good
    } else if total >= tiers.average {
        ScoreTier::Average
    } else if total >= tiers.weak {
        ScoreTier::Weak
    } else {
        ScoreTier::VeryWeak
    }
}
