//! Impact IQ Score — composite 0–100 rating from five weighted sub-scores.

use serde::{Deserialize, Serialize};

/// Weights in percent; they sum to 100.
pub const WEIGHT_REPORTING_QUALITY: i32 = 20;
pub const WEIGHT_REACH: i32 = 20;
pub const WEIGHT_SOCIAL_ROI: i32 = 25;
pub const WEIGHT_OUTCOME_EFFECTIVENESS: i32 = 20;
pub const WEIGHT_TRANSPARENCY_GOVERNANCE: i32 = 15;

pub const MAX_SCORE: i32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubScores {
    pub reporting_quality: i32,
    pub reach: i32,
    pub social_roi: i32,
    pub outcome_effectiveness: i32,
    pub transparency_governance: i32,
}

/// Clamp a raw sub-score into 0..=100.
pub fn clamp_score(value: i32) -> i32 {
    value.clamp(0, MAX_SCORE)
}

/// Weighted Impact IQ; each input is clamped first and halves round up.
///
/// Summed in hundredths so `.5` boundaries are exact.
pub fn impact_iq(scores: &SubScores) -> i32 {
    let total = clamp_score(scores.reporting_quality) * WEIGHT_REPORTING_QUALITY
        + clamp_score(scores.reach) * WEIGHT_REACH
        + clamp_score(scores.social_roi) * WEIGHT_SOCIAL_ROI
        + clamp_score(scores.outcome_effectiveness) * WEIGHT_OUTCOME_EFFECTIVENESS
        + clamp_score(scores.transparency_governance) * WEIGHT_TRANSPARENCY_GOVERNANCE;
    clamp_score((total + 50) / 100)
}

/// Letter grade shown next to the score.
pub fn grade(score: i32) -> &'static str {
    match score {
        s if s >= 90 => "A+",
        s if s >= 80 => "A",
        s if s >= 70 => "B",
        s if s >= 60 => "C",
        _ => "D",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(v: i32) -> SubScores {
        SubScores {
            reporting_quality: v,
            reach: v,
            social_roi: v,
            outcome_effectiveness: v,
            transparency_governance: v,
        }
    }

    #[test]
    fn weights_sum_to_one() {
        let sum = WEIGHT_REPORTING_QUALITY
            + WEIGHT_REACH
            + WEIGHT_SOCIAL_ROI
            + WEIGHT_OUTCOME_EFFECTIVENESS
            + WEIGHT_TRANSPARENCY_GOVERNANCE;
        assert_eq!(sum, 100);
    }

    #[test]
    fn uniform_scores_pass_through() {
        assert_eq!(impact_iq(&uniform(100)), 100);
        assert_eq!(impact_iq(&uniform(0)), 0);
        assert_eq!(impact_iq(&uniform(73)), 73);
    }

    #[test]
    fn out_of_range_inputs_are_clamped() {
        assert_eq!(impact_iq(&uniform(250)), 100);
        assert_eq!(impact_iq(&uniform(-40)), 0);
    }

    #[test]
    fn social_roi_carries_the_largest_weight() {
        let roi_only = SubScores {
            social_roi: 100,
            ..Default::default()
        };
        let governance_only = SubScores {
            transparency_governance: 100,
            ..Default::default()
        };
        assert_eq!(impact_iq(&roi_only), 25);
        assert_eq!(impact_iq(&governance_only), 15);
    }

    #[test]
    fn mixed_scores_round_to_nearest() {
        // 0.2*81 + 0.2*77 + 0.25*90 + 0.2*68 + 0.15*85 = 80.45
        let s = SubScores {
            reporting_quality: 81,
            reach: 77,
            social_roi: 90,
            outcome_effectiveness: 68,
            transparency_governance: 85,
        };
        assert_eq!(impact_iq(&s), 80);
    }

    #[test]
    fn exact_half_rounds_up() {
        // 18.8 + 16 + 8.75 + 17.8 + 0.15 = 61.5
        let s = SubScores {
            reporting_quality: 94,
            reach: 80,
            social_roi: 35,
            outcome_effectiveness: 89,
            transparency_governance: 1,
        };
        assert_eq!(impact_iq(&s), 62);

        // 0.25 * 2 = 0.5
        let roi = SubScores {
            social_roi: 2,
            ..Default::default()
        };
        assert_eq!(impact_iq(&roi), 1);
    }

    #[test]
    fn grade_boundaries() {
        assert_eq!(grade(90), "A+");
        assert_eq!(grade(89), "A");
        assert_eq!(grade(80), "A");
        assert_eq!(grade(70), "B");
        assert_eq!(grade(60), "C");
        assert_eq!(grade(59), "D");
    }
}
