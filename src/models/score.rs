use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// The weight assigned to each scoring component; must sum to 1.0
/// (spec §3 invariant 5, checked by [`ScoreWeights::is_normalized`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub technical: f64,
    pub value: f64,
    pub budget: f64,
    pub excellence: f64,
}

impl ScoreWeights {
    pub const GAMING: ScoreWeights = ScoreWeights {
        technical: 0.45,
        value: 0.30,
        budget: 0.20,
        excellence: 0.05,
    };

    pub const GENERAL: ScoreWeights = ScoreWeights {
        technical: 0.35,
        value: 0.40,
        budget: 0.20,
        excellence: 0.05,
    };

    pub fn is_normalized(&self) -> bool {
        (self.technical + self.value + self.budget + self.excellence - 1.0).abs() < 1e-6
    }
}

/// Breakdown of a single product's score against a user's extracted
/// features, as produced by the [`crate::scoring::ScoringEngine`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    pub technical: f64,
    pub value: f64,
    pub budget: f64,
    pub excellence: f64,
    pub weights: ScoreWeights,
    pub final_score: f64,
    pub matched_features: BTreeSet<String>,
    pub rationale: String,
}

impl Score {
    pub fn compute_final(
        technical: f64,
        value: f64,
        budget: f64,
        excellence: f64,
        weights: ScoreWeights,
    ) -> f64 {
        (technical * weights.technical
            + value * weights.value
            + budget * weights.budget
            + excellence * weights.excellence)
            .clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gaming_and_general_weights_are_normalized() {
        assert!(ScoreWeights::GAMING.is_normalized());
        assert!(ScoreWeights::GENERAL.is_normalized());
    }

    #[test]
    fn compute_final_clamps_to_unit_interval() {
        let w = ScoreWeights::GAMING;
        let f = Score::compute_final(1.0, 1.0, 1.0, 1.0, w);
        assert!((0.0..=1.0).contains(&f));
        assert!((f - 1.0).abs() < 1e-9);
    }
}
