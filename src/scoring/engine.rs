use crate::models::features::{ExtractedFeatures, FeatureValue};
use crate::models::product::ProductFeatures;
use crate::models::score::{Score, ScoreWeights};

use super::weights::category_weight;

const EXCELLENCE_CAP: f64 = 0.25;
const EXPECTED_MAX_VALUE_RATIO: f64 = 0.8;
const RATIONALE_CAP: usize = 6;
const SIGNIFICANCE_THRESHOLD: f64 = 0.7;

/// Non-category, non-technical feature keys that the technical-score
/// loop must not treat as scorable category features.
const NON_TECHNICAL_KEYS: &[&str] = &["min_price", "max_price"];

/// Computes hybrid (technical + value + budget + excellence) scores
/// (spec §4.3). Stateless; safe for concurrent calls.
#[derive(Debug, Clone, Copy)]
pub struct ScoringEngine {
    enable_excellence_bonus: bool,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self { enable_excellence_bonus: true }
    }
}

impl ScoringEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an engine with `scoring.enable_excellence_bonus` (spec §6)
    /// instead of its default of `true`.
    pub fn with_excellence_bonus(enable_excellence_bonus: bool) -> Self {
        Self { enable_excellence_bonus }
    }

    pub fn score(
        &self,
        user: &ExtractedFeatures,
        product: &ProductFeatures,
        category: &str,
        price_rupees: Option<i64>,
        budget_rupees: Option<i64>,
    ) -> Score {
        let (technical, matched, rationale_items) = self.technical_component(user, product, category);
        let value = self.value_component(technical, price_rupees);
        let budget = self.budget_component(price_rupees, budget_rupees);
        let excellence = if self.enable_excellence_bonus { self.excellence_component(product) } else { 0.0 };

        let gaming_context = user.get_text("usage_context") == Some("gaming") || category == "gaming_monitor";
        let weights = if gaming_context {
            ScoreWeights::GAMING
        } else {
            ScoreWeights::GENERAL
        };

        let final_score = Score::compute_final(technical, value, budget, excellence, weights);
        let rationale = build_rationale(&rationale_items);

        Score {
            technical,
            value,
            budget,
            excellence,
            weights,
            final_score,
            matched_features: matched,
            rationale,
        }
    }

    fn technical_component(
        &self,
        user: &ExtractedFeatures,
        product: &ProductFeatures,
        category: &str,
    ) -> (f64, std::collections::BTreeSet<String>, Vec<(String, f64, String)>) {
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        let mut matched = std::collections::BTreeSet::new();
        let mut items = Vec::new();

        for (name, user_value, _confidence) in user.iter() {
            if NON_TECHNICAL_KEYS.contains(&name) {
                continue;
            }
            let weight = category_weight(category, name);
            denominator += weight;

            let product_value = product.features.get(name);
            let (match_score, label) = match (user_value, product_value) {
                (_, None) => (0.0, "missing".to_string()),
                (FeatureValue::Number(u), Some(FeatureValue::Number(p))) => {
                    numeric_match(name, *u, *p)
                }
                (FeatureValue::Text(u), Some(FeatureValue::Text(p))) => categorical_match(u, p),
                _ => (0.0, "mismatch".to_string()),
            };

            numerator += weight * match_score;
            if match_score > SIGNIFICANCE_THRESHOLD {
                matched.insert(name.to_string());
            }
            items.push((name.to_string(), match_score, label));
        }

        let technical = if denominator > 0.0 {
            (numerator / denominator).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (technical, matched, items)
    }

    fn value_component(&self, technical: f64, price_rupees: Option<i64>) -> f64 {
        match price_rupees {
            None => 0.5,
            Some(price) if price > 0 => {
                let raw = technical / (price as f64 / 1000.0);
                (raw / EXPECTED_MAX_VALUE_RATIO).clamp(0.0, 1.0)
            }
            Some(_) => 0.0,
        }
    }

    fn budget_component(&self, price_rupees: Option<i64>, budget_rupees: Option<i64>) -> f64 {
        let (Some(price), Some(budget)) = (price_rupees, budget_rupees) else {
            return 0.70;
        };
        if budget <= 0 {
            return 0.70;
        }
        let ratio = price as f64 / budget as f64;
        if ratio <= 0.6 {
            1.00
        } else if ratio <= 0.8 {
            0.90
        } else if ratio <= 0.9 {
            0.80
        } else if ratio <= 1.0 {
            0.70
        } else if ratio <= 1.2 {
            0.50
        } else if ratio <= 1.5 {
            0.30
        } else {
            0.20
        }
    }

    fn excellence_component(&self, product: &ProductFeatures) -> f64 {
        let mut bonus: f64 = 0.0;

        if let Some(refresh) = product.features.get_number("refresh_rate") {
            bonus += if refresh >= 240.0 {
                0.15
            } else if refresh >= 165.0 {
                0.10
            } else if refresh >= 144.0 {
                0.05
            } else {
                0.0
            };
        }

        match product.features.get_text("resolution") {
            Some("4k") => bonus += 0.10,
            Some("1440p") => bonus += 0.05,
            _ => {}
        }

        if let Some(size) = product.features.get_number("size") {
            if (27.0..=35.0).contains(&size) {
                bonus += 0.05;
            }
        }

        bonus.min(EXCELLENCE_CAP)
    }
}

/// Numeric match: refresh_rate gets the documented upgrade relation
/// (spec's Open Questions narrows "upgrade" to refresh rate only);
/// other numeric features use tolerance-window scoring.
fn numeric_match(feature_name: &str, user_value: f64, product_value: f64) -> (f64, String) {
    if feature_name == "refresh_rate" && product_value > user_value {
        return (0.95, "upgrade".to_string());
    }
    if product_value == user_value {
        return (1.0, "exact".to_string());
    }

    let tolerance_fraction = numeric_tolerance(feature_name);
    let tolerance_band = user_value.abs() * tolerance_fraction;
    if tolerance_band <= 0.0 {
        return (0.0, "mismatch".to_string());
    }

    let diff = (product_value - user_value).abs();
    if diff <= tolerance_band {
        let score = 1.0 - 0.15 * (diff / tolerance_band);
        (score.clamp(0.85, 1.0), "tolerance".to_string())
    } else if diff <= 2.0 * tolerance_band {
        let over = diff - tolerance_band;
        let score = 0.85 * (1.0 - over / tolerance_band);
        (score.max(0.0), "tolerance".to_string())
    } else {
        (0.0, "mismatch".to_string())
    }
}

fn numeric_tolerance(feature_name: &str) -> f64 {
    match feature_name {
        "refresh_rate" => 0.10,
        "size" => 0.15,
        _ => 0.12,
    }
}

fn categorical_match(user_value: &str, product_value: &str) -> (f64, String) {
    if user_value == product_value {
        (1.0, "exact".to_string())
    } else {
        (0.0, "mismatch".to_string())
    }
}

fn build_rationale(items: &[(String, f64, String)]) -> String {
    let mut significant: Vec<&(String, f64, String)> = items
        .iter()
        .filter(|(_, score, _)| *score > 0.0)
        .collect();
    significant.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    significant
        .into_iter()
        .take(RATIONALE_CAP)
        .map(|(name, _, label)| format!("{name}:{label}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::features::FeatureValue;

    fn user_features(pairs: &[(&str, FeatureValue)]) -> ExtractedFeatures {
        let mut f = ExtractedFeatures::empty();
        for (name, value) in pairs {
            f.insert(*name, value.clone(), 0.9);
        }
        f
    }

    fn product_features(pairs: &[(&str, FeatureValue)]) -> ProductFeatures {
        ProductFeatures {
            features: user_features(pairs),
            overall_confidence: 0.9,
        }
    }

    #[test]
    fn score_components_are_within_unit_interval() {
        let user = user_features(&[("refresh_rate", FeatureValue::Number(144.0))]);
        let product = product_features(&[("refresh_rate", FeatureValue::Number(165.0))]);
        let score = ScoringEngine::new().score(&user, &product, "gaming_monitor", Some(30000), Some(40000));
        for v in [score.technical, score.value, score.budget, score.excellence, score.final_score] {
            assert!((0.0..=1.0).contains(&v));
        }
        assert!(score.weights.is_normalized());
    }

    #[test]
    fn adding_matching_feature_never_decreases_final_score() {
        let user = user_features(&[("refresh_rate", FeatureValue::Number(144.0))]);
        let baseline_product = product_features(&[]);
        let matching_product = product_features(&[("refresh_rate", FeatureValue::Number(144.0))]);

        let baseline = ScoringEngine::new().score(&user, &baseline_product, "gaming_monitor", Some(30000), Some(40000));
        let improved = ScoringEngine::new().score(&user, &matching_product, "gaming_monitor", Some(30000), Some(40000));
        assert!(improved.final_score >= baseline.final_score);
    }

    #[test]
    fn refresh_rate_upgrade_scores_near_full() {
        let user = user_features(&[("refresh_rate", FeatureValue::Number(144.0))]);
        let product = product_features(&[("refresh_rate", FeatureValue::Number(165.0))]);
        let score = ScoringEngine::new().score(&user, &product, "gaming_monitor", Some(30000), Some(40000));
        assert!(score.matched_features.contains("refresh_rate"));
    }

    #[test]
    fn scoring_is_deterministic() {
        let user = user_features(&[
            ("refresh_rate", FeatureValue::Number(144.0)),
            ("size", FeatureValue::Number(27.0)),
        ]);
        let product = product_features(&[
            ("refresh_rate", FeatureValue::Number(144.0)),
            ("size", FeatureValue::Number(27.0)),
        ]);
        let a = ScoringEngine::new().score(&user, &product, "gaming_monitor", Some(30000), Some(40000));
        let b = ScoringEngine::new().score(&user, &product, "gaming_monitor", Some(30000), Some(40000));
        assert_eq!(a, b);
    }

    #[test]
    fn missing_price_gives_neutral_value_and_budget() {
        let user = user_features(&[("refresh_rate", FeatureValue::Number(144.0))]);
        let product = product_features(&[("refresh_rate", FeatureValue::Number(144.0))]);
        let score = ScoringEngine::new().score(&user, &product, "gaming_monitor", None, Some(40000));
        assert_eq!(score.value, 0.5);
    }

    #[test]
    fn budget_ratio_bands_match_spec_table() {
        let engine = ScoringEngine::new();
        assert_eq!(engine.budget_component(Some(60), Some(100)), 1.00);
        assert_eq!(engine.budget_component(Some(80), Some(100)), 0.90);
        assert_eq!(engine.budget_component(Some(90), Some(100)), 0.80);
        assert_eq!(engine.budget_component(Some(100), Some(100)), 0.70);
        assert_eq!(engine.budget_component(Some(120), Some(100)), 0.50);
        assert_eq!(engine.budget_component(Some(150), Some(100)), 0.30);
        assert_eq!(engine.budget_component(Some(200), Some(100)), 0.20);
        assert_eq!(engine.budget_component(Some(100), None), 0.70);
    }
}
