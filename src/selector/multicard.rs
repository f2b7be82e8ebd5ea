//! Decides single/duo/trio presentation and builds the comparison table
//! (spec §4.5).

use std::collections::BTreeSet;

use crate::models::features::{ExtractedFeatures, FeatureValue};
use crate::models::product::Product;
use crate::models::score::Score;
use crate::models::selection::{ComparisonRow, ComparisonTable, SelectionMode};

const TOP_GAP_THRESHOLD: f64 = 0.20;
const SINGLE_OVERRIDE_SCORE: f64 = 0.95;
const SINGLE_OVERRIDE_GAP: f64 = 0.30;
const COMPARISON_ROW_CAP: usize = 4;

#[derive(Debug, Clone, Copy)]
pub struct MultiCardSelector {
    top_gap_threshold: f64,
    single_override_score: f64,
    single_override_gap: f64,
}

impl Default for MultiCardSelector {
    fn default() -> Self {
        Self {
            top_gap_threshold: TOP_GAP_THRESHOLD,
            single_override_score: SINGLE_OVERRIDE_SCORE,
            single_override_gap: SINGLE_OVERRIDE_GAP,
        }
    }
}

impl MultiCardSelector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a selector with the configurable thresholds from spec §6
    /// (`multicard.top_gap`, `multicard.single_override_score`,
    /// `multicard.single_override_gap`) instead of their defaults.
    pub fn with_thresholds(top_gap_threshold: f64, single_override_score: f64, single_override_gap: f64) -> Self {
        Self {
            top_gap_threshold,
            single_override_score,
            single_override_gap,
        }
    }

    /// `products`/`scores` must already be in final presentation order
    /// (the order the chosen ranking model emitted).
    pub fn select(
        &self,
        products: &[Product],
        scores: &[Score],
        budget_rupees: Option<i64>,
        user_features: &ExtractedFeatures,
    ) -> (SelectionMode, Option<ComparisonTable>) {
        if products.len() < 2 {
            return (SelectionMode::Single, None);
        }

        let top = scores[0].final_score;
        let second = scores[1].final_score;
        let gap = top - second;

        if top >= self.single_override_score && gap >= self.single_override_gap {
            return (SelectionMode::Single, None);
        }

        let close_competition = gap < self.top_gap_threshold;
        let disjoint_strengths = top3_have_disjoint_strengths(products, scores);
        let spans_price_tiers = top3_span_price_tiers(products, budget_rupees);
        let differentiated_features = distinct_technical_feature_count(products, scores) >= 3;

        let wants_multi = close_competition || disjoint_strengths || spans_price_tiers || differentiated_features;
        if !wants_multi {
            return (SelectionMode::Single, None);
        }

        let mode = if products.len() >= 3 { SelectionMode::Trio } else { SelectionMode::Duo };
        let table = build_comparison_table(products, mode.slice_len(), user_features);
        (mode, Some(table))
    }
}

fn top3_have_disjoint_strengths(products: &[Product], scores: &[Score]) -> bool {
    let n = products.len().min(3).min(scores.len());
    if n < 2 {
        return false;
    }
    let mut seen: BTreeSet<&String> = BTreeSet::new();
    let mut disjoint = false;
    for score in scores.iter().take(n) {
        let introduces_new = score.matched_features.iter().any(|f| !seen.contains(f));
        if introduces_new && !seen.is_empty() {
            disjoint = true;
        }
        seen.extend(score.matched_features.iter());
    }
    disjoint
}

pub(crate) fn price_tier(price: i64, budget: i64) -> &'static str {
    if budget <= 0 {
        return "mid";
    }
    let ratio = price as f64 / budget as f64;
    if ratio < 0.4 {
        "budget"
    } else if ratio > 0.8 {
        "premium"
    } else {
        "mid"
    }
}

fn top3_span_price_tiers(products: &[Product], budget_rupees: Option<i64>) -> bool {
    let Some(budget) = budget_rupees else {
        return false;
    };
    let tiers: BTreeSet<&'static str> = products
        .iter()
        .take(3)
        .filter_map(|p| p.price_rupees.map(|price| price_tier(price, budget)))
        .collect();
    tiers.len() >= 2
}

fn distinct_technical_feature_count(products: &[Product], scores: &[Score]) -> usize {
    let n = products.len().min(3).min(scores.len());
    let mut all: BTreeSet<&String> = BTreeSet::new();
    for score in scores.iter().take(n) {
        all.extend(score.matched_features.iter());
    }
    all.len()
}

fn build_comparison_table(
    products: &[Product],
    slice_len: usize,
    user_features: &ExtractedFeatures,
) -> ComparisonTable {
    let top = &products[..slice_len.min(products.len())];

    // User-expressed features first, in extraction order, then any
    // remaining technical_details keys observed across the slice.
    let mut ordered_names: Vec<String> = user_features.names().map(|s| s.to_string()).collect();
    for product in top {
        for key in product.technical_details.keys() {
            if !ordered_names.contains(key) {
                ordered_names.push(key.clone());
            }
        }
    }

    let mut rows = Vec::new();
    for name in ordered_names {
        let values: Vec<Option<String>> = top
            .iter()
            .map(|p| p.technical_details.get(&name).cloned())
            .collect();
        let distinct: BTreeSet<&Option<String>> = values.iter().collect();
        if distinct.len() <= 1 {
            continue;
        }
        let user_target = user_features.get(&name).and_then(|v| match v {
            FeatureValue::Number(n) => Some(n.to_string()),
            FeatureValue::Text(t) => Some(t.clone()),
        });
        rows.push(ComparisonRow {
            feature_name: name,
            values,
            user_target,
        });
        if rows.len() >= COMPARISON_ROW_CAP {
            break;
        }
    }

    ComparisonTable { rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn product(asin: &str, price: i64) -> Product {
        Product {
            asin: asin.into(),
            title: "t".into(),
            image_url: None,
            brand: None,
            manufacturer: None,
            price_rupees: Some(price),
            list_price_rupees: None,
            rating_count: 10,
            average_rating: 4.0,
            features_list: vec![],
            technical_details: BTreeMap::new(),
        }
    }

    fn score_with(final_score: f64, matched: &[&str]) -> Score {
        Score {
            technical: final_score,
            value: final_score,
            budget: final_score,
            excellence: 0.0,
            weights: crate::models::score::ScoreWeights::GENERAL,
            final_score,
            matched_features: matched.iter().map(|s| s.to_string()).collect(),
            rationale: String::new(),
        }
    }

    #[test]
    fn single_product_is_always_single() {
        let products = vec![product("A", 1000)];
        let scores = vec![score_with(0.9, &["refresh_rate"])];
        let (mode, table) = MultiCardSelector::new().select(&products, &scores, None, &ExtractedFeatures::empty());
        assert_eq!(mode, SelectionMode::Single);
        assert!(table.is_none());
    }

    #[test]
    fn close_top_scores_trigger_multi_card() {
        let products = vec![product("A", 1000), product("B", 1000), product("C", 1000)];
        let scores = vec![
            score_with(0.80, &["refresh_rate"]),
            score_with(0.75, &["size"]),
            score_with(0.70, &["panel_type"]),
        ];
        let (mode, _) = MultiCardSelector::new().select(&products, &scores, None, &ExtractedFeatures::empty());
        assert_eq!(mode, SelectionMode::Trio);
    }

    #[test]
    fn dominant_top_score_overrides_to_single() {
        let products = vec![product("A", 1000), product("B", 1000)];
        let scores = vec![score_with(0.97, &["refresh_rate"]), score_with(0.60, &["size"])];
        let (mode, _) = MultiCardSelector::new().select(&products, &scores, None, &ExtractedFeatures::empty());
        assert_eq!(mode, SelectionMode::Single);
    }

    #[test]
    fn comparison_table_caps_rows_and_skips_identical_values() {
        let mut a = product("A", 1000);
        a.technical_details.insert("refresh_rate".into(), "144".into());
        a.technical_details.insert("size".into(), "27".into());
        a.technical_details.insert("panel_type".into(), "ips".into());
        let mut b = product("B", 1000);
        b.technical_details.insert("refresh_rate".into(), "165".into());
        b.technical_details.insert("size".into(), "27".into());
        b.technical_details.insert("panel_type".into(), "va".into());
        let products = vec![a, b];
        let scores = vec![score_with(0.80, &["refresh_rate"]), score_with(0.78, &["panel_type"])];
        let (_, table) = MultiCardSelector::new().select(&products, &scores, None, &ExtractedFeatures::empty());
        let table = table.unwrap();
        assert!(table.rows.iter().all(|r| r.feature_name != "size"));
        assert!(table.rows.len() <= COMPARISON_ROW_CAP);
    }
}
