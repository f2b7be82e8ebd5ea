//! Chooses which ranking model produces the candidate order, with a
//! feature-match → popularity → random fallback chain (spec §4.4).

use rand::distr::weighted::WeightedIndex;
use rand::distr::Distribution;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::errors::{CoreError, NoMatchReason};
use crate::models::product::Product;
use crate::models::score::Score;
use crate::models::selection::Model;

const FEATURE_MATCH_MIN_COUNT: usize = 3;
const POPULARITY_MIN_COUNT: usize = 2;

/// The model's output: a permutation of indices into the caller's
/// `products`/`scores` slices, plus provenance.
pub struct ModelOutcome {
    pub model_used: Model,
    pub fallback_reason: Option<String>,
    pub order: Vec<usize>,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ModelSelector;

impl ModelSelector {
    pub fn new() -> Self {
        Self
    }

    /// `products`/`scores` must already be sorted by the scoring engine's
    /// tie-break chain; feature-match trusts that order verbatim.
    /// `seed` makes the random model reproducible per request.
    pub fn select(
        &self,
        products: &[Product],
        scores: &[Score],
        technical_query: bool,
        seed: u64,
    ) -> Result<ModelOutcome, CoreError> {
        let count = products.len();
        if count == 0 {
            return Err(CoreError::NoMatch(NoMatchReason::PostEnrichmentEmpty));
        }

        if count >= FEATURE_MATCH_MIN_COUNT && technical_query {
            return Ok(ModelOutcome {
                model_used: Model::FeatureMatch,
                fallback_reason: None,
                order: (0..count).collect(),
            });
        }
        let feature_match_reason = if !technical_query {
            "no technical features extracted from query"
        } else {
            "fewer than 3 candidates for feature-match"
        };

        if count >= POPULARITY_MIN_COUNT {
            return Ok(ModelOutcome {
                model_used: Model::Popularity,
                fallback_reason: Some(feature_match_reason.to_string()),
                order: popularity_order(products),
            });
        }

        Ok(ModelOutcome {
            model_used: Model::Random,
            fallback_reason: Some(format!("{feature_match_reason}; fewer than 2 candidates for popularity")),
            order: random_order(products, seed),
        })
    }
}

pub(crate) fn popularity_signal(product: &Product) -> f64 {
    (1.0 + product.rating_count as f64).ln() * 0.6 + (product.average_rating as f64 / 5.0) * 0.4
}

pub(crate) fn popularity_order(products: &[Product]) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..products.len()).collect();
    indices.sort_by(|&a, &b| {
        popularity_signal(&products[b])
            .partial_cmp(&popularity_signal(&products[a]))
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });
    indices
}

fn random_order(products: &[Product], seed: u64) -> Vec<usize> {
    if products.len() == 1 {
        return vec![0];
    }
    let weights: Vec<u32> = products.iter().map(|p| p.rating_count + 1).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    let dist = match WeightedIndex::new(&weights) {
        Ok(d) => d,
        Err(_) => return (0..products.len()).collect(),
    };
    let chosen = dist.sample(&mut rng);
    let mut order = vec![chosen];
    order.extend((0..products.len()).filter(|&i| i != chosen));
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn product(asin: &str, rating_count: u32, average_rating: f32) -> Product {
        Product {
            asin: asin.into(),
            title: "t".into(),
            image_url: None,
            brand: None,
            manufacturer: None,
            price_rupees: Some(1000),
            list_price_rupees: None,
            rating_count,
            average_rating,
            features_list: vec![],
            technical_details: BTreeMap::new(),
        }
    }

    fn score() -> Score {
        Score {
            technical: 0.5,
            value: 0.5,
            budget: 0.5,
            excellence: 0.0,
            weights: crate::models::score::ScoreWeights::GENERAL,
            final_score: 0.5,
            matched_features: Default::default(),
            rationale: String::new(),
        }
    }

    #[test]
    fn three_candidates_with_technical_query_use_feature_match() {
        let products = vec![product("A", 1, 4.0), product("B", 2, 4.0), product("C", 3, 4.0)];
        let scores = vec![score(), score(), score()];
        let outcome = ModelSelector::new().select(&products, &scores, true, 1).unwrap();
        assert_eq!(outcome.model_used, Model::FeatureMatch);
        assert_eq!(outcome.order, vec![0, 1, 2]);
    }

    #[test]
    fn non_technical_query_falls_back_to_popularity() {
        let products = vec![product("A", 1, 3.0), product("B", 500, 4.8), product("C", 2, 3.0)];
        let scores = vec![score(), score(), score()];
        let outcome = ModelSelector::new().select(&products, &scores, false, 1).unwrap();
        assert_eq!(outcome.model_used, Model::Popularity);
        assert_eq!(outcome.order[0], 1);
    }

    #[test]
    fn single_candidate_falls_back_to_random() {
        let products = vec![product("A", 0, 0.0)];
        let scores = vec![score()];
        let outcome = ModelSelector::new().select(&products, &scores, false, 7).unwrap();
        assert_eq!(outcome.model_used, Model::Random);
        assert_eq!(outcome.order, vec![0]);
    }

    #[test]
    fn empty_candidates_yield_no_match() {
        let outcome = ModelSelector::new().select(&[], &[], true, 1);
        assert!(matches!(outcome, Err(CoreError::NoMatch(_))));
    }

    #[test]
    fn random_model_is_seed_reproducible() {
        let products = vec![product("A", 1, 3.0)];
        let a = random_order(&products, 42);
        let b = random_order(&products, 42);
        assert_eq!(a, b);
    }
}
