//! Orchestrates Query → Search → Enrich → Select (spec §4.6). The only
//! module that calls every other module in the core.

pub mod enhance;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};
use tracing::{info, warn};
use uuid::Uuid;

use crate::analyzer::ProductAnalyzer;
use crate::errors::{CoreError, NoMatchReason};
use crate::features::extractor::FeatureExtractor;
use crate::models::features::ExtractedFeatures;
use crate::models::product::{Product, ProductFeatures};
use crate::models::query::Query;
use crate::models::score::Score;
use crate::models::selection::{Model, SelectionResult};
use crate::paapi::{PaapiAdapter, ResourceSet, SearchParams};
use crate::scoring::ScoringEngine;
use crate::selector::{model_selector, multicard, ModelSelector, MultiCardSelector};

const DEFAULT_ITEM_COUNT: usize = 10;
const ENRICHMENT_BATCH_SIZE: usize = 10;
const SEARCH_INDEX: &str = "Electronics";

pub struct PipelineConfig {
    pub analyzer_workers: usize,
    pub deadline: Duration,
    pub enable_enrichment: bool,
    pub multicard_top_gap: f64,
    pub multicard_single_override_score: f64,
    pub multicard_single_override_gap: f64,
    pub scoring_enable_excellence_bonus: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            analyzer_workers: 8,
            deadline: Duration::from_secs(15),
            enable_enrichment: true,
            multicard_top_gap: 0.20,
            multicard_single_override_score: 0.95,
            multicard_single_override_gap: 0.30,
            scoring_enable_excellence_bonus: true,
        }
    }
}

pub struct Pipeline {
    adapter: Arc<dyn PaapiAdapter>,
    extractor: FeatureExtractor,
    analyzer: ProductAnalyzer,
    scoring: ScoringEngine,
    model_selector: ModelSelector,
    multicard: MultiCardSelector,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(adapter: Arc<dyn PaapiAdapter>, config: PipelineConfig) -> Self {
        let multicard = MultiCardSelector::with_thresholds(
            config.multicard_top_gap,
            config.multicard_single_override_score,
            config.multicard_single_override_gap,
        );
        let scoring = ScoringEngine::with_excellence_bonus(config.scoring_enable_excellence_bonus);
        Self {
            adapter,
            extractor: FeatureExtractor::new(),
            analyzer: ProductAnalyzer::new(),
            scoring,
            model_selector: ModelSelector::new(),
            multicard,
            config,
        }
    }

    pub async fn run_selection(&self, query: &Query, user_id: Uuid) -> Result<SelectionResult, CoreError> {
        let started = Instant::now();

        // 1. Extract.
        let features = self.extractor.extract(&query.text, query.filters.category_hint.as_deref());
        let category = features.category.clone().unwrap_or_else(|| "general".to_string());

        let budget = query.filters.max_price_rupees.or_else(|| features.get_number("max_price").map(|v| v as i64));

        // 2. Enhance keywords.
        let base_keywords: Vec<String> = query.text.split_whitespace().map(|s| s.to_string()).collect();
        let additions = enhance::enhanced_keywords(
            &base_keywords,
            budget,
            features.category.as_deref(),
            query.filters.brand.as_deref(),
        );
        let mut all_keywords = base_keywords.clone();
        all_keywords.extend(additions.iter().cloned());

        // 3. Search depth.
        let pages = enhance::search_depth(budget, additions.len(), DEFAULT_ITEM_COUNT);

        // 4. Search.
        let min_price = query.filters.min_price_rupees;
        let max_price = query.filters.max_price_rupees;
        let price_range_workaround = min_price.is_some() && max_price.is_some();

        let search_params = SearchParams {
            keywords: all_keywords,
            index: SEARCH_INDEX.to_string(),
            min_price_rupees: min_price,
            max_price_rupees: max_price,
            browse_node: None,
            item_count: DEFAULT_ITEM_COUNT,
            resource_set: ResourceSet::AiSearch,
        };

        let outcome = self.adapter.search_paginated(&search_params, pages).await?;
        let mut products = outcome.products;
        if products.is_empty() {
            return Err(CoreError::NoMatch(NoMatchReason::NoSearchResults));
        }

        // 5. Enrichment for null prices.
        let mut enrichment_performed = false;
        if self.config.enable_enrichment {
            let missing: Vec<String> = products.iter().filter(|p| p.price_rupees.is_none()).map(|p| p.asin.clone()).collect();
            if !missing.is_empty() {
                enrichment_performed = true;
                let mut resolved = BTreeMap::new();
                for chunk in missing.chunks(ENRICHMENT_BATCH_SIZE) {
                    match self.adapter.get_items_batch(chunk, ResourceSet::AiLookup).await {
                        Ok(batch) => resolved.extend(batch),
                        Err(err) => warn!("price enrichment batch failed: {err}"),
                    }
                }
                // Fill in whatever enrichment resolved; a product that's
                // still priceless survives here and scores with the
                // neutral value=0.5 path (spec §4.3) — it only drops out
                // at an explicit price filter below (spec §4.6 step 5,
                // §8: "survives analysis and scoring but drops out of
                // price-filtered selection without enrichment").
                for p in products.iter_mut().filter(|p| p.price_rupees.is_none()) {
                    if let Some(enriched) = resolved.get(&p.asin) {
                        p.price_rupees = enriched.price_rupees;
                        p.list_price_rupees = enriched.list_price_rupees.or(p.list_price_rupees);
                    }
                }
            }
        }

        // Client-side max_price filter applied after fetch when both
        // bounds were supplied upstream (spec §4.6 step 4).
        if price_range_workaround {
            if let Some(max) = max_price {
                products.retain(|p| p.price_rupees.map(|price| price <= max).unwrap_or(false));
            }
        }

        // 6. Filters: brand -> price -> discount.
        if let Some(brand) = &query.filters.brand {
            let brand_lower = brand.to_lowercase();
            products.retain(|p| p.brand.as_deref().map(|b| b.to_lowercase() == brand_lower).unwrap_or(false));
            if products.is_empty() {
                return Err(CoreError::NoMatch(NoMatchReason::BrandFilter));
            }
        }

        if let Some(max) = query.filters.max_price_rupees {
            products.retain(|p| p.price_rupees.map(|price| price <= max).unwrap_or(false));
            if products.is_empty() {
                return Err(CoreError::NoMatch(NoMatchReason::PriceFilter));
            }
        }

        if let Some(min_discount) = query.filters.min_discount_percent {
            products.retain(|p| p.discount_percent().map(|d| d >= min_discount).unwrap_or(false));
            if products.is_empty() {
                return Err(CoreError::NoMatch(NoMatchReason::DiscountFilter));
            }
        }

        if enrichment_performed && products.is_empty() {
            return Err(CoreError::NoMatch(NoMatchReason::PostEnrichmentEmpty));
        }

        // Steps 7-11 run under the pipeline's overall deadline (spec §5):
        // if they don't finish in time, we fall back to a best-effort
        // popularity ordering rather than failing the request.
        let remaining = self.config.deadline.saturating_sub(started.elapsed());
        let rest = async {
            // 7. Analyze, bounded worker pool.
            let category_for_analysis = category.clone();
            let analyzed: Vec<ProductFeatures> = stream::iter(products.iter().cloned())
                .map(|product| {
                    let analyzer = self.analyzer;
                    let category = category_for_analysis.clone();
                    async move { analyzer.analyze(&product, &category) }
                })
                .buffer_unordered(self.config.analyzer_workers.max(1))
                .collect::<Vec<_>>()
                .await;

            // 8. Score.
            let scores: Vec<Score> = products
                .iter()
                .zip(analyzed.iter())
                .map(|(product, pf)| self.scoring.score(&features, pf, &category, product.price_rupees, budget))
                .collect();

            // 9. Sort with full tie-break chain.
            let mut indices: Vec<usize> = (0..products.len()).collect();
            indices.sort_by(|&a, &b| {
                tie_break(
                    &products[a],
                    &scores[a],
                    &analyzed[a],
                    &products[b],
                    &scores[b],
                    &analyzed[b],
                    &features,
                    budget,
                )
            });
            let sorted_products: Vec<Product> = indices.iter().map(|&i| products[i].clone()).collect();
            let sorted_scores: Vec<Score> = indices.iter().map(|&i| scores[i].clone()).collect();

            // 10. Model selection.
            let outcome =
                self.model_selector
                    .select(&sorted_products, &sorted_scores, features.technical_query, user_id.as_u128() as u64)?;
            let ordered_products: Vec<Product> = outcome.order.iter().map(|&i| sorted_products[i].clone()).collect();
            let ordered_scores: Vec<Score> = outcome.order.iter().map(|&i| sorted_scores[i].clone()).collect();

            // 11. Multi-card selection.
            let (mode, comparison) = self.multicard.select(&ordered_products, &ordered_scores, budget, &features);
            let slice_len = mode.slice_len().min(ordered_products.len());

            Ok::<SelectionResult, CoreError>(SelectionResult {
                mode,
                products: ordered_products[..slice_len].to_vec(),
                scores: ordered_scores[..slice_len].to_vec(),
                comparison,
                model_used: outcome.model_used,
                fallback_reason: outcome.fallback_reason,
                processing_ms: 0,
                enhancement_applied: additions.clone(),
                enrichment_performed,
                price_range_workaround,
            })
        };

        let mut result = match tokio::time::timeout(remaining, rest).await {
            Ok(inner) => inner?,
            Err(_) => {
                warn!(
                    stage = "pipeline_deadline",
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    candidates = products.len(),
                    "deadline exceeded after search; returning best-effort selection"
                );
                degraded_selection(products, additions, enrichment_performed, price_range_workaround)
            }
        };
        result.processing_ms = started.elapsed().as_millis() as u64;

        info!(
            stage = "pipeline_complete",
            elapsed_ms = result.processing_ms,
            candidates = result.products.len(),
            model = ?result.model_used,
            "selection produced"
        );

        Ok(result)
    }
}

/// Built when the pipeline's overall deadline (§5) fires after search but
/// before scoring/selection complete. Orders the already-fetched,
/// already-filtered candidates by popularity signal alone and returns a
/// single card with neutral scores, rather than failing the request.
fn degraded_selection(
    products: Vec<Product>,
    enhancement_applied: Vec<String>,
    enrichment_performed: bool,
    price_range_workaround: bool,
) -> SelectionResult {
    let order = crate::selector::model_selector::popularity_order(&products);
    let top = order.first().copied().unwrap_or(0);
    let product = products.into_iter().nth(top);

    let neutral_score = Score {
        technical: 0.0,
        value: 0.0,
        budget: 0.70,
        excellence: 0.0,
        weights: crate::models::score::ScoreWeights::GENERAL,
        final_score: 0.0,
        matched_features: Default::default(),
        rationale: "pipeline deadline exceeded before scoring completed".to_string(),
    };

    match product {
        Some(product) => SelectionResult {
            mode: crate::models::selection::SelectionMode::Single,
            products: vec![product],
            scores: vec![neutral_score],
            comparison: None,
            model_used: Model::Popularity,
            fallback_reason: Some("pipeline deadline exceeded; returned best-effort selection".to_string()),
            processing_ms: 0,
            enhancement_applied,
            enrichment_performed,
            price_range_workaround,
        },
        None => SelectionResult {
            mode: crate::models::selection::SelectionMode::Single,
            products: vec![],
            scores: vec![],
            comparison: None,
            model_used: Model::Popularity,
            fallback_reason: Some("pipeline deadline exceeded; no candidates available".to_string()),
            processing_ms: 0,
            enhancement_applied,
            enrichment_performed,
            price_range_workaround,
        },
    }
}

/// Sort descending by `final_score`, with the full tie-break chain from
/// spec §4.6 step 9: matched_features count desc -> overall_confidence
/// desc -> popularity signal desc -> price tier preference (mid >
/// premium > budget) -> missing feature count asc -> ASIN lex asc.
#[allow(clippy::too_many_arguments)]
fn tie_break(
    a_product: &Product,
    a_score: &Score,
    a_features: &ProductFeatures,
    b_product: &Product,
    b_score: &Score,
    b_features: &ProductFeatures,
    user_features: &ExtractedFeatures,
    budget_rupees: Option<i64>,
) -> Ordering {
    b_score
        .final_score
        .partial_cmp(&a_score.final_score)
        .unwrap_or(Ordering::Equal)
        .then_with(|| b_score.matched_features.len().cmp(&a_score.matched_features.len()))
        .then_with(|| b_features.overall_confidence.partial_cmp(&a_features.overall_confidence).unwrap_or(Ordering::Equal))
        .then_with(|| {
            model_selector::popularity_signal(b_product)
                .partial_cmp(&model_selector::popularity_signal(a_product))
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| price_tier_rank(a_product.price_rupees, budget_rupees).cmp(&price_tier_rank(b_product.price_rupees, budget_rupees)))
        .then_with(|| missing_feature_count(user_features, a_score).cmp(&missing_feature_count(user_features, b_score)))
        .then_with(|| a_product.asin.cmp(&b_product.asin))
}

fn missing_feature_count(user_features: &ExtractedFeatures, score: &Score) -> usize {
    user_features.names().filter(|name| !score.matched_features.contains(*name)).count()
}

/// mid > premium > budget; missing price or budget ranked last.
fn price_tier_rank(price_rupees: Option<i64>, budget_rupees: Option<i64>) -> u8 {
    match (price_rupees, budget_rupees) {
        (Some(price), Some(budget)) if budget > 0 => match multicard::price_tier(price, budget) {
            "mid" => 0,
            "premium" => 1,
            "budget" => 2,
            _ => 3,
        },
        (Some(_), _) => 0,
        (None, _) => 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CoreError;
    use crate::models::query::Filters;
    use async_trait::async_trait;
    use std::collections::BTreeMap;

    struct EmptyAdapter;

    #[async_trait]
    impl PaapiAdapter for EmptyAdapter {
        async fn search(&self, _params: &SearchParams, _page: u32) -> Result<(Vec<Product>, bool), CoreError> {
            Ok((vec![], false))
        }
        async fn search_paginated(&self, _params: &SearchParams, _max_pages: usize) -> Result<crate::paapi::SearchOutcome, CoreError> {
            Ok(crate::paapi::SearchOutcome { products: vec![], partial: false })
        }
        async fn get_item(&self, _asin: &str, _resource_set: ResourceSet) -> Result<Product, CoreError> {
            Err(CoreError::NoMatch(NoMatchReason::NoSearchResults))
        }
        async fn get_items_batch(&self, _asins: &[String], _resource_set: ResourceSet) -> Result<BTreeMap<String, Product>, CoreError> {
            Ok(BTreeMap::new())
        }
    }

    #[tokio::test]
    async fn empty_search_results_yield_no_match() {
        let pipeline = Pipeline::new(Arc::new(EmptyAdapter), PipelineConfig::default());
        let query = Query::new("32 inch gaming monitor", Filters::default());
        let result = pipeline.run_selection(&query, Uuid::new_v4()).await;
        assert!(matches!(result, Err(CoreError::NoMatch(NoMatchReason::NoSearchResults))));
    }
}
