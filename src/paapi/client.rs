use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rand::Rng as _;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::errors::CoreError;
use crate::models::product::Product;

use super::breaker::CircuitBreaker;
use super::failure_cache::{AsinFailureCache, FailureKind};
use super::price_source::PriceSource;
use super::rate_limiter::{pagination_delay, PaapiRateLimiter};
use super::resource_set::ResourceSet;
use super::{PaapiAdapter, SearchOutcome, SearchParams};

const MAX_ITEMS_PER_PAGE: usize = 10;
const MAX_UPSTREAM_PAGE: usize = 10;
const MAX_BATCH_SIZE: usize = 10;
const BACKOFF_BASE: Duration = Duration::from_secs(2);
const BACKOFF_CAP: Duration = Duration::from_secs(30);

pub struct PaapiCredentials {
    pub access_key: String,
    pub secret_key: String,
    pub partner_tag: String,
    pub marketplace: String,
    pub region: String,
}

pub struct PaapiConfig {
    pub base_url: String,
    pub credentials: PaapiCredentials,
    pub rate_per_sec: u32,
    pub search_timeout: Duration,
    pub batch_timeout: Duration,
}

/// Concrete adapter over the upstream product-advertising API. Hides
/// pagination quirks, paise-to-rupee conversion, image-size reduction,
/// rate limiting, and backoff behind the [`PaapiAdapter`] trait.
pub struct PaapiClient {
    http: reqwest::Client,
    base_url: String,
    credentials: PaapiCredentials,
    limiter: PaapiRateLimiter,
    breaker: CircuitBreaker,
    failure_cache: AsinFailureCache,
    price_source: Arc<dyn PriceSource>,
    search_timeout: Duration,
    batch_timeout: Duration,
}

impl PaapiClient {
    pub fn new(config: PaapiConfig, price_source: Arc<dyn PriceSource>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url,
            credentials: config.credentials,
            limiter: PaapiRateLimiter::new(config.rate_per_sec),
            breaker: CircuitBreaker::new(),
            failure_cache: AsinFailureCache::new(),
            price_source,
            search_timeout: config.search_timeout,
            batch_timeout: config.batch_timeout,
        }
    }

    async fn execute_with_backoff<T, F, Fut>(&self, deadline: Duration, issue: F) -> Result<T, CoreError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, UpstreamFailure>>,
    {
        if self.breaker.is_open() {
            return Err(CoreError::Unavailable("paapi circuit breaker open".into()));
        }

        let started = tokio::time::Instant::now();
        let mut attempt: u32 = 0;
        loop {
            let _permit = self.limiter.acquire().await;
            let call = issue();
            let outcome = tokio::time::timeout(deadline, call).await;

            match outcome {
                Err(_) => {
                    self.breaker.record_failure();
                    return Err(CoreError::Transient("paapi call exceeded deadline".into()));
                }
                Ok(Ok(value)) => {
                    self.breaker.record_success();
                    return Ok(value);
                }
                Ok(Err(UpstreamFailure::FailFast(msg))) => {
                    self.breaker.record_failure();
                    return Err(CoreError::InvalidInput(msg));
                }
                Ok(Err(UpstreamFailure::Retryable(msg))) => {
                    self.breaker.record_failure();
                    if started.elapsed() >= deadline {
                        return Err(CoreError::Transient(msg));
                    }
                    let delay = backoff_delay(attempt);
                    warn!(attempt, delay_ms = delay.as_millis() as u64, "paapi retry after transient failure: {msg}");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

enum UpstreamFailure {
    Retryable(String),
    FailFast(String),
}

fn backoff_delay(attempt: u32) -> Duration {
    let exp = BACKOFF_BASE.as_millis() as u64 * 2u64.pow(attempt.min(4));
    let capped = exp.min(BACKOFF_CAP.as_millis() as u64);
    let jittered = rand::rng().random_range(0..=capped);
    Duration::from_millis(jittered)
}

fn classify_status(status: StatusCode) -> Option<UpstreamFailure> {
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Some(UpstreamFailure::Retryable(format!("upstream status {status}")))
    } else if status.is_client_error() {
        Some(UpstreamFailure::FailFast(format!("upstream status {status}")))
    } else {
        None
    }
}

#[derive(Debug, Deserialize)]
struct RawSearchResponse {
    #[serde(default)]
    items: Vec<RawItem>,
    #[serde(default)]
    total_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct RawItem {
    asin: String,
    title: String,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    manufacturer: Option<String>,
    #[serde(default)]
    price_paise: Option<i64>,
    #[serde(default)]
    list_price_paise: Option<i64>,
    #[serde(default)]
    rating_count: u32,
    #[serde(default)]
    average_rating: f32,
    #[serde(default)]
    features: Vec<String>,
    #[serde(default)]
    technical_details: BTreeMap<String, String>,
    /// Ordered largest-first by upstream convention.
    #[serde(default)]
    image_urls: Vec<String>,
}

fn paise_to_rupees(paise: i64) -> i64 {
    paise / 100
}

fn raw_item_to_product(raw: RawItem) -> Product {
    Product {
        asin: raw.asin,
        title: raw.title,
        image_url: raw.image_urls.into_iter().next(),
        brand: raw.brand,
        manufacturer: raw.manufacturer,
        price_rupees: raw.price_paise.map(paise_to_rupees),
        list_price_rupees: raw.list_price_paise.map(paise_to_rupees),
        rating_count: raw.rating_count,
        average_rating: raw.average_rating,
        features_list: raw.features,
        technical_details: raw.technical_details,
    }
}

#[async_trait]
impl PaapiAdapter for PaapiClient {
    async fn search(&self, params: &SearchParams, page: u32) -> Result<(Vec<Product>, bool), CoreError> {
        let url = format!("{}/search", self.base_url);
        let body = build_search_request_body(&self.credentials, params, page);
        let timeout = self.search_timeout;

        let response = self
            .execute_with_backoff(timeout, || {
                let http = self.http.clone();
                let url = url.clone();
                let body = body.clone();
                async move {
                    let resp = http
                        .post(&url)
                        .json(&body)
                        .send()
                        .await
                        .map_err(|e| UpstreamFailure::Retryable(e.to_string()))?;
                    if let Some(failure) = classify_status(resp.status()) {
                        return Err(failure);
                    }
                    resp.json::<RawSearchResponse>()
                        .await
                        .map_err(|e| UpstreamFailure::FailFast(e.to_string()))
                }
            })
            .await?;

        let more_pages = response.total_pages.map(|t| page < t).unwrap_or(false);
        Ok((response.items.into_iter().map(raw_item_to_product).collect(), more_pages))
    }

    async fn search_paginated(&self, params: &SearchParams, max_pages: usize) -> Result<SearchOutcome, CoreError> {
        let max_pages = max_pages.min(MAX_UPSTREAM_PAGE);
        let mut seen_asins = std::collections::BTreeSet::new();
        let mut products = Vec::new();
        let mut partial = false;

        for page in 1..=max_pages as u32 {
            let page_result = self.search(params, page).await;
            match page_result {
                Ok((items, more)) => {
                    for item in items {
                        if seen_asins.insert(item.asin.clone()) {
                            products.push(item);
                        }
                    }
                    if !more {
                        break;
                    }
                }
                Err(err) if page > 1 => {
                    warn!(page, "paapi pagination stopped early: {err}");
                    partial = true;
                    break;
                }
                Err(err) => return Err(err),
            }

            if (page as usize) < max_pages {
                tokio::time::sleep(pagination_delay(max_pages)).await;
            }
        }

        info!(pages_fetched = products.len(), partial, "search_paginated complete");
        Ok(SearchOutcome { products, partial })
    }

    async fn get_item(&self, asin: &str, resource_set: ResourceSet) -> Result<Product, CoreError> {
        if self.failure_cache.is_failed(asin) {
            return Err(CoreError::NoMatch(crate::errors::NoMatchReason::NoSearchResults));
        }

        let mut batch = self.get_items_batch(&[asin.to_string()], resource_set).await?;
        batch
            .remove(asin)
            .ok_or_else(|| CoreError::NoMatch(crate::errors::NoMatchReason::NoSearchResults))
    }

    async fn get_items_batch(
        &self,
        asins: &[String],
        resource_set: ResourceSet,
    ) -> Result<BTreeMap<String, Product>, CoreError> {
        let mut result = BTreeMap::new();
        let live: Vec<String> = asins.iter().filter(|asin| !self.failure_cache.is_failed(asin)).cloned().collect();
        for skipped in asins.iter().filter(|asin| !live.contains(asin)) {
            debug!(asin = %skipped, kind = ?self.failure_cache.failure_kind(skipped), "skipping known-bad ASIN for batch enrichment");
        }

        for chunk in live.chunks(MAX_BATCH_SIZE) {
            let url = format!("{}/items", self.base_url);
            let body = build_batch_request_body(&self.credentials, chunk, resource_set);
            let timeout = self.batch_timeout;

            let response = self
                .execute_with_backoff(timeout, || {
                    let http = self.http.clone();
                    let url = url.clone();
                    let body = body.clone();
                    async move {
                        let resp = http
                            .post(&url)
                            .json(&body)
                            .send()
                            .await
                            .map_err(|e| UpstreamFailure::Retryable(e.to_string()))?;
                        if let Some(failure) = classify_status(resp.status()) {
                            return Err(failure);
                        }
                        resp.json::<RawSearchResponse>()
                            .await
                            .map_err(|e| UpstreamFailure::FailFast(e.to_string()))
                    }
                })
                .await;

            match response {
                Ok(raw) => {
                    let mut returned: std::collections::BTreeSet<String> = std::collections::BTreeSet::new();
                    for item in raw.items {
                        let asin = item.asin.clone();
                        returned.insert(asin.clone());
                        self.failure_cache.clear(&asin);
                        result.insert(asin, raw_item_to_product(item));
                    }
                    for asin in chunk.iter().filter(|asin| !returned.contains(*asin)) {
                        self.failure_cache.record_failure(asin, FailureKind::NotFound);
                    }
                }
                Err(err) => {
                    warn!("batch lookup degraded, consulting fallback price source: {err}");
                    let kind = match err {
                        CoreError::Transient(_) | CoreError::Unavailable(_) => FailureKind::RateLimited,
                        _ => FailureKind::UpstreamError,
                    };
                    for asin in chunk {
                        match self.price_source.price_for(asin).await {
                            Some(price) => {
                                self.failure_cache.clear(asin);
                                result.insert(
                                    asin.clone(),
                                    Product {
                                        asin: asin.clone(),
                                        title: String::new(),
                                        image_url: None,
                                        brand: None,
                                        manufacturer: None,
                                        price_rupees: Some(price),
                                        list_price_rupees: None,
                                        rating_count: 0,
                                        average_rating: 0.0,
                                        features_list: Vec::new(),
                                        technical_details: BTreeMap::new(),
                                    },
                                );
                            }
                            None => self.failure_cache.record_failure(asin, kind),
                        }
                    }
                }
            }
        }
        Ok(result)
    }
}

fn build_search_request_body(creds: &PaapiCredentials, params: &SearchParams, page: u32) -> serde_json::Value {
    let mut body = serde_json::json!({
        "Keywords": params.keywords.join(" "),
        "SearchIndex": params.index,
        "ItemCount": params.item_count.min(MAX_ITEMS_PER_PAGE),
        "ItemPage": page,
        "Resources": params.resource_set.upstream_resources(),
        "PartnerTag": creds.partner_tag,
        "Marketplace": creds.marketplace,
    });
    if let Some(node) = &params.browse_node {
        body["BrowseNodeId"] = serde_json::json!(node);
    }
    // Upstream silently ignores both MinPrice and MaxPrice together;
    // only MinPrice is ever sent (spec §4.7/§6).
    if let Some(min) = params.min_price_rupees {
        body["MinPrice"] = serde_json::json!(min * 100);
    }
    body
}

fn build_batch_request_body(
    creds: &PaapiCredentials,
    asins: &[String],
    resource_set: ResourceSet,
) -> serde_json::Value {
    serde_json::json!({
        "ItemIds": asins,
        "Resources": resource_set.upstream_resources(),
        "PartnerTag": creds.partner_tag,
        "Marketplace": creds.marketplace,
    })
}

impl std::fmt::Display for UpstreamFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamFailure::Retryable(m) | UpstreamFailure::FailFast(m) => f.write_str(m),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paise_conversion_truncates_to_rupees() {
        assert_eq!(paise_to_rupees(299900), 2999);
    }

    #[test]
    fn backoff_never_exceeds_cap() {
        for attempt in 0..10 {
            assert!(backoff_delay(attempt) <= BACKOFF_CAP);
        }
    }

    #[test]
    fn min_price_sent_alone_when_both_bounds_present() {
        let creds = PaapiCredentials {
            access_key: "k".into(),
            secret_key: "s".into(),
            partner_tag: "tag".into(),
            marketplace: "www.amazon.in".into(),
            region: "eu-west-1".into(),
        };
        let params = SearchParams {
            keywords: vec!["monitor".into()],
            index: "Electronics".into(),
            min_price_rupees: Some(10000),
            max_price_rupees: Some(50000),
            browse_node: None,
            item_count: 10,
            resource_set: ResourceSet::AiSearch,
        };
        let body = build_search_request_body(&creds, &params, 1);
        assert!(body.get("MinPrice").is_some());
        assert!(body.get("MaxPrice").is_none());
    }
}
