/// End-to-end exercises of the watch evaluator against fake upstream
/// and repo implementations, covering alert detection and the
/// active/throttled state machine.
use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use pricewatch_core::errors::CoreError;
use pricewatch_core::models::product::Product;
use pricewatch_core::models::watch::{AlertKind, Watch, WatchState};
use pricewatch_core::paapi::{PaapiAdapter, ResourceSet, SearchOutcome, SearchParams};
use pricewatch_core::repo::in_memory::{InMemoryPriceHistoryRepo, InMemoryWatchRepo};
use pricewatch_core::repo::{PriceHistoryRepo, WatchRepo};
use pricewatch_core::watch::{WatchEvaluator, WatchEvaluatorConfig};
use uuid::Uuid;

struct FixedPriceAdapter {
    product: std::sync::Mutex<Product>,
    fail: std::sync::atomic::AtomicBool,
}

#[async_trait]
impl PaapiAdapter for FixedPriceAdapter {
    async fn search(&self, _params: &SearchParams, _page: u32) -> Result<(Vec<Product>, bool), CoreError> {
        Ok((vec![], false))
    }

    async fn search_paginated(&self, _params: &SearchParams, _max_pages: usize) -> Result<SearchOutcome, CoreError> {
        Ok(SearchOutcome { products: vec![], partial: false })
    }

    async fn get_item(&self, _asin: &str, _resource_set: ResourceSet) -> Result<Product, CoreError> {
        if self.fail.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(CoreError::Transient("upstream down".into()));
        }
        Ok(self.product.lock().unwrap().clone())
    }

    async fn get_items_batch(&self, _asins: &[String], _resource_set: ResourceSet) -> Result<BTreeMap<String, Product>, CoreError> {
        Ok(BTreeMap::new())
    }
}

fn product(price: Option<i64>, list_price: Option<i64>, rating: f32) -> Product {
    Product {
        asin: "A1".to_string(),
        title: "27 inch gaming monitor".to_string(),
        image_url: None,
        brand: Some("Dell".to_string()),
        manufacturer: Some("Dell".to_string()),
        price_rupees: price,
        list_price_rupees: list_price,
        rating_count: 500,
        average_rating: rating,
        features_list: vec![],
        technical_details: BTreeMap::new(),
    }
}

fn watch(user_id: Uuid, max_price: Option<i64>, min_discount: Option<i32>) -> Watch {
    Watch {
        id: Uuid::new_v4(),
        user_id,
        keywords: "gaming monitor".to_string(),
        brand: None,
        max_price_rupees: max_price,
        min_discount_percent: min_discount,
        selected_asin: Some("A1".to_string()),
        state: WatchState::Active,
        consecutive_failures: 0,
        created_at: Utc::now(),
        last_eval_at: None,
    }
}

#[tokio::test]
async fn price_drop_below_threshold_emits_alert() {
    let watch_repo = Arc::new(InMemoryWatchRepo::new());
    let price_history = Arc::new(InMemoryPriceHistoryRepo::new());
    let watch = watch(Uuid::new_v4(), None, None);
    watch_repo.save(watch.clone()).await;
    price_history
        .append(
            "A1",
            pricewatch_core::models::watch::PricePoint {
                asin: "A1".to_string(),
                price_rupees: 35000,
                list_price_rupees: None,
                in_stock: true,
                observed_at: Utc::now(),
            },
        )
        .await;

    let adapter = Arc::new(FixedPriceAdapter {
        product: std::sync::Mutex::new(product(Some(30000), None, 4.4)),
        fail: std::sync::atomic::AtomicBool::new(false),
    });
    let evaluator = WatchEvaluator::new(adapter, watch_repo, price_history, WatchEvaluatorConfig::default());

    let (changed, alert) = evaluator.evaluate(watch.id).await.unwrap();
    assert!(changed);
    let alert = alert.expect("a price drop should emit an alert");
    assert_eq!(alert.kind, AlertKind::PriceDrop);
}

#[tokio::test]
async fn deal_alert_is_not_repeated_within_dedup_window() {
    let watch_repo = Arc::new(InMemoryWatchRepo::new());
    let price_history = Arc::new(InMemoryPriceHistoryRepo::new());
    let watch = watch(Uuid::new_v4(), None, Some(10));
    watch_repo.save(watch.clone()).await;

    let adapter = Arc::new(FixedPriceAdapter {
        product: std::sync::Mutex::new(product(Some(27000), Some(30000), 4.4)),
        fail: std::sync::atomic::AtomicBool::new(false),
    });
    let evaluator = WatchEvaluator::new(adapter, watch_repo.clone(), price_history, WatchEvaluatorConfig::default());

    let (_, first_alert) = evaluator.evaluate(watch.id).await.unwrap();
    assert_eq!(first_alert.map(|a| a.kind), Some(AlertKind::Deal));

    let (_, second_alert) = evaluator.evaluate(watch.id).await.unwrap();
    assert!(second_alert.is_none(), "deal should not fire again within the dedup window");
}

#[tokio::test]
async fn repeated_upstream_failures_throttle_the_watch() {
    let watch_repo = Arc::new(InMemoryWatchRepo::new());
    let price_history = Arc::new(InMemoryPriceHistoryRepo::new());
    let watch = watch(Uuid::new_v4(), None, None);
    watch_repo.save(watch.clone()).await;

    let adapter = Arc::new(FixedPriceAdapter {
        product: std::sync::Mutex::new(product(Some(30000), None, 4.0)),
        fail: std::sync::atomic::AtomicBool::new(true),
    });
    let config = WatchEvaluatorConfig { fail_threshold: 3, ..WatchEvaluatorConfig::default() };
    let evaluator = WatchEvaluator::new(adapter, watch_repo.clone(), price_history, config);

    for _ in 0..3 {
        evaluator.evaluate(watch.id).await.unwrap();
    }

    let stored = watch_repo.get_by_id(watch.id).await.unwrap();
    assert_eq!(stored.state, WatchState::Throttled);
    assert!(!stored.is_evaluable());
}
