//! Injected persistence interfaces the core consumes (spec §6). The
//! core never prescribes a schema; it only requires these operations.

pub mod in_memory;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::watch::{Alert, PricePoint, Watch};

#[async_trait]
pub trait WatchRepo: Send + Sync {
    async fn list_active(&self, user_id: Option<Uuid>) -> Vec<Watch>;
    async fn get_by_id(&self, id: Uuid) -> Option<Watch>;
    async fn update_last_eval(&self, id: Uuid, ts: chrono::DateTime<chrono::Utc>);
    async fn record_alert(&self, alert: Alert);
    async fn save(&self, watch: Watch);
    async fn recent_alerts(&self, watch_id: Uuid, horizon: chrono::Duration) -> Vec<Alert>;
}

#[async_trait]
pub trait PriceHistoryRepo: Send + Sync {
    async fn get_recent(&self, asin: &str, horizon: chrono::Duration) -> Vec<PricePoint>;
    async fn append(&self, asin: &str, point: PricePoint);
}

/// Cache key = (normalized_keywords, index, min_price, max_price,
/// browse_node, item_count, resource_set_id), per spec §6.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SearchCacheKey {
    pub normalized_keywords: String,
    pub index: String,
    pub min_price_rupees: Option<i64>,
    pub max_price_rupees: Option<i64>,
    pub browse_node: Option<String>,
    pub item_count: usize,
    pub resource_set_id: String,
}

#[async_trait]
pub trait SearchCacheRepo<V: Clone + Send + Sync>: Send + Sync {
    async fn get(&self, key: &SearchCacheKey) -> Option<V>;
    async fn put(&self, key: SearchCacheKey, value: V, ttl: std::time::Duration);
}
