use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use uuid::Uuid;

use crate::models::watch::{Alert, PricePoint, Watch};

use super::{PriceHistoryRepo, SearchCacheKey, SearchCacheRepo, WatchRepo};

/// Reference `WatchRepo` backed by an in-process map. Real deployments
/// inject a database-backed implementation; this one exists so the
/// pipeline and evaluator are exercisable without one.
#[derive(Clone, Default)]
pub struct InMemoryWatchRepo {
    watches: Arc<DashMap<Uuid, Watch>>,
    alerts: Arc<Mutex<Vec<Alert>>>,
}

impl InMemoryWatchRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().clone()
    }
}

#[async_trait]
impl WatchRepo for InMemoryWatchRepo {
    async fn list_active(&self, user_id: Option<Uuid>) -> Vec<Watch> {
        self.watches
            .iter()
            .filter(|entry| user_id.is_none_or(|uid| entry.user_id == uid))
            .map(|entry| entry.value().clone())
            .collect()
    }

    async fn get_by_id(&self, id: Uuid) -> Option<Watch> {
        self.watches.get(&id).map(|entry| entry.value().clone())
    }

    async fn update_last_eval(&self, id: Uuid, ts: DateTime<Utc>) {
        if let Some(mut entry) = self.watches.get_mut(&id) {
            entry.last_eval_at = Some(ts);
        }
    }

    async fn record_alert(&self, alert: Alert) {
        self.alerts.lock().push(alert);
    }

    async fn save(&self, watch: Watch) {
        self.watches.insert(watch.id, watch);
    }

    async fn recent_alerts(&self, watch_id: Uuid, horizon: ChronoDuration) -> Vec<Alert> {
        let cutoff = Utc::now() - horizon;
        self.alerts
            .lock()
            .iter()
            .filter(|a| a.watch_id == watch_id && a.emitted_at >= cutoff)
            .cloned()
            .collect()
    }
}

#[derive(Clone, Default)]
pub struct InMemoryPriceHistoryRepo {
    points: Arc<DashMap<String, Vec<PricePoint>>>,
}

impl InMemoryPriceHistoryRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PriceHistoryRepo for InMemoryPriceHistoryRepo {
    async fn get_recent(&self, asin: &str, horizon: ChronoDuration) -> Vec<PricePoint> {
        let cutoff = Utc::now() - horizon;
        self.points
            .get(asin)
            .map(|points| points.iter().filter(|p| p.observed_at >= cutoff).cloned().collect())
            .unwrap_or_default()
    }

    async fn append(&self, asin: &str, point: PricePoint) {
        self.points.entry(asin.to_string()).or_default().push(point);
    }
}

struct CacheEntry<V> {
    value: V,
    expires_at: tokio::time::Instant,
}

/// Optional search-result cache keyed exactly as spec §6 describes.
#[derive(Clone)]
pub struct InMemorySearchCacheRepo<V: Clone + Send + Sync + 'static> {
    entries: Arc<DashMap<SearchCacheKey, CacheEntry<V>>>,
}

impl<V: Clone + Send + Sync + 'static> InMemorySearchCacheRepo<V> {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }
}

impl<V: Clone + Send + Sync + 'static> Default for InMemorySearchCacheRepo<V> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<V: Clone + Send + Sync + 'static> SearchCacheRepo<V> for InMemorySearchCacheRepo<V> {
    async fn get(&self, key: &SearchCacheKey) -> Option<V> {
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > tokio::time::Instant::now() {
                return Some(entry.value.clone());
            }
            drop(entry);
            self.entries.remove(key);
        }
        None
    }

    async fn put(&self, key: SearchCacheKey, value: V, ttl: std::time::Duration) {
        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: tokio::time::Instant::now() + ttl,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::watch::WatchState;

    fn watch(user_id: Uuid) -> Watch {
        Watch {
            id: Uuid::new_v4(),
            user_id,
            keywords: "gaming monitor".into(),
            brand: None,
            max_price_rupees: None,
            min_discount_percent: None,
            selected_asin: None,
            state: WatchState::Active,
            consecutive_failures: 0,
            created_at: Utc::now(),
            last_eval_at: None,
        }
    }

    #[tokio::test]
    async fn save_and_list_round_trips() {
        let repo = InMemoryWatchRepo::new();
        let user_id = Uuid::new_v4();
        repo.save(watch(user_id)).await;
        let active = repo.list_active(Some(user_id)).await;
        assert_eq!(active.len(), 1);
    }

    #[tokio::test]
    async fn search_cache_respects_ttl() {
        let cache: InMemorySearchCacheRepo<Vec<String>> = InMemorySearchCacheRepo::new();
        let key = SearchCacheKey {
            normalized_keywords: "gaming monitor".into(),
            index: "Electronics".into(),
            min_price_rupees: None,
            max_price_rupees: None,
            browse_node: None,
            item_count: 10,
            resource_set_id: "ai_search".into(),
        };
        cache.put(key.clone(), vec!["A1".into()], std::time::Duration::from_millis(10)).await;
        assert!(cache.get(&key).await.is_some());
        tokio::time::sleep(std::time::Duration::from_millis(30)).await;
        assert!(cache.get(&key).await.is_none());
    }
}
