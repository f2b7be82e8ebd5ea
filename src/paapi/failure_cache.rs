use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;

/// Why an ASIN lookup previously failed; governs how long the adapter
/// avoids retrying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    RateLimited,
    UpstreamError,
}

#[derive(Debug, Clone)]
struct FailureInfo {
    failed_at: DateTime<Utc>,
    kind: FailureKind,
    ttl_hours: i64,
}

/// Tracks ASINs that recently failed a PA-API lookup so the adapter
/// doesn't keep spending rate-limited calls on them.
#[derive(Clone)]
pub struct AsinFailureCache {
    entries: Arc<DashMap<String, FailureInfo>>,
}

impl AsinFailureCache {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    pub fn is_failed(&self, asin: &str) -> bool {
        if let Some(entry) = self.entries.get(asin) {
            let info = entry.value().clone();
            let expiry = info.failed_at + Duration::hours(info.ttl_hours);
            if Utc::now() < expiry {
                return true;
            }
            drop(entry);
            self.entries.remove(asin);
        }
        false
    }

    /// Why the given ASIN is currently suppressed, if it is.
    pub fn failure_kind(&self, asin: &str) -> Option<FailureKind> {
        self.entries.get(asin).map(|entry| entry.kind)
    }

    pub fn record_failure(&self, asin: &str, kind: FailureKind) {
        let ttl_hours = match kind {
            FailureKind::NotFound => 24,
            FailureKind::RateLimited => 1,
            FailureKind::UpstreamError => 6,
        };
        self.entries.insert(
            asin.to_string(),
            FailureInfo {
                failed_at: Utc::now(),
                kind,
                ttl_hours,
            },
        );
    }

    pub fn clear(&self, asin: &str) {
        self.entries.remove(asin);
    }
}

impl Default for AsinFailureCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_and_reports_failures() {
        let cache = AsinFailureCache::new();
        cache.record_failure("B000123", FailureKind::NotFound);
        assert!(cache.is_failed("B000123"));
    }

    #[test]
    fn clear_removes_entry() {
        let cache = AsinFailureCache::new();
        cache.record_failure("B000123", FailureKind::RateLimited);
        cache.clear("B000123");
        assert!(!cache.is_failed("B000123"));
    }
}
