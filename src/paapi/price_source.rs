use async_trait::async_trait;

/// Narrow fallback used when `GetItemsBatch` is degraded or the breaker
/// is open (spec §4.7). Not part of the core's invariants: a missing or
/// failing `PriceSource` simply means some prices stay unresolved.
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn price_for(&self, asin: &str) -> Option<i64>;
}

/// No-op source used when the host wires no fallback.
pub struct NoPriceSource;

#[async_trait]
impl PriceSource for NoPriceSource {
    async fn price_for(&self, _asin: &str) -> Option<i64> {
        None
    }
}
