use std::sync::Arc;

use chrono::{Duration as ChronoDuration, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::product::Product;
use crate::models::watch::{Alert, AlertKind, PricePoint, Watch, WatchState};
use crate::paapi::{PaapiAdapter, ResourceSet};
use crate::repo::{PriceHistoryRepo, WatchRepo};

const DEAL_DEDUP_WINDOW: ChronoDuration = ChronoDuration::hours(24);
const PRICE_HISTORY_HORIZON: ChronoDuration = ChronoDuration::days(30);

pub struct WatchEvaluatorConfig {
    pub price_drop_threshold: f64,
    pub fail_threshold: u32,
}

impl Default for WatchEvaluatorConfig {
    fn default() -> Self {
        Self {
            price_drop_threshold: 0.95,
            fail_threshold: 3,
        }
    }
}

/// Periodic reevaluation of a single live watch (spec §4.8). The
/// scheduler decides *when*; this decides *what happens* for one watch.
pub struct WatchEvaluator {
    adapter: Arc<dyn PaapiAdapter>,
    watch_repo: Arc<dyn WatchRepo>,
    price_history: Arc<dyn PriceHistoryRepo>,
    config: WatchEvaluatorConfig,
}

impl WatchEvaluator {
    pub fn new(
        adapter: Arc<dyn PaapiAdapter>,
        watch_repo: Arc<dyn WatchRepo>,
        price_history: Arc<dyn PriceHistoryRepo>,
        config: WatchEvaluatorConfig,
    ) -> Self {
        Self {
            adapter,
            watch_repo,
            price_history,
            config,
        }
    }

    pub async fn evaluate(&self, watch_id: Uuid) -> Result<(bool, Option<Alert>), CoreError> {
        let mut watch = self
            .watch_repo
            .get_by_id(watch_id)
            .await
            .ok_or_else(|| CoreError::InvalidInput(format!("unknown watch {watch_id}")))?;

        if !watch.is_evaluable() {
            return Ok((false, None));
        }

        let Some(asin) = watch.selected_asin.clone() else {
            return Err(CoreError::InvalidInput(format!("watch {watch_id} has no selected asin")));
        };

        let product = match self.adapter.get_item(&asin, ResourceSet::AiLookup).await {
            Ok(p) => p,
            Err(err) => {
                warn!(%watch_id, "watch evaluation upstream failure: {err}");
                self.record_failure(&mut watch).await;
                return Ok((false, None));
            }
        };

        self.record_success(&mut watch).await;

        let history = self.price_history.get_recent(&asin, PRICE_HISTORY_HORIZON).await;
        let previous_price = history.last().map(|p| p.price_rupees);
        let previously_in_stock = history.last().map(|p| p.in_stock);

        let Some(current_price) = product.price_rupees else {
            self.watch_repo.update_last_eval(watch_id, Utc::now()).await;
            return Ok((false, None));
        };

        self.price_history
            .append(
                &asin,
                PricePoint {
                    asin: asin.clone(),
                    price_rupees: current_price,
                    list_price_rupees: product.list_price_rupees,
                    in_stock: product.in_stock(),
                    observed_at: Utc::now(),
                },
            )
            .await;

        let discount_percent = product.discount_percent();
        let alert_kind = self
            .decide_alert(
                watch_id,
                &watch,
                previous_price,
                current_price,
                discount_percent,
                previously_in_stock,
                product.in_stock(),
            )
            .await;

        let price_changed = previous_price != Some(current_price);
        self.watch_repo.update_last_eval(watch_id, Utc::now()).await;

        let alert = match alert_kind {
            Some(kind) => {
                let alert = Alert {
                    watch_id,
                    asin: asin.clone(),
                    kind,
                    previous_price,
                    current_price,
                    discount_percent,
                    quality_score: quality_score(&history, &product, current_price, discount_percent),
                    emitted_at: Utc::now(),
                };
                self.watch_repo.record_alert(alert.clone()).await;
                info!(%watch_id, ?kind, "watch alert emitted");
                Some(alert)
            }
            None => None,
        };

        Ok((price_changed, alert))
    }

    async fn decide_alert(
        &self,
        watch_id: Uuid,
        watch: &Watch,
        previous_price: Option<i64>,
        current_price: i64,
        discount_percent: Option<i32>,
        previously_in_stock: Option<bool>,
        now_in_stock: bool,
    ) -> Option<AlertKind> {
        if let Some(previous) = previous_price {
            if (current_price as f64) < previous as f64 * self.config.price_drop_threshold {
                return Some(AlertKind::PriceDrop);
            }
        }

        if let (Some(min_discount), Some(discount)) = (watch.min_discount_percent, discount_percent) {
            if discount >= min_discount {
                let recent = self.watch_repo.recent_alerts(watch_id, DEAL_DEDUP_WINDOW).await;
                let already_alerted = recent
                    .iter()
                    .any(|a| a.kind == AlertKind::Deal && a.discount_percent.unwrap_or(0) >= discount);
                if !already_alerted {
                    return Some(AlertKind::Deal);
                }
            }
        }

        if previously_in_stock == Some(false) && now_in_stock {
            return Some(AlertKind::Restock);
        }

        None
    }

    async fn record_failure(&self, watch: &mut Watch) {
        watch.consecutive_failures += 1;
        if watch.consecutive_failures >= self.config.fail_threshold {
            watch.state = WatchState::Throttled;
        }
        self.watch_repo.save(watch.clone()).await;
    }

    async fn record_success(&self, watch: &mut Watch) {
        watch.consecutive_failures = 0;
        if watch.state == WatchState::Throttled {
            watch.state = WatchState::Active;
        }
        self.watch_repo.save(watch.clone()).await;
    }
}

/// 40% price percentile within observed history, 30% discount
/// magnitude, 20% rating, 10% stock urgency (spec §4.8).
fn quality_score(
    history: &[PricePoint],
    product: &Product,
    current_price: i64,
    discount_percent: Option<i32>,
) -> u8 {
    let prices: Vec<i64> = history.iter().map(|p| p.price_rupees).chain(std::iter::once(current_price)).collect();
    let at_or_above = prices.iter().filter(|&&p| p >= current_price).count();
    let price_percentile = (at_or_above as f64 / prices.len() as f64) * 100.0;

    let discount_magnitude = discount_percent.unwrap_or(0).clamp(0, 100) as f64;
    let rating_component = (product.average_rating as f64 / 5.0 * 100.0).clamp(0.0, 100.0);
    let stock_urgency = if discount_percent.unwrap_or(0) >= 20 { 100.0 } else { 50.0 };

    let score = 0.40 * price_percentile + 0.30 * discount_magnitude + 0.20 * rating_component + 0.10 * stock_urgency;
    score.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn product(price: Option<i64>, list_price: Option<i64>, rating: f32) -> Product {
        Product {
            asin: "A1".into(),
            title: "t".into(),
            image_url: None,
            brand: None,
            manufacturer: None,
            price_rupees: price,
            list_price_rupees: list_price,
            rating_count: 50,
            average_rating: rating,
            features_list: vec![],
            technical_details: BTreeMap::new(),
        }
    }

    #[test]
    fn quality_score_is_within_bounds() {
        let history = vec![];
        let score = quality_score(&history, &product(Some(29999), Some(31999), 4.5), 29999, Some(6));
        assert!(score <= 100);
    }

    #[test]
    fn lower_price_than_history_raises_percentile() {
        let history = vec![PricePoint {
            asin: "A1".into(),
            price_rupees: 35000,
            list_price_rupees: None,
            in_stock: true,
            observed_at: Utc::now(),
        }];
        let low_score = quality_score(&history, &product(Some(29999), None, 4.0), 29999, None);
        let high_score = quality_score(&history, &product(Some(40000), None, 4.0), 40000, None);
        assert!(low_score > high_score);
    }
}
