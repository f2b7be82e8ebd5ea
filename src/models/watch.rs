use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Per-watch state machine (spec §4.8).
///
/// `Active` is the only state the [`crate::watch::WatchEvaluator`]
/// processes; the others are skipped. `Paused` is set by the owner
/// outside the core; `Expired` is set by an explicit TTL outside the
/// core as well — the core only ever transitions `Active -> Throttled`
/// and `Throttled -> Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchState {
    Active,
    Throttled,
    Paused,
    Expired,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Watch {
    pub id: Uuid,
    pub user_id: Uuid,
    pub keywords: String,
    pub brand: Option<String>,
    pub max_price_rupees: Option<i64>,
    pub min_discount_percent: Option<i32>,
    pub selected_asin: Option<String>,
    pub state: WatchState,
    pub consecutive_failures: u32,
    pub created_at: DateTime<Utc>,
    pub last_eval_at: Option<DateTime<Utc>>,
}

impl Watch {
    pub fn is_evaluable(&self) -> bool {
        self.state == WatchState::Active
    }
}

/// Closed enum of alert kinds (spec §3, §9).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    PriceDrop,
    Deal,
    Restock,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub watch_id: Uuid,
    pub asin: String,
    pub kind: AlertKind,
    pub previous_price: Option<i64>,
    pub current_price: i64,
    pub discount_percent: Option<i32>,
    pub quality_score: u8,
    pub emitted_at: DateTime<Utc>,
}

/// A single observed price, as recorded by [`crate::repo::PriceHistoryRepo`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub asin: String,
    pub price_rupees: i64,
    pub list_price_rupees: Option<i64>,
    pub in_stock: bool,
    pub observed_at: DateTime<Utc>,
}
