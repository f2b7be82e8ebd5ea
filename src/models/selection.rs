use serde::{Deserialize, Serialize};

use super::product::Product;
use super::score::Score;

/// Closed set of presentation sizes a [`crate::selector::MultiCardSelector`]
/// can choose (spec §3, §4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    Single,
    Duo,
    Trio,
}

impl SelectionMode {
    pub fn slice_len(self) -> usize {
        match self {
            SelectionMode::Single => 1,
            SelectionMode::Duo => 2,
            SelectionMode::Trio => 3,
        }
    }
}

/// Which fallback-chain model ultimately produced the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Model {
    FeatureMatch,
    Popularity,
    Random,
}

/// One row of a comparison table: a feature whose values differ across
/// the selected products.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub feature_name: String,
    pub values: Vec<Option<String>>,
    pub user_target: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonTable {
    pub rows: Vec<ComparisonRow>,
}

/// What the pipeline returns on success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    pub mode: SelectionMode,
    pub products: Vec<Product>,
    pub scores: Vec<Score>,
    pub comparison: Option<ComparisonTable>,
    pub model_used: Model,
    pub fallback_reason: Option<String>,
    pub processing_ms: u64,
    pub enhancement_applied: Vec<String>,
    pub enrichment_performed: bool,
    pub price_range_workaround: bool,
}

impl SelectionResult {
    /// Spec §3 invariant 2/3: unique ASINs, parallel products/scores.
    pub fn is_well_formed(&self) -> bool {
        if self.products.len() != self.scores.len() {
            return false;
        }
        let mut seen = std::collections::HashSet::new();
        self.products.iter().all(|p| seen.insert(p.asin.clone()))
    }
}
