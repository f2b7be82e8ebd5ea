//! Per-category technical-feature weight tables (spec §4.3).
//!
//! Weights need not sum to 1 — they are the denominator of the
//! technical score's weighted-average, computed only over features the
//! user actually expressed.

/// `(feature_name, weight)` pairs for a category. Declared as a flat
/// array rather than a `HashMap` so the table reads like the spec's
/// own illustrative listing.
pub struct WeightTable(pub &'static [(&'static str, f64)]);

pub static GAMING_MONITOR: WeightTable = WeightTable(&[
    ("usage_context", 2.5),
    ("refresh_rate", 2.0),
    ("resolution", 1.8),
    ("size", 1.5),
    ("curvature", 1.2),
    ("panel_type", 1.0),
    ("brand", 0.8),
    ("price", 0.5),
    ("category", 0.3),
]);

/// Documented default weight set for any category without an explicit
/// table (spec §3 invariant 5).
pub static DEFAULT: WeightTable = WeightTable(&[
    ("usage_context", 1.5),
    ("brand", 1.0),
    ("resolution", 1.0),
    ("size", 1.0),
    ("price", 0.5),
    ("category", 0.3),
]);

pub fn table_for(category: &str) -> &'static WeightTable {
    match category {
        "gaming_monitor" => &GAMING_MONITOR,
        _ => &DEFAULT,
    }
}

pub fn category_weight(category: &str, feature_name: &str) -> f64 {
    table_for(category)
        .0
        .iter()
        .find(|(name, _)| *name == feature_name)
        .map(|(_, w)| *w)
        .unwrap_or(1.0)
}
