use serde::{Deserialize, Serialize};

/// Structured filters a caller may attach to a free-text [`Query`].
///
/// Every field here is a user-stated constraint: the pipeline invariant
/// (spec §3 item 4) is that none of these are ever silently relaxed to
/// manufacture a result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    pub max_price_rupees: Option<i64>,
    pub min_price_rupees: Option<i64>,
    pub min_discount_percent: Option<i32>,
    pub brand: Option<String>,
    pub category_hint: Option<String>,
}

/// A single selection request: free text plus optional structured filters.
/// Immutable for the lifetime of one pipeline invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub filters: Filters,
}

impl Query {
    pub fn new(text: impl Into<String>, filters: Filters) -> Self {
        Self {
            text: text.into(),
            filters,
        }
    }
}
