use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::features::ExtractedFeatures;

/// Immutable snapshot of a marketplace listing at fetch time.
///
/// Prices are integer rupees throughout the core (spec §3 invariant 1);
/// the PaapiAdapter is the only place paise ever appear.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub asin: String,
    pub title: String,
    pub image_url: Option<String>,
    pub brand: Option<String>,
    pub manufacturer: Option<String>,
    pub price_rupees: Option<i64>,
    pub list_price_rupees: Option<i64>,
    pub rating_count: u32,
    pub average_rating: f32,
    pub features_list: Vec<String>,
    pub technical_details: BTreeMap<String, String>,
}

impl Product {
    /// `discount_percent`, derived from list price vs. current price.
    /// Returns `None` when either price is missing, per spec §3.
    pub fn discount_percent(&self) -> Option<i32> {
        let list = self.list_price_rupees?;
        let price = self.price_rupees?;
        if list <= 0 || price > list {
            return None;
        }
        Some((((list - price) as f64 / list as f64) * 100.0).round() as i32)
    }

    pub fn in_stock(&self) -> bool {
        self.price_rupees.is_some()
    }
}

/// The analyzed, comparable form of a [`Product`] — same shape as
/// [`ExtractedFeatures`] plus an overall confidence score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductFeatures {
    pub features: ExtractedFeatures,
    pub overall_confidence: f64,
}

impl ProductFeatures {
    pub fn empty() -> Self {
        Self {
            features: ExtractedFeatures::empty(),
            overall_confidence: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: Option<i64>, list: Option<i64>) -> Product {
        Product {
            asin: "A1".into(),
            title: "t".into(),
            image_url: None,
            brand: None,
            manufacturer: None,
            price_rupees: price,
            list_price_rupees: list,
            rating_count: 0,
            average_rating: 0.0,
            features_list: vec![],
            technical_details: BTreeMap::new(),
        }
    }

    #[test]
    fn discount_percent_requires_both_prices() {
        assert_eq!(product(Some(900), None).discount_percent(), None);
        assert_eq!(product(None, Some(1000)).discount_percent(), None);
    }

    #[test]
    fn discount_percent_computes_rounded_value() {
        assert_eq!(product(Some(900), Some(1000)).discount_percent(), Some(10));
    }

    #[test]
    fn null_price_is_out_of_stock() {
        assert!(!product(None, Some(1000)).in_stock());
        assert!(product(Some(500), None).in_stock());
    }
}
