//! Normalizes marketplace responses into comparable feature records
//! (spec §4.2).

use crate::models::features::{ExtractedFeatures, FeatureValue};
use crate::models::product::{Product, ProductFeatures};
use crate::scoring::weights::category_weight;
use crate::vocab::{self, FeatureRule};

const TECHNICAL_DETAILS_CONFIDENCE: f64 = 0.95;
const FEATURES_LIST_CONFIDENCE: f64 = 0.85;
const TITLE_CONFIDENCE: f64 = 0.60;

fn confidence_adjustment(feature_name: &str) -> f64 {
    match feature_name {
        "brand" => 0.08,
        "refresh_rate" => 0.05,
        "panel_type" => -0.05,
        _ => 0.0,
    }
}

/// Stateless analyzer: consults technical-details, then the features
/// list, then the title, in that precedence order, and never lets a
/// lower-precedence source override a higher one.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProductAnalyzer;

impl ProductAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, product: &Product, category: &str) -> ProductFeatures {
        let Some(voc) = vocab::lookup_category(category) else {
            return self.analyze_brand_only(product);
        };

        let technical_blob = product
            .technical_details
            .iter()
            .map(|(k, v)| format!("{k} {v}"))
            .collect::<Vec<_>>()
            .join(" ");
        let features_blob = product.features_list.join(" ");
        let title_blob = vocab::strip_title_noise(&product.title);

        let sources: [(&str, f64); 3] = [
            (technical_blob.as_str(), TECHNICAL_DETAILS_CONFIDENCE),
            (features_blob.as_str(), FEATURES_LIST_CONFIDENCE),
            (title_blob.as_str(), TITLE_CONFIDENCE),
        ];

        let mut features = ExtractedFeatures::empty();
        for feature in voc.features {
            for (text, base_confidence) in sources {
                if let Some(value) = extract_from_text(text, feature) {
                    let confidence =
                        (base_confidence + confidence_adjustment(feature.feature_name)).clamp(0.0, 1.0);
                    features.insert(feature.feature_name, value, confidence);
                    break; // higher-precedence source wins; stop here.
                }
            }
        }
        features.category = Some(category.to_string());

        self.fill_brand(product, &mut features, &technical_blob, &features_blob, &title_blob);

        if features.is_empty() {
            return ProductFeatures::empty();
        }

        let overall_confidence = self.weighted_confidence(&features, category, product);
        ProductFeatures {
            features,
            overall_confidence,
        }
    }

    fn analyze_brand_only(&self, product: &Product) -> ProductFeatures {
        let mut features = ExtractedFeatures::empty();
        let technical_blob = product
            .technical_details
            .iter()
            .map(|(k, v)| format!("{k} {v}"))
            .collect::<Vec<_>>()
            .join(" ");
        let features_blob = product.features_list.join(" ");
        let title_blob = vocab::strip_title_noise(&product.title);
        self.fill_brand(product, &mut features, &technical_blob, &features_blob, &title_blob);
        if features.is_empty() {
            return ProductFeatures::empty();
        }
        ProductFeatures {
            features,
            overall_confidence: TECHNICAL_DETAILS_CONFIDENCE,
        }
    }

    fn fill_brand(
        &self,
        product: &Product,
        features: &mut ExtractedFeatures,
        technical_blob: &str,
        features_blob: &str,
        title_blob: &str,
    ) {
        if let Some(brand) = &product.brand {
            let confidence = (TECHNICAL_DETAILS_CONFIDENCE + confidence_adjustment("brand")).clamp(0.0, 1.0);
            features.insert("brand", FeatureValue::Text(brand.to_lowercase()), confidence);
            return;
        }
        for (text, base) in [
            (technical_blob, TECHNICAL_DETAILS_CONFIDENCE),
            (features_blob, FEATURES_LIST_CONFIDENCE),
            (title_blob, TITLE_CONFIDENCE),
        ] {
            let lower = text.to_lowercase();
            if let Some(brand) = vocab::KNOWN_BRANDS.iter().find(|b| lower.contains(*b)) {
                let confidence = (base + confidence_adjustment("brand")).clamp(0.0, 1.0);
                features.insert("brand", FeatureValue::Text((*brand).to_string()), confidence);
                return;
            }
        }
    }

    fn weighted_confidence(&self, features: &ExtractedFeatures, category: &str, product: &Product) -> f64 {
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;
        for (name, _, confidence) in features.iter() {
            let weight = category_weight(category, name);
            weighted_sum += weight * confidence;
            weight_total += weight;
        }
        let base = if weight_total > 0.0 {
            weighted_sum / weight_total
        } else {
            0.0
        };

        let mut bonus = 0.0;
        if product.technical_details.len() >= 3 {
            bonus += 0.05;
        }
        if product.features_list.len() >= 5 {
            bonus += 0.05;
        }
        (base + bonus).clamp(0.0, 1.0)
    }
}

fn extract_from_text(text: &str, feature: &crate::vocab::FeaturePattern) -> Option<FeatureValue> {
    if text.trim().is_empty() {
        return None;
    }
    for rule in feature.rules {
        match rule {
            FeatureRule::Numeric { regex, unit } => {
                let re = regex_cache::get(*regex);
                if let Some(caps) = re.captures(text) {
                    if let Some(raw) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) {
                        let normalized = crate::features::normalize::normalize_numeric(raw, *unit);
                        let in_range = feature
                            .valid_range
                            .map(|(lo, hi)| normalized >= lo && normalized <= hi)
                            .unwrap_or(true);
                        if in_range {
                            return Some(FeatureValue::Number(normalized));
                        }
                    }
                }
            }
            FeatureRule::Categorical { regex, canonical } => {
                let re = regex_cache::get(*regex);
                if re.is_match(text) {
                    return Some(FeatureValue::Text((*canonical).to_string()));
                }
            }
        }
    }
    None
}

mod regex_cache {
    use dashmap::DashMap;
    use regex::Regex;
    use std::sync::{Arc, OnceLock};

    fn cache() -> &'static DashMap<&'static str, Arc<Regex>> {
        static CACHE: OnceLock<DashMap<&'static str, Arc<Regex>>> = OnceLock::new();
        CACHE.get_or_init(DashMap::new)
    }

    pub fn get(pattern: &'static str) -> Arc<Regex> {
        if let Some(re) = cache().get(pattern) {
            return re.clone();
        }
        let compiled = Arc::new(Regex::new(pattern).expect("vocabulary regex must be valid"));
        cache().insert(pattern, compiled.clone());
        compiled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn product(technical: &[(&str, &str)], features_list: &[&str], title: &str) -> Product {
        Product {
            asin: "A1".into(),
            title: title.into(),
            image_url: None,
            brand: None,
            manufacturer: None,
            price_rupees: Some(30000),
            list_price_rupees: None,
            rating_count: 10,
            average_rating: 4.2,
            features_list: features_list.iter().map(|s| s.to_string()).collect(),
            technical_details: technical.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
        }
    }

    #[test]
    fn technical_details_take_precedence_over_title() {
        let p = product(
            &[("Refresh Rate", "165 Hz")],
            &[],
            "Monitor 144Hz gaming display",
        );
        let pf = ProductAnalyzer::new().analyze(&p, "gaming_monitor");
        assert_eq!(pf.features.get_number("refresh_rate"), Some(165.0));
    }

    #[test]
    fn falls_back_to_title_when_other_sources_empty() {
        let p = product(&[], &[], "27 inch curved gaming monitor 144Hz IPS");
        let pf = ProductAnalyzer::new().analyze(&p, "gaming_monitor");
        assert_eq!(pf.features.get_number("refresh_rate"), Some(144.0));
        assert_eq!(pf.features.get_text("panel_type"), Some("ips"));
    }

    #[test]
    fn empty_sources_yield_empty_product_features() {
        let p = product(&[], &[], "Monitor");
        let pf = ProductAnalyzer::new().analyze(&p, "gaming_monitor");
        assert_eq!(pf.overall_confidence, 0.0);
        assert!(pf.is_empty());
    }

    #[test]
    fn structure_bonus_raises_confidence() {
        let sparse = product(&[], &[], "27 inch 144Hz monitor");
        let rich = product(
            &[("Refresh Rate", "144Hz"), ("Size", "27 inch"), ("Panel", "IPS")],
            &["144Hz", "27 inch", "IPS panel", "curved", "1440p"],
            "27 inch 144Hz curved IPS 1440p monitor",
        );
        let sparse_pf = ProductAnalyzer::new().analyze(&sparse, "gaming_monitor");
        let rich_pf = ProductAnalyzer::new().analyze(&rich, "gaming_monitor");
        assert!(rich_pf.overall_confidence > sparse_pf.overall_confidence);
    }
}
