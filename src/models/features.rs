use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single feature's value. Numeric features (refresh_rate, size, price)
/// carry an `f64`; categorical/string/contextual features (resolution,
/// panel_type, curvature, brand, usage_context) carry their canonicalized
/// text form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum FeatureValue {
    Number(f64),
    Text(String),
}

impl FeatureValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FeatureValue::Number(n) => Some(*n),
            FeatureValue::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FeatureValue::Text(t) => Some(t.as_str()),
            FeatureValue::Number(_) => None,
        }
    }
}

/// A mapping from feature name to `(value, confidence)`, the structured
/// interpretation of either a user query or a product listing.
///
/// `BTreeMap` keeps iteration order deterministic, which the scoring
/// engine and rationale builder both rely on (spec §8 determinism law).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFeatures {
    values: BTreeMap<String, (FeatureValue, f64)>,
    pub technical_query: bool,
    pub category: Option<String>,
}

impl ExtractedFeatures {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FeatureValue, confidence: f64) {
        self.values.insert(name.into(), (value, confidence.clamp(0.0, 1.0)));
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.values.get(name).map(|(v, _)| v)
    }

    pub fn confidence_of(&self, name: &str) -> Option<f64> {
        self.values.get(name).map(|(_, c)| *c)
    }

    pub fn get_number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FeatureValue::as_number)
    }

    pub fn get_text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FeatureValue::as_text)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue, f64)> {
        self.values.iter().map(|(k, (v, c))| (k.as_str(), v, *c))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_features_has_no_technical_query() {
        let f = ExtractedFeatures::empty();
        assert!(f.is_empty());
        assert!(!f.technical_query);
    }

    #[test]
    fn confidence_is_clamped() {
        let mut f = ExtractedFeatures::empty();
        f.insert("refresh_rate", FeatureValue::Number(144.0), 1.5);
        assert_eq!(f.confidence_of("refresh_rate"), Some(1.0));
    }
}
