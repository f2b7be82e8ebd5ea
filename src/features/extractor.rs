use regex::Regex;
use std::sync::OnceLock;

use crate::models::features::{ExtractedFeatures, FeatureValue};
use crate::vocab::{self, CategoryVocabulary, FeatureRule};

use super::normalize::normalize_numeric;

const EXTRACTION_CONFIDENCE: f64 = 0.9;

/// Turns free text into [`ExtractedFeatures`] by layered pattern
/// matching against category vocabularies (spec §4.1).
///
/// Holds no mutable state after construction and is safe for
/// concurrent calls; extraction never fails, it degrades to an empty
/// result.
#[derive(Debug, Default, Clone, Copy)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, query: &str, category_hint: Option<&str>) -> ExtractedFeatures {
        let mut features = ExtractedFeatures::empty();

        // Marketing terms and mixed-language filler never become
        // features or count toward a category match (spec §4.1); strip
        // both before any pattern matching runs.
        let cleaned = strip_marketing_terms(&vocab::strip_noise_tokens(query));

        let vocabulary = category_hint
            .and_then(vocab::lookup_category)
            .or_else(|| best_matching_vocabulary(&cleaned));

        let mut numeric_count = 0usize;
        let mut categorical_technical_count = 0usize;
        let mut category_term_present = false;

        if let Some(voc) = vocabulary {
            category_term_present = contains_any_word(&cleaned, voc.category_keywords);

            for feature in voc.features {
                if let Some(value) = extract_feature(&cleaned, feature) {
                    let is_numeric = value.as_number().is_some();
                    features.insert(feature.feature_name, value, EXTRACTION_CONFIDENCE);
                    if is_numeric {
                        numeric_count += 1;
                    } else if feature.feature_name != "usage_context" {
                        categorical_technical_count += 1;
                    }
                }
            }

            // A bare category noun ("display", "monitor") with no actual
            // feature match isn't enough to claim the category (spec §4.1:
            // marketing terms plus generic nouns alone stay untyped).
            if numeric_count > 0 || categorical_technical_count > 0 {
                features.category = Some(voc.category.to_string());
            }
        }

        extract_brand(&cleaned, &mut features);
        extract_price_constraints(query, &mut numeric_count, &mut features);

        features.technical_query = numeric_count >= 1
            || categorical_technical_count >= 2
            || (category_term_present && (numeric_count + categorical_technical_count) >= 1);

        features
    }
}

/// Removes [`vocab::DEFAULT_MARKETING_DENYLIST`] phrases so they can
/// never satisfy a category keyword or feature pattern (spec §4.1).
fn strip_marketing_terms(text: &str) -> String {
    static DENYLIST_RE: OnceLock<Regex> = OnceLock::new();
    let re = DENYLIST_RE.get_or_init(|| {
        let alternation = vocab::DEFAULT_MARKETING_DENYLIST
            .iter()
            .map(|term| regex::escape(term))
            .collect::<Vec<_>>()
            .join("|");
        Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("denylist regex must be valid")
    });
    re.replace_all(text, " ").to_string()
}

fn best_matching_vocabulary(query: &str) -> Option<&'static CategoryVocabulary> {
    // Only one vocabulary ships today; this still walks a list so a
    // second category plugs in without touching the extractor.
    let candidates: &[&'static CategoryVocabulary] = &[&vocab::gaming_monitor::VOCABULARY];
    candidates
        .iter()
        .map(|voc| (*voc, score_match(query, voc)))
        .filter(|(_, score)| *score > 0)
        .max_by_key(|(_, score)| *score)
        .map(|(voc, _)| voc)
}

fn score_match(query: &str, voc: &CategoryVocabulary) -> usize {
    let mut score = contains_any_word(query, voc.category_keywords) as usize;
    for feature in voc.features {
        if extract_feature(query, feature).is_some() {
            score += 1;
        }
    }
    score
}

fn extract_feature(
    query: &str,
    feature: &crate::vocab::FeaturePattern,
) -> Option<FeatureValue> {
    for rule in feature.rules {
        match rule {
            FeatureRule::Numeric { regex, unit } => {
                let re = compiled(regex);
                if let Some(caps) = re.captures(query) {
                    if let Some(raw) = caps.get(1).and_then(|m| m.as_str().parse::<f64>().ok()) {
                        let normalized = normalize_numeric(raw, *unit);
                        if in_range(normalized, feature.valid_range) {
                            return Some(FeatureValue::Number(normalized));
                        }
                    }
                }
            }
            FeatureRule::Categorical { regex, canonical } => {
                let re = compiled(regex);
                if re.is_match(query) {
                    return Some(FeatureValue::Text((*canonical).to_string()));
                }
            }
        }
    }
    None
}

fn in_range(value: f64, range: Option<(f64, f64)>) -> bool {
    match range {
        Some((lo, hi)) => value >= lo && value <= hi,
        None => true,
    }
}

fn extract_brand(query: &str, features: &mut ExtractedFeatures) {
    let lower = query.to_lowercase();
    for brand in vocab::KNOWN_BRANDS {
        let re = compiled_word_boundary(brand);
        if re.is_match(&lower) {
            features.insert("brand", FeatureValue::Text((*brand).to_string()), EXTRACTION_CONFIDENCE);
            return;
        }
    }
}

/// Always-on price extraction: `₹`-prefixed integers and range
/// constructs such as "under 60000" or "between 10000 and 50000"
/// (spec §4.1).
fn extract_price_constraints(query: &str, numeric_count: &mut usize, features: &mut ExtractedFeatures) {
    static UNDER: OnceLock<Regex> = OnceLock::new();
    static BETWEEN: OnceLock<Regex> = OnceLock::new();
    static RUPEE: OnceLock<Regex> = OnceLock::new();

    let under = UNDER.get_or_init(|| {
        Regex::new(r"(?i)(?:under|below|less than)\s*(?:rs\.?|inr|₹)?\s*(\d{3,7})").unwrap()
    });
    let between = BETWEEN.get_or_init(|| {
        Regex::new(r"(?i)between\s*(?:rs\.?|inr|₹)?\s*(\d{3,7})\s*(?:and|to|-)\s*(?:rs\.?|inr|₹)?\s*(\d{3,7})")
            .unwrap()
    });
    let rupee = RUPEE.get_or_init(|| Regex::new(r"₹\s*(\d{3,7})").unwrap());

    if let Some(caps) = between.captures(query) {
        let lo: f64 = caps[1].parse().unwrap_or(0.0);
        let hi: f64 = caps[2].parse().unwrap_or(0.0);
        features.insert("min_price", FeatureValue::Number(lo.min(hi)), EXTRACTION_CONFIDENCE);
        features.insert("max_price", FeatureValue::Number(lo.max(hi)), EXTRACTION_CONFIDENCE);
        *numeric_count += 1;
    } else if let Some(caps) = under.captures(query) {
        let max: f64 = caps[1].parse().unwrap_or(0.0);
        features.insert("max_price", FeatureValue::Number(max), EXTRACTION_CONFIDENCE);
    } else if let Some(caps) = rupee.captures(query) {
        let price: f64 = caps[1].parse().unwrap_or(0.0);
        features.insert("max_price", FeatureValue::Number(price), EXTRACTION_CONFIDENCE);
    }
}

fn contains_any_word(query: &str, words: &[&str]) -> bool {
    let lower = query.to_lowercase();
    words.iter().any(|w| compiled_word_boundary(w).is_match(&lower))
}

fn compiled(pattern: &str) -> Regex {
    Regex::new(pattern).expect("vocabulary regex must be valid")
}

fn compiled_word_boundary(word: &str) -> Regex {
    Regex::new(&format!(r"(?i)\b{}\b", regex::escape(word))).expect("word-boundary regex must be valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_size_category_and_budget() {
        let f = FeatureExtractor::new().extract("32 inch gaming monitor under 60000", None);
        assert_eq!(f.get_number("size"), Some(32.0));
        assert_eq!(f.category.as_deref(), Some("gaming_monitor"));
        assert_eq!(f.get_text("usage_context"), Some("gaming"));
        assert_eq!(f.get_number("max_price"), Some(60000.0));
        assert!(f.technical_query);
    }

    #[test]
    fn marketing_only_query_yields_no_technical_features() {
        let f = FeatureExtractor::new().extract("stunning cinematic eye-care display", None);
        assert!(!f.technical_query);
        assert!(f.category.is_none());
    }

    #[test]
    fn empty_query_yields_empty_features() {
        let f = FeatureExtractor::new().extract("", None);
        assert!(f.is_empty());
        assert!(!f.technical_query);
    }

    #[test]
    fn extraction_is_stable() {
        let q = "27 inch 165Hz curved IPS monitor";
        let a = FeatureExtractor::new().extract(q, None);
        let b = FeatureExtractor::new().extract(q, None);
        assert_eq!(a, b);
    }

    #[test]
    fn transliterated_filler_does_not_block_numeric_extraction() {
        let f = FeatureExtractor::new().extract("32 inch monitor ka best wala chahiye", None);
        assert_eq!(f.get_number("size"), Some(32.0));
    }

    #[test]
    fn combined_price_range_extracted() {
        let f = FeatureExtractor::new().extract("monitor between 10000 and 50000", None);
        assert_eq!(f.get_number("min_price"), Some(10000.0));
        assert_eq!(f.get_number("max_price"), Some(50000.0));
    }

    #[test]
    fn out_of_range_refresh_rate_is_dropped() {
        let f = FeatureExtractor::new().extract("monitor with 1000 Hz refresh rate", None);
        assert!(f.get_number("refresh_rate").is_none());
    }
}
