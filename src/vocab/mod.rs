//! Static vocabulary data used by the feature extractor and product
//! analyzer: per-category regex patterns, normalizers, and the
//! marketing-terms denylist (spec §4.1, §4.2).

pub mod gaming_monitor;

use regex::Regex;
use std::sync::OnceLock;

/// A single regex rule recognizing one value of a feature.
///
/// `Numeric` rules carry a capture group holding the raw number; the
/// extractor hands the match (plus whatever unit text surrounds it) to
/// the feature's normalizer. `Categorical` rules match a synonym and
/// map it straight to its canonical value — no capture group needed.
pub enum FeatureRule {
    Numeric { regex: &'static str, unit: Unit },
    Categorical { regex: &'static str, canonical: &'static str },
}

/// Unit a numeric rule's capture group is expressed in, before
/// normalization (spec §4.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    Hertz,
    Inches,
    Centimeters,
}

/// One recognized feature within a category vocabulary: its name and
/// the rules that recognize it in free text or product titles. Scoring
/// weights live separately in [`crate::scoring::weights`], keyed by the
/// same feature names, so one vocabulary can serve several categories.
pub struct FeaturePattern {
    pub feature_name: &'static str,
    pub rules: &'static [FeatureRule],
    /// Inclusive validation range for numeric features; out-of-range
    /// matches are dropped, not clamped (spec §4.2).
    pub valid_range: Option<(f64, f64)>,
}

/// A category's full vocabulary: its recognized features plus the
/// per-feature validation ranges used by the analyzer (spec §4.2).
pub struct CategoryVocabulary {
    pub category: &'static str,
    /// Generic nouns that name the category itself ("monitor",
    /// "display"), used for the `technical_query` category-term rule
    /// (spec §4.1) independently of any specific feature match.
    pub category_keywords: &'static [&'static str],
    pub features: &'static [FeaturePattern],
}

/// Default marketing terms that never become features (spec §4.1).
/// Configurable in a real deployment via `feature.marketing_denylist`;
/// this is the documented default set.
pub const DEFAULT_MARKETING_DENYLIST: &[&str] = &[
    "cinematic",
    "eye-care",
    "eye care",
    "stunning",
    "immersive",
    "crystal clear",
    "vivid",
    "breathtaking",
    "next-gen",
    "premium quality",
    "best in class",
    "game-changing",
];

/// Generic brand tokens recognized by the always-on extractor patterns
/// (spec §4.1), independent of category.
pub const KNOWN_BRANDS: &[&str] = &[
    "samsung", "lg", "dell", "acer", "asus", "benq", "msi", "hp", "lenovo",
    "viewsonic", "philips", "aoc", "gigabyte", "sony", "zebronics", "mi",
    "xiaomi", "frontech", "hisense", "toshiba",
];

/// Tokens that appear in casual Hindi/English-transliterated queries
/// and carry no feature information (spec §4.1).
pub const NOISE_TOKENS: &[&str] = &["ka", "ki", "ke", "wala", "wali", "chahiye", "dedo", "bhej"];

/// Tokens that are purely ornamental in product titles and must not be
/// mistaken for feature values during title parsing (spec §4.2):
/// model numbers like `AB1234`, `(2023 model)` suffixes, warranty text.
pub fn noise_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        vec![
            Regex::new(r"(?i)\b[A-Z]{2,}\d{3,}\b").unwrap(),
            Regex::new(r"(?i)\(\s*\d{4}\s*model\s*\)").unwrap(),
            Regex::new(r"(?i)\b\d+\s*(?:year|yr)s?\s*warranty\b").unwrap(),
        ]
    })
}

pub fn strip_noise_tokens(text: &str) -> String {
    text.split_whitespace()
        .filter(|tok| !NOISE_TOKENS.contains(&tok.to_lowercase().as_str()))
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn strip_title_noise(title: &str) -> String {
    let mut out = title.to_string();
    for re in noise_patterns() {
        out = re.replace_all(&out, " ").to_string();
    }
    out
}

pub fn lookup_category(category: &str) -> Option<&'static CategoryVocabulary> {
    match category {
        "gaming_monitor" => Some(&gaming_monitor::VOCABULARY),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_transliterated_filler_without_touching_numbers() {
        let stripped = strip_noise_tokens("32 inch monitor ka best wala chahiye");
        assert_eq!(stripped, "32 inch monitor best");
    }

    #[test]
    fn strips_model_number_and_year_suffix() {
        let stripped = strip_title_noise("Samsung AB1234 Monitor (2023 model) 2 year warranty");
        assert!(!stripped.contains("AB1234"));
        assert!(!stripped.to_lowercase().contains("2023 model"));
        assert!(!stripped.to_lowercase().contains("warranty"));
    }
}
