use super::{CategoryVocabulary, FeaturePattern, FeatureRule, Unit};

/// Gaming-monitor vocabulary: the illustrative category spec §4.3 names
/// explicitly. Refresh rate and size are numeric; resolution, panel
/// type, curvature, and usage context are closed categorical sets.
pub static VOCABULARY: CategoryVocabulary = CategoryVocabulary {
    category: "gaming_monitor",
    category_keywords: &["monitor", "display", "screen"],
    features: &[
        FeaturePattern {
            feature_name: "refresh_rate",
            rules: &[
                FeatureRule::Numeric {
                    regex: r"(?i)\b(\d{2,3})\s*(?:hz|fps|hertz)\b",
                    unit: Unit::Hertz,
                },
            ],
            valid_range: Some((30.0, 480.0)),
        },
        FeaturePattern {
            feature_name: "size",
            rules: &[
                FeatureRule::Numeric {
                    regex: r#"(?i)(\d{1,2}(?:\.\d)?)\s*(?:"|inch(?:es)?|in\b)"#,
                    unit: Unit::Inches,
                },
                FeatureRule::Numeric {
                    regex: r"(?i)(\d{2,3}(?:\.\d)?)\s*cm\b",
                    unit: Unit::Centimeters,
                },
            ],
            valid_range: Some((10.0, 65.0)),
        },
        FeaturePattern {
            feature_name: "resolution",
            rules: &[
                FeatureRule::Categorical { regex: r"(?i)\b1080\s*p\b|full\s*hd|fhd\b", canonical: "1080p" },
                FeatureRule::Categorical { regex: r"(?i)\b1440\s*p\b|q\s*hd\b|wqhd\b|2k\b", canonical: "1440p" },
                FeatureRule::Categorical { regex: r"(?i)\b4\s*k\b|uhd\b|2160\s*p\b", canonical: "4k" },
                FeatureRule::Categorical { regex: r"(?i)\b8\s*k\b", canonical: "8k" },
                FeatureRule::Categorical { regex: r"(?i)ultra\s*wide|ultrawide", canonical: "ultrawide" },
            ],
            valid_range: None,
        },
        FeaturePattern {
            feature_name: "curvature",
            rules: &[
                FeatureRule::Categorical { regex: r"(?i)\bcurved\b|\b\d{3,4}\s*r\b", canonical: "curved" },
                FeatureRule::Categorical { regex: r"(?i)\bflat\b", canonical: "flat" },
            ],
            valid_range: None,
        },
        FeaturePattern {
            feature_name: "panel_type",
            rules: &[
                FeatureRule::Categorical { regex: r"(?i)\bips\b", canonical: "ips" },
                FeatureRule::Categorical { regex: r"(?i)\bva\s*panel\b|\bva\b", canonical: "va" },
                FeatureRule::Categorical { regex: r"(?i)\btn\s*panel\b|\btn\b", canonical: "tn" },
                FeatureRule::Categorical { regex: r"(?i)\boled\b", canonical: "oled" },
            ],
            valid_range: None,
        },
        FeaturePattern {
            feature_name: "usage_context",
            rules: &[
                FeatureRule::Categorical { regex: r"(?i)\bgaming\b|\besports\b|\bgamer\b", canonical: "gaming" },
                FeatureRule::Categorical { regex: r"(?i)\bprofessional\b|\bediting\b|\bdesign\b|\bwork\b|\bworkstation\b", canonical: "professional" },
                FeatureRule::Categorical { regex: r"(?i)\bbudget\b|\bcheap\b|\baffordable\b", canonical: "budget" },
            ],
            valid_range: None,
        },
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_has_no_duplicate_feature_names() {
        let mut names: Vec<_> = VOCABULARY.features.iter().map(|f| f.feature_name).collect();
        let len_before = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), len_before);
    }
}
