//! Search-keyword enhancement and pagination-depth heuristics (spec §4.6
//! step 2-3).

const BASE_PAGES: usize = 3;
const MAX_PAGES: usize = 8;

pub fn enhanced_keywords(
    base_keywords: &[String],
    budget_rupees: Option<i64>,
    category: Option<&str>,
    user_brand: Option<&str>,
) -> Vec<String> {
    let mut present: std::collections::BTreeSet<String> =
        base_keywords.iter().map(|k| k.to_lowercase()).collect();
    let mut additions = Vec::new();

    let mut add = |term: &str| {
        let lower = term.to_lowercase();
        if present.insert(lower) {
            additions.push(term.to_string());
        }
    };

    if let Some(budget) = budget_rupees {
        if budget >= 100_000 {
            for term in ["professional", "studio", "flagship"] {
                add(term);
            }
        } else if budget >= 50_000 {
            for term in ["business", "workstation"] {
                add(term);
            }
        } else if budget >= 25_000 {
            for term in ["performance", "quality"] {
                add(term);
            }
        }

        if category == Some("gaming_monitor") && budget >= 30_000 {
            for term in ["4K", "UHD", "HDR", "IPS", "144Hz"] {
                add(term);
            }
        }
    }

    if let Some(brand) = user_brand {
        let brand_lower = brand.to_lowercase();
        additions.retain(|term| !term.to_lowercase().contains(&brand_lower) || term.eq_ignore_ascii_case(brand));
    }

    additions
}

/// Base 3 pages, max 8; budget/keyword-count/category multipliers
/// compound and are capped at `MAX_PAGES`.
pub fn search_depth(budget_rupees: Option<i64>, enhanced_keyword_count: usize, requested_item_count: usize) -> usize {
    let mut pages = BASE_PAGES as f64;

    if let Some(budget) = budget_rupees {
        if budget >= 100_000 {
            pages *= 1.5;
        } else if budget >= 50_000 {
            pages *= 1.25;
        }
    }

    if enhanced_keyword_count >= 5 {
        pages *= 1.2;
    }

    if requested_item_count > 10 {
        pages *= 1.0 + (requested_item_count as f64 / 10.0 - 1.0).min(1.0);
    }

    (pages.round() as usize).clamp(BASE_PAGES, MAX_PAGES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn low_budget_adds_nothing() {
        let keywords = enhanced_keywords(&["monitor".into()], Some(8_000), None, None);
        assert!(keywords.is_empty());
    }

    #[test]
    fn mid_budget_adds_performance_terms() {
        let keywords = enhanced_keywords(&["monitor".into()], Some(30_000), None, None);
        assert!(keywords.contains(&"performance".to_string()));
    }

    #[test]
    fn gaming_monitor_over_30k_adds_category_terms() {
        let keywords = enhanced_keywords(&["monitor".into()], Some(35_000), Some("gaming_monitor"), None);
        assert!(keywords.iter().any(|k| k == "144Hz"));
    }

    #[test]
    fn never_duplicates_existing_tokens() {
        let keywords = enhanced_keywords(&["monitor".into(), "performance".into()], Some(30_000), None, None);
        assert_eq!(keywords.iter().filter(|k| k.eq_ignore_ascii_case("performance")).count(), 0);
    }

    #[test]
    fn search_depth_is_bounded() {
        assert!(search_depth(Some(200_000), 10, 50) <= MAX_PAGES);
        assert!(search_depth(None, 0, 5) >= BASE_PAGES);
    }
}
