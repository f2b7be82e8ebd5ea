//! Frozen resource-set presets (spec §4.7). These never vary per-call;
//! widening what the adapter requests belongs in a new variant, not a
//! runtime parameter.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceSet {
    /// title, features, technical info, brand/manufacturer, price,
    /// image, review count, star rating.
    AiSearch,
    /// title, features, technical info, brand, detailed price
    /// (including saving basis), image.
    AiLookup,
}

impl ResourceSet {
    /// Upstream resource-path identifiers this preset expands to.
    pub fn upstream_resources(self) -> &'static [&'static str] {
        match self {
            ResourceSet::AiSearch => &[
                "ItemInfo.Title",
                "ItemInfo.Features",
                "ItemInfo.TechnicalInfo",
                "ItemInfo.ByLineInfo",
                "Offers.Listings.Price",
                "Images.Primary.Large",
                "CustomerReviews.Count",
                "CustomerReviews.StarRating",
            ],
            ResourceSet::AiLookup => &[
                "ItemInfo.Title",
                "ItemInfo.Features",
                "ItemInfo.TechnicalInfo",
                "ItemInfo.ByLineInfo",
                "Offers.Listings.Price",
                "Offers.Listings.SavingBasis",
                "Images.Primary.Large",
            ],
        }
    }

    pub fn id(self) -> &'static str {
        match self {
            ResourceSet::AiSearch => "ai_search",
            ResourceSet::AiLookup => "ai_lookup",
        }
    }
}
