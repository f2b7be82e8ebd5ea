use axum::http::{HeaderMap, HeaderValue};
use axum::response::IntoResponse;
use reqwest::StatusCode;
use thiserror::Error;

/// Identifies which filter emptied the candidate set (spec §7).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoMatchReason {
    NoSearchResults,
    PriceFilter,
    BrandFilter,
    DiscountFilter,
    PostEnrichmentEmpty,
}

impl std::fmt::Display for NoMatchReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NoMatchReason::NoSearchResults => "no_search_results",
            NoMatchReason::PriceFilter => "price_filter",
            NoMatchReason::BrandFilter => "brand_filter",
            NoMatchReason::DiscountFilter => "discount_filter",
            NoMatchReason::PostEnrichmentEmpty => "post_enrichment_empty",
        };
        f.write_str(s)
    }
}

/// The five canonical errors that may cross the core's boundary
/// (spec §7). Every fallible operation in the core returns one of
/// these rather than raising an exception.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no match: {0}")]
    NoMatch(NoMatchReason),

    #[error("transient upstream failure: {0}")]
    Transient(String),

    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for CoreError {
    fn into_response(self) -> axum::response::Response {
        match self {
            CoreError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            CoreError::NoMatch(reason) => {
                (StatusCode::NOT_FOUND, format!("no_match:{reason}")).into_response()
            }
            CoreError::Transient(msg) => {
                let mut headers = HeaderMap::new();
                headers.insert("Retry-After", HeaderValue::from_static("5"));
                (StatusCode::SERVICE_UNAVAILABLE, headers, msg).into_response()
            }
            CoreError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, msg).into_response()
            }
            CoreError::Internal(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response()
            }
        }
    }
}
