//! Sole point of contact with the upstream product-advertising API
//! (spec §4.7). Everything above this module consumes [`PaapiAdapter`]
//! and never sees upstream pagination, units, or retry quirks.

pub mod breaker;
pub mod client;
pub mod failure_cache;
pub mod price_source;
pub mod rate_limiter;
pub mod resource_set;

pub use client::{PaapiClient, PaapiConfig, PaapiCredentials};
pub use price_source::{NoPriceSource, PriceSource};
pub use resource_set::ResourceSet;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::errors::CoreError;
use crate::models::product::Product;

#[derive(Debug, Clone)]
pub struct SearchParams {
    pub keywords: Vec<String>,
    pub index: String,
    pub min_price_rupees: Option<i64>,
    pub max_price_rupees: Option<i64>,
    pub browse_node: Option<String>,
    pub item_count: usize,
    pub resource_set: ResourceSet,
}

pub struct SearchOutcome {
    pub products: Vec<Product>,
    /// Set when a later page failed and the result is a partial set
    /// rather than everything that was requested (spec §4.7).
    pub partial: bool,
}

#[async_trait]
pub trait PaapiAdapter: Send + Sync {
    /// One request, up to 10 items. `page` is the 1-indexed upstream page.
    async fn search(&self, params: &SearchParams, page: u32) -> Result<(Vec<Product>, bool), CoreError>;

    /// Up to `max_pages` sequential page requests, respecting rate
    /// limits, concatenated into a unique product set.
    async fn search_paginated(&self, params: &SearchParams, max_pages: usize) -> Result<SearchOutcome, CoreError>;

    async fn get_item(&self, asin: &str, resource_set: ResourceSet) -> Result<Product, CoreError>;

    async fn get_items_batch(
        &self,
        asins: &[String],
        resource_set: ResourceSet,
    ) -> Result<BTreeMap<String, Product>, CoreError>;
}
