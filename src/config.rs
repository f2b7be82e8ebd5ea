//! Recognized configuration surface (spec §6). Loaded once at startup
//! from the environment, the way the host binary's `.env`-backed
//! config has always worked in this codebase.

use std::time::Duration;

use crate::paapi::{PaapiConfig, PaapiCredentials};
use crate::pipeline::PipelineConfig;
use crate::watch::WatchEvaluatorConfig;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

pub struct AppConfig {
    pub paapi: PaapiConfig,
    pub pipeline: PipelineConfig,
    pub watch: WatchEvaluatorConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let credentials = PaapiCredentials {
            access_key: env_or("PAAPI_ACCESS_KEY", ""),
            secret_key: env_or("PAAPI_SECRET_KEY", ""),
            partner_tag: env_or("PAAPI_PARTNER_TAG", ""),
            marketplace: env_or("PAAPI_MARKETPLACE", "www.amazon.in"),
            region: env_or("PAAPI_REGION", "eu-west-1"),
        };

        let paapi = PaapiConfig {
            base_url: env_or("PAAPI_BASE_URL", "https://webservices.amazon.in/paapi5"),
            credentials,
            rate_per_sec: env_parse("PAAPI_RATE_PER_SEC", 1),
            search_timeout: Duration::from_millis(env_parse("PAAPI_SEARCH_TIMEOUT_MS", 5000)),
            batch_timeout: Duration::from_millis(env_parse("PAAPI_BATCH_TIMEOUT_MS", 90_000)),
        };

        let pipeline = PipelineConfig {
            analyzer_workers: env_parse("PIPELINE_ANALYZER_WORKERS", 8),
            deadline: Duration::from_millis(env_parse("PIPELINE_DEADLINE_MS", 15_000)),
            enable_enrichment: env_parse("PIPELINE_ENABLE_ENRICHMENT", true),
            multicard_top_gap: env_parse("MULTICARD_TOP_GAP", 0.20),
            multicard_single_override_score: env_parse("MULTICARD_SINGLE_OVERRIDE_SCORE", 0.95),
            multicard_single_override_gap: env_parse("MULTICARD_SINGLE_OVERRIDE_GAP", 0.30),
            scoring_enable_excellence_bonus: env_parse("SCORING_ENABLE_EXCELLENCE_BONUS", true),
        };

        let watch = WatchEvaluatorConfig {
            price_drop_threshold: env_parse("WATCH_PRICE_DROP_THRESHOLD", 0.95),
            fail_threshold: env_parse("WATCH_FAIL_THRESHOLD", 3),
        };

        Self { paapi, pipeline, watch }
    }
}
