use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;

use pricewatch_core::app;
use pricewatch_core::config::AppConfig;
use pricewatch_core::jobs::JobSchedulerService;
use pricewatch_core::logging::{init_logging, LoggingConfig};
use pricewatch_core::paapi::{NoPriceSource, PaapiClient};
use pricewatch_core::pipeline::Pipeline;
use pricewatch_core::repo::in_memory::{InMemoryPriceHistoryRepo, InMemoryWatchRepo};
use pricewatch_core::state::AppState;
use pricewatch_core::watch::WatchEvaluator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    init_logging(LoggingConfig::from_env())?;

    let config = AppConfig::from_env();

    let adapter = Arc::new(PaapiClient::new(config.paapi, Arc::new(NoPriceSource)));
    let watch_repo: Arc<InMemoryWatchRepo> = Arc::new(InMemoryWatchRepo::new());
    let price_history = Arc::new(InMemoryPriceHistoryRepo::new());

    let pipeline = Arc::new(Pipeline::new(adapter.clone(), config.pipeline));
    let evaluator = Arc::new(WatchEvaluator::new(adapter, watch_repo.clone(), price_history, config.watch));

    let mut scheduler = JobSchedulerService::new(evaluator.clone(), watch_repo.clone()).await?;
    scheduler.start().await?;

    let state = AppState {
        pipeline,
        evaluator,
        watch_repo,
    };

    let app = app::create_app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("pricewatch-host running at http://{}/", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
