use std::sync::Arc;

use crate::pipeline::Pipeline;
use crate::repo::WatchRepo;
use crate::watch::WatchEvaluator;

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub evaluator: Arc<WatchEvaluator>,
    pub watch_repo: Arc<dyn WatchRepo>,
}
