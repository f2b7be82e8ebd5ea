use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::watch::{Alert, Watch};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_active))
        .route("/:id/evaluate", post(evaluate))
}

async fn list_active(State(state): State<AppState>) -> Json<Vec<Watch>> {
    Json(state.watch_repo.list_active(None).await)
}

#[derive(Debug, Serialize)]
struct EvaluateResponse {
    price_changed: bool,
    alert: Option<Alert>,
}

async fn evaluate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EvaluateResponse>, CoreError> {
    let (price_changed, alert) = state.evaluator.evaluate(id).await?;
    Ok(Json(EvaluateResponse { price_changed, alert }))
}
