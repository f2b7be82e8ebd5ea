use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::CoreError;
use crate::models::query::{Filters, Query};
use crate::models::selection::SelectionResult;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(run_selection))
}

#[derive(Debug, Deserialize)]
pub struct RunSelectionRequest {
    pub text: String,
    #[serde(default)]
    pub filters: Filters,
    pub user_id: Option<Uuid>,
}

async fn run_selection(
    State(state): State<AppState>,
    Json(request): Json<RunSelectionRequest>,
) -> Result<Json<SelectionResult>, CoreError> {
    if request.text.trim().is_empty() {
        return Err(CoreError::InvalidInput("text must not be empty".to_string()));
    }

    let query = Query::new(request.text, request.filters);
    let user_id = request.user_id.unwrap_or_else(Uuid::new_v4);
    let result = state.pipeline.run_selection(&query, user_id).await?;
    Ok(Json(result))
}
