//! Health check endpoint

use axum::{extract::State, Json};

use crate::dto::HealthResponse;
use crate::AppState;

/// GET /health - Check API health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        sessions: state.session_count().await,
        watcher_polling: state.watcher().is_polling(),
        ..HealthResponse::default()
    })
}
