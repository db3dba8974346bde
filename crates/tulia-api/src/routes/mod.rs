//! API route handlers

pub mod health;
pub mod lending;
pub mod node;

use axum::{routing::get, Router};

use crate::AppState;

/// Create the API router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .nest("/node", node::router())
        .nest("/lending", lending::router())
        .with_state(state)
}
