//! RPC endpoint status and configuration endpoints

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use tulia_core::RpcConfig;

use crate::dto::{ApiError, ApiFailure, NodeConfigRequest, NodeStatusResponse};
use crate::AppState;

/// Create node routes
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/status", get(get_status))
        .route("/configure", post(configure))
}

/// GET /node/status - Get current RPC endpoint status
pub async fn get_status(
    State(state): State<AppState>,
) -> Result<Json<NodeStatusResponse>, ApiFailure> {
    let config = state.config().await;

    let offline = NodeStatusResponse {
        connected: false,
        url: config.rpc.url.clone(),
        client_version: None,
        chain_id: None,
        expected_chain_id: config.chain_id,
        block_number: 0,
        connection_tier: "Offline".to_string(),
    };

    let Some(client) = state.rpc_client().await else {
        return Ok(Json(offline));
    };

    client.refresh_capabilities().await;
    let client_version = client.client_version().await;

    match client.capabilities().await {
        Some(caps) => Ok(Json(NodeStatusResponse {
            connected: caps.is_online,
            url: config.rpc.url,
            client_version,
            chain_id: caps.chain_id,
            expected_chain_id: caps.expected_chain_id,
            block_number: caps.block_number,
            connection_tier: caps.connection_tier.as_str().to_string(),
        })),
        None => Ok(Json(offline)),
    }
}

/// POST /node/configure - Update RPC endpoint configuration
pub async fn configure(
    State(state): State<AppState>,
    Json(request): Json<NodeConfigRequest>,
) -> Result<Json<NodeStatusResponse>, ApiFailure> {
    if request.url.trim().is_empty() {
        return Err((
            axum::http::StatusCode::BAD_REQUEST,
            Json(ApiError::bad_request("RPC URL must not be empty")),
        ));
    }

    let current = state.config().await.rpc;
    let rpc_config = RpcConfig {
        url: request.url.trim().to_string(),
        request_timeout_secs: request
            .request_timeout_secs
            .unwrap_or(current.request_timeout_secs),
    };
    tracing::info!(url = %rpc_config.url, "Reconfiguring RPC endpoint");
    state.set_rpc_config(rpc_config).await;

    // Refresh client and return status
    let _ = state.refresh_rpc_client().await;

    get_status(State(state)).await
}
