//! Data Transfer Objects for API requests and responses

use alloy_primitives::Address;
use axum::http::StatusCode;
use axum::Json;
use lending::{DispatchOutcome, LoanRow, LoanStateTransition, Notice, ViewState};
use serde::{Deserialize, Serialize};
use tulia_core::{ProtocolError, TxError};
use uuid::Uuid;

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Mounted lend-view sessions
    pub sessions: usize,
    pub watcher_polling: bool,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            sessions: 0,
            watcher_polling: false,
        }
    }
}

/// RPC endpoint status response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeStatusResponse {
    pub connected: bool,
    pub url: String,
    pub client_version: Option<String>,
    pub chain_id: Option<u64>,
    pub expected_chain_id: Option<u64>,
    pub block_number: u64,
    pub connection_tier: String,
}

/// RPC endpoint configuration request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfigRequest {
    pub url: String,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

/// Mount a lend view for one pool row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MountRequest {
    pub row: LoanRow,
    /// Connected wallet, if any
    #[serde(default)]
    pub account: Option<Address>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateRowRequest {
    pub row: LoanRow,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAccountRequest {
    pub account: Option<Address>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub state: ViewState,
    /// Set when this refresh moved the loan state
    pub transition: Option<LoanStateTransition>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActionResponse {
    #[serde(flatten)]
    pub outcome: DispatchOutcome,
    /// Watcher entry tracking the submitted transaction
    pub watch_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoticesResponse {
    pub notices: Vec<Notice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FlashLoanTemplateResponse {
    pub language: &'static str,
    pub source: &'static str,
}

/// Generic API error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("not_found", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new("bad_request", message)
    }
}

/// Error half of every handler's return type
pub type ApiFailure = (StatusCode, Json<ApiError>);

impl From<ProtocolError> for ApiError {
    fn from(e: ProtocolError) -> Self {
        Self::new(e.error_code(), e.to_string())
    }
}

pub fn protocol_failure(e: ProtocolError) -> ApiFailure {
    let status =
        StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(e.into()))
}

pub fn tx_failure(e: TxError) -> ApiFailure {
    let status = match e {
        TxError::NoAccount => StatusCode::BAD_REQUEST,
        TxError::SubmissionFailed { .. } => StatusCode::BAD_GATEWAY,
    };
    (status, Json(ApiError::new(e.error_code(), e.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_failure_uses_error_status() {
        let (status, Json(body)) = protocol_failure(ProtocolError::StateUnavailable {
            reason: "RPC endpoint unavailable".into(),
        });
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body.code, "state_unavailable");
    }

    #[test]
    fn test_tx_failure_status() {
        let (status, Json(body)) = tx_failure(TxError::NoAccount);
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.code, "no_account");

        let (status, _) = tx_failure(TxError::SubmissionFailed {
            message: "rejected".into(),
        });
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
