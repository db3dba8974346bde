//! Error types for Tulia

use thiserror::Error;

/// Core errors that can occur in Tulia
#[derive(Debug, Error)]
pub enum Error {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// RPC connection and query errors
#[derive(Debug, Clone, Error)]
pub enum RpcError {
    #[error("RPC endpoint unreachable at {url}")]
    Unreachable { url: String },

    #[error("RPC request failed: {message}")]
    ApiError { message: String },

    /// JSON-RPC error object returned by the endpoint (reverts land here)
    #[error("RPC returned error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("RPC request timed out after {secs}s")]
    Timeout { secs: u64 },
}

/// Protocol-specific errors
#[derive(Debug, Clone, Error)]
pub enum ProtocolError {
    #[error("Protocol state unavailable: {reason}")]
    StateUnavailable { reason: String },

    #[error("Invalid amount: {message}")]
    InvalidAmount { message: String },

    #[error("Failed to decode contract response from {function}: {message}")]
    DecodeFailed { function: String, message: String },
}

/// Transaction submission errors
#[derive(Debug, Clone, Error)]
pub enum TxError {
    #[error("No connected account to send from")]
    NoAccount,

    #[error("Transaction submission failed: {message}")]
    SubmissionFailed { message: String },
}

impl ProtocolError {
    /// Get an HTTP-friendly error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::StateUnavailable { .. } => "state_unavailable",
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::DecodeFailed { .. } => "decode_failed",
        }
    }

    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidAmount { .. } => 400,
            Self::StateUnavailable { .. } | Self::DecodeFailed { .. } => 503,
        }
    }
}

impl TxError {
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoAccount => "no_account",
            Self::SubmissionFailed { .. } => "submission_failed",
        }
    }
}
