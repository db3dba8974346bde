//! evm-client: Wallet and contract-call client over Ethereum JSON-RPC
//!
//! This crate provides the client the lend view talks to: read-only contract
//! calls, write submissions from a node-managed account, receipt-based
//! transaction status, and capability probing of the endpoint.

pub mod capabilities;
pub mod queries;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{Address, Bytes, TxHash};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tulia_core::{BlockNumber, ChainId, RpcConfig, RpcError, TxStatus};

pub use capabilities::{ChainCapabilities, ConnectionTier};

use queries::{CallObject, RpcRequest, RpcResponse};

/// Result type for client operations
pub type Result<T> = std::result::Result<T, RpcError>;

/// A single contract call: target, ABI-encoded calldata, and the function
/// name for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
    pub to: Address,
    pub data: Bytes,
    pub function: &'static str,
}

impl ContractCall {
    pub fn new(to: Address, data: impl Into<Bytes>, function: &'static str) -> Self {
        Self {
            to,
            data: data.into(),
            function,
        }
    }
}

/// The wallet/contract-call surface the lend view depends on
#[async_trait]
pub trait ContractClient: Send + Sync {
    /// Execute a read-only call against the latest block and return the raw return data
    async fn read_contract(&self, call: &ContractCall) -> Result<Bytes>;

    /// Submit a transaction from `from` and return its hash without waiting for inclusion
    async fn write_contract(&self, from: Address, call: &ContractCall) -> Result<TxHash>;

    /// Current status of a submitted transaction
    async fn transaction_status(&self, tx_hash: TxHash) -> Result<TxStatus>;
}

/// JSON-RPC client with capability detection
#[derive(Clone)]
pub struct RpcClient {
    http: reqwest::Client,
    config: RpcConfig,
    next_id: Arc<AtomicU64>,
    capabilities: Arc<RwLock<Option<ChainCapabilities>>>,
    expected_chain_id: Option<ChainId>,
}

impl RpcClient {
    /// Create a new client and probe the endpoint
    pub async fn new(config: RpcConfig, expected_chain_id: Option<ChainId>) -> Result<Self> {
        let client = Self::new_without_probe(config, expected_chain_id)?;

        client.refresh_capabilities().await;
        let online = client
            .capabilities()
            .await
            .is_some_and(|caps| caps.is_online);
        if !online {
            return Err(RpcError::Unreachable {
                url: client.config.url.clone(),
            });
        }

        Ok(client)
    }

    /// Create without probing (for testing or when the endpoint may be offline)
    pub fn new_without_probe(config: RpcConfig, expected_chain_id: Option<ChainId>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("tulia")
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| RpcError::Unreachable {
                url: format!("{}: {}", config.url, e),
            })?;

        Ok(Self {
            http,
            config,
            next_id: Arc::new(AtomicU64::new(1)),
            capabilities: Arc::new(RwLock::new(None)),
            expected_chain_id,
        })
    }

    /// Get the current endpoint configuration
    pub fn config(&self) -> &RpcConfig {
        &self.config
    }

    /// Refresh capability detection
    pub async fn refresh_capabilities(&self) {
        let caps = capabilities::detect_capabilities(self, self.expected_chain_id).await;
        let mut lock = self.capabilities.write().await;
        *lock = Some(caps);
    }

    /// Get current capabilities (may be stale if not recently refreshed)
    pub async fn capabilities(&self) -> Option<ChainCapabilities> {
        let lock = self.capabilities.read().await;
        lock.clone()
    }

    /// Get the head block number
    pub async fn block_number(&self) -> Result<BlockNumber> {
        let value = self.request("eth_blockNumber", json!([])).await?;
        queries::parse_quantity(&value)
    }

    /// Get the chain ID reported by the endpoint
    pub async fn chain_id(&self) -> Result<ChainId> {
        let value = self.request("eth_chainId", json!([])).await?;
        queries::parse_quantity(&value)
    }

    /// Client version string from `web3_clientVersion`
    pub async fn client_version(&self) -> Option<String> {
        self.request("web3_clientVersion", json!([]))
            .await
            .ok()
            .and_then(|v| v.as_str().map(|s| s.to_string()))
    }

    /// Send one JSON-RPC request and return its `result` value
    pub async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = RpcRequest::new(id, method, params);

        tracing::trace!(method, id, "RPC request");

        let response = timed_request(
            self.config.request_timeout_secs,
            self.http.post(&self.config.url).json(&body).send(),
        )
        .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::ApiError {
                message: format!("{} returned HTTP {}", method, status),
            });
        }

        let parsed: RpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::ParseError(format!("{}: {}", method, e)))?;

        parsed.into_result()
    }
}

#[async_trait]
impl ContractClient for RpcClient {
    async fn read_contract(&self, call: &ContractCall) -> Result<Bytes> {
        let call_object = CallObject {
            from: None,
            to: call.to,
            data: call.data.clone(),
        };
        let value = self
            .request("eth_call", json!([call_object, "latest"]))
            .await
            .map_err(|e| {
                tracing::debug!(to = %call.to, function = call.function, error = %e, "eth_call failed");
                e
            })?;
        queries::parse_bytes(value)
    }

    async fn write_contract(&self, from: Address, call: &ContractCall) -> Result<TxHash> {
        let call_object = CallObject {
            from: Some(from),
            to: call.to,
            data: call.data.clone(),
        };
        let value = self
            .request("eth_sendTransaction", json!([call_object]))
            .await?;
        let tx_hash = queries::parse_tx_hash(value)?;
        tracing::info!(%from, to = %call.to, function = call.function, %tx_hash, "Transaction submitted");
        Ok(tx_hash)
    }

    async fn transaction_status(&self, tx_hash: TxHash) -> Result<TxStatus> {
        let receipt = self
            .request("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;
        queries::receipt_status(&receipt)
    }
}

/// Bound a request future by the configured timeout
async fn timed_request<T, E: std::fmt::Display>(
    timeout_secs: u64,
    fut: impl std::future::Future<Output = std::result::Result<T, E>>,
) -> Result<T> {
    tokio::time::timeout(Duration::from_secs(timeout_secs), fut)
        .await
        .map_err(|_| RpcError::Timeout { secs: timeout_secs })?
        .map_err(|e| RpcError::ApiError {
            message: e.to_string(),
        })
}
