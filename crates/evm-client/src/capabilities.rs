//! Endpoint capability detection
//!
//! Probes chain ID and head block to decide whether the endpoint can serve
//! the lend view.

use serde::{Deserialize, Serialize};

use crate::RpcClient;

/// Connection tier based on what the endpoint reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ConnectionTier {
    /// Reachable and on the expected chain (or no chain expected)
    Ready,
    /// Reachable but reporting a different chain ID than configured
    WrongChain,
    /// Not reachable
    Offline,
}

impl ConnectionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::WrongChain => "WrongChain",
            Self::Offline => "Offline",
        }
    }
}

/// Capabilities detected through probing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainCapabilities {
    /// Endpoint is reachable and responding
    pub is_online: bool,

    /// Chain ID reported by the endpoint
    pub chain_id: Option<u64>,

    /// Chain ID the configuration expects
    pub expected_chain_id: Option<u64>,

    /// Current head block
    pub block_number: u64,

    pub connection_tier: ConnectionTier,
}

impl ChainCapabilities {
    pub fn offline(expected_chain_id: Option<u64>) -> Self {
        Self {
            is_online: false,
            chain_id: None,
            expected_chain_id,
            block_number: 0,
            connection_tier: ConnectionTier::Offline,
        }
    }

    /// Check if the reported chain matches the configured one
    pub fn chain_matches(&self) -> bool {
        match (self.expected_chain_id, self.chain_id) {
            (None, _) => true,
            (Some(expected), Some(actual)) => expected == actual,
            (Some(_), None) => false,
        }
    }
}

/// Pick the tier for a reachable endpoint
fn tier_for(chain_id: Option<u64>, expected_chain_id: Option<u64>) -> ConnectionTier {
    match (expected_chain_id, chain_id) {
        (Some(expected), Some(actual)) if expected != actual => ConnectionTier::WrongChain,
        _ => ConnectionTier::Ready,
    }
}

/// Detect endpoint capabilities by probing
pub async fn detect_capabilities(
    client: &RpcClient,
    expected_chain_id: Option<u64>,
) -> ChainCapabilities {
    let block_number = match client.block_number().await {
        Ok(n) => n,
        Err(e) => {
            tracing::debug!(error = %e, "Endpoint did not answer eth_blockNumber");
            return ChainCapabilities::offline(expected_chain_id);
        }
    };

    // Some gateways reject eth_chainId; treat as unknown rather than offline
    let chain_id = client.chain_id().await.ok();
    let connection_tier = tier_for(chain_id, expected_chain_id);

    if connection_tier == ConnectionTier::WrongChain {
        tracing::warn!(
            ?chain_id,
            ?expected_chain_id,
            "RPC endpoint is on a different chain than configured"
        );
    }

    ChainCapabilities {
        is_online: true,
        chain_id,
        expected_chain_id,
        block_number,
        connection_tier,
    }
}
