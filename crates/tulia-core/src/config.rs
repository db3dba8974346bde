//! Configuration types for Tulia

use std::path::Path;

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Environment variable naming a JSON config file
pub const CONFIG_PATH_ENV: &str = "TULIA_CONFIG";
/// Environment override for `rpc.url`
pub const RPC_URL_ENV: &str = "TULIA_RPC_URL";
/// Environment override for `api_port`
pub const API_PORT_ENV: &str = "TULIA_API_PORT";

/// JSON-RPC endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcConfig {
    /// Endpoint URL (e.g., "http://127.0.0.1:8545")
    pub url: String,

    /// Per-request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8545".to_string(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Singleton protocol contracts shared by every pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractAddresses {
    /// Holds pool interest and pays it out to lenders
    pub vault_manager: Address,
    /// Tracks and pays reward-token incentives
    pub reward_manager: Address,
}

impl Default for ContractAddresses {
    fn default() -> Self {
        Self {
            vault_manager: address!("8D3520C41d6eca54ab638d85F22a414fB2264114"),
            reward_manager: address!("a5Fe443f5D1e2Af4D62583308Dc428494C19C915"),
        }
    }
}

/// How much allowance the approve action requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalPolicy {
    /// A fixed large allowance, independent of the loan amount
    Fixed,
    /// Exactly the loan amount
    Exact,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalConfig {
    #[serde(default = "default_approval_policy")]
    pub policy: ApprovalPolicy,

    /// Whole tokens requested under `ApprovalPolicy::Fixed`
    #[serde(default = "default_fixed_amount_tokens")]
    pub fixed_amount_tokens: u64,
}

fn default_approval_policy() -> ApprovalPolicy {
    ApprovalPolicy::Fixed
}

fn default_fixed_amount_tokens() -> u64 {
    1_000_000_000
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            policy: default_approval_policy(),
            fixed_amount_tokens: default_fixed_amount_tokens(),
        }
    }
}

/// Background transaction watcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,

    /// Items older than this are reported as failed and dropped
    #[serde(default = "default_watch_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_poll_interval_secs() -> u64 {
    4
}

fn default_watch_timeout_secs() -> u64 {
    10 * 60
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval_secs(),
            timeout_secs: default_watch_timeout_secs(),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// RPC connection settings
    pub rpc: RpcConfig,

    /// Expected chain ID; a mismatch is reported by the status endpoint
    #[serde(default)]
    pub chain_id: Option<u64>,

    #[serde(default)]
    pub contracts: ContractAddresses,

    #[serde(default)]
    pub approval: ApprovalConfig,

    #[serde(default)]
    pub watcher: WatcherConfig,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,
}

fn default_api_port() -> u16 {
    18545
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rpc: RpcConfig::default(),
            chain_id: None,
            contracts: ContractAddresses::default(),
            approval: ApprovalConfig::default(),
            watcher: WatcherConfig::default(),
            api_port: default_api_port(),
        }
    }
}

impl AppConfig {
    /// Parse a JSON config document
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load from `path` if given, otherwise defaults; then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, Error> {
        let mut config = match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|e| {
                    Error::Config(format!("Failed to read {}: {}", path.display(), e))
                })?;
                Self::from_json_str(&raw)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply overrides from a key lookup (the process environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(RPC_URL_ENV) {
            tracing::debug!(%url, "RPC URL overridden from environment");
            self.rpc.url = url;
        }
        if let Some(port) = lookup(API_PORT_ENV) {
            self.api_port = port.parse().map_err(|_| {
                Error::Config(format!("{} is not a valid port: {}", API_PORT_ENV, port))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.rpc.url, "http://127.0.0.1:8545");
        assert_eq!(config.api_port, 18545);
        assert_eq!(config.approval.policy, ApprovalPolicy::Fixed);
        assert_eq!(config.approval.fixed_amount_tokens, 1_000_000_000);
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.rpc.url, config.rpc.url);
        assert_eq!(
            parsed.contracts.vault_manager,
            config.contracts.vault_manager
        );
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config = AppConfig::from_json_str(
            r#"{ "rpc": { "url": "https://rpc.example.org" }, "approval": { "policy": "exact" } }"#,
        )
        .unwrap();
        assert_eq!(config.rpc.url, "https://rpc.example.org");
        assert_eq!(config.rpc.request_timeout_secs, 30);
        assert_eq!(config.approval.policy, ApprovalPolicy::Exact);
        assert_eq!(config.watcher.poll_interval_secs, 4);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(|key| match key {
                RPC_URL_ENV => Some("http://node:8545".to_string()),
                API_PORT_ENV => Some("9000".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.rpc.url, "http://node:8545");
        assert_eq!(config.api_port, 9000);
    }

    #[test]
    fn test_bad_port_override_is_config_error() {
        let mut config = AppConfig::default();
        let err = config
            .apply_overrides(|key| (key == API_PORT_ENV).then(|| "nope".to_string()))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_invalid_json_is_config_error() {
        assert!(matches!(
            AppConfig::from_json_str("{ not json"),
            Err(Error::Config(_))
        ));
    }
}
