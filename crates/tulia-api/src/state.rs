//! Application state shared across API handlers

use std::collections::HashMap;
use std::sync::Arc;

use evm_client::{ContractClient, RpcClient};
use lending::{LendView, NoticeLog};
use tokio::sync::{Mutex, RwLock};
use tulia_core::{AppConfig, RpcConfig};
use uuid::Uuid;

use crate::tx_watcher::TxWatcherState;

/// One mounted lend view and the notices it has produced
pub struct Session {
    pub view: LendView,
    pub notices: NoticeLog,
}

impl Session {
    pub fn new(view: LendView) -> Self {
        Self {
            view,
            notices: NoticeLog::new(),
        }
    }
}

pub type SharedSession = Arc<Mutex<Session>>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RwLock<AppConfig>,
    rpc_client: RwLock<Option<RpcClient>>,
    /// Replaces the RPC client for contract calls when set
    contract_client: Option<Arc<dyn ContractClient>>,
    sessions: RwLock<HashMap<Uuid, SharedSession>>,
    watcher: TxWatcherState,
}

impl AppState {
    /// Create a new application state with default config
    pub fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    /// Create with a specific config
    pub fn with_config(config: AppConfig) -> Self {
        Self::build(config, None)
    }

    /// Create with a fixed contract client instead of a JSON-RPC endpoint
    pub fn with_client(config: AppConfig, client: Arc<dyn ContractClient>) -> Self {
        Self::build(config, Some(client))
    }

    fn build(config: AppConfig, contract_client: Option<Arc<dyn ContractClient>>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config: RwLock::new(config),
                rpc_client: RwLock::new(None),
                contract_client,
                sessions: RwLock::new(HashMap::new()),
                watcher: TxWatcherState::default(),
            }),
        }
    }

    /// Get current config
    pub async fn config(&self) -> AppConfig {
        self.inner.config.read().await.clone()
    }

    /// Update RPC endpoint configuration
    pub async fn set_rpc_config(&self, rpc_config: RpcConfig) {
        let mut config = self.inner.config.write().await;
        config.rpc = rpc_config;

        // Clear cached client
        let mut client = self.inner.rpc_client.write().await;
        *client = None;
    }

    /// Get or create the JSON-RPC client
    pub async fn rpc_client(&self) -> Option<RpcClient> {
        {
            let client = self.inner.rpc_client.read().await;
            if client.is_some() {
                return client.clone();
            }
        }

        let config = self.inner.config.read().await;
        tracing::info!("Creating RPC client for URL: {}", config.rpc.url);
        match RpcClient::new(config.rpc.clone(), config.chain_id).await {
            Ok(client) => {
                tracing::info!("RPC client created successfully");
                let mut cached = self.inner.rpc_client.write().await;
                *cached = Some(client.clone());
                Some(client)
            }
            Err(e) => {
                tracing::warn!("Failed to create RPC client for {}: {}", config.rpc.url, e);
                None
            }
        }
    }

    /// Force refresh the JSON-RPC client
    pub async fn refresh_rpc_client(&self) -> Option<RpcClient> {
        let mut client = self.inner.rpc_client.write().await;
        *client = None;
        drop(client);

        self.rpc_client().await
    }

    /// Client used for contract reads and writes
    pub async fn contract_client(&self) -> Option<Arc<dyn ContractClient>> {
        if let Some(client) = &self.inner.contract_client {
            return Some(client.clone());
        }
        self.rpc_client()
            .await
            .map(|c| Arc::new(c) as Arc<dyn ContractClient>)
    }

    /// Register a mounted view
    pub async fn insert_session(&self, view: LendView) -> (Uuid, SharedSession) {
        let id = Uuid::new_v4();
        let session = Arc::new(Mutex::new(Session::new(view)));
        self.inner
            .sessions
            .write()
            .await
            .insert(id, session.clone());
        tracing::debug!(%id, "Session mounted");
        (id, session)
    }

    pub async fn session(&self, id: Uuid) -> Option<SharedSession> {
        self.inner.sessions.read().await.get(&id).cloned()
    }

    /// Unmount a view. Returns false when no such session exists.
    pub async fn remove_session(&self, id: Uuid) -> bool {
        let removed = self.inner.sessions.write().await.remove(&id).is_some();
        if removed {
            tracing::debug!(%id, "Session unmounted");
        }
        removed
    }

    pub async fn session_count(&self) -> usize {
        self.inner.sessions.read().await.len()
    }

    pub fn watcher(&self) -> &TxWatcherState {
        &self.inner.watcher
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
