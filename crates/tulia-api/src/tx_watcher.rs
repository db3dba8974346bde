//! Background transaction watcher
//!
//! Polls receipts for transactions submitted from lend-view sessions and
//! feeds the final status back into the owning session, where it updates the
//! view and queues the status notice.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy_primitives::{Address, TxHash};
use evm_client::ContractClient;
use lending::{on_status, status_notice, LendAction, Notice, Notifier};
use serde::Serialize;
use tokio::sync::Mutex;
use tulia_core::TxStatus;
use uuid::Uuid;

use crate::state::Session;
use crate::AppState;

struct WatchItem {
    id: Uuid,
    session_id: Uuid,
    action: LendAction,
    tx_hash: TxHash,
    pool: Address,
    submitted_at: Instant,
}

#[derive(Debug, Serialize, Clone)]
pub struct WatchedItemInfo {
    pub id: Uuid,
    pub session_id: Uuid,
    pub action: LendAction,
    pub tx_hash: TxHash,
    pub pool: Address,
    pub elapsed_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Status(TxStatus),
    /// Still unresolved when the watch window closed
    Timeout,
}

/// A watched transaction that left the pending state
#[derive(Debug, Clone)]
pub struct Resolved {
    pub id: Uuid,
    pub session_id: Uuid,
    pub action: LendAction,
    pub tx_hash: TxHash,
    pub pool: Address,
    pub resolution: Resolution,
}

impl WatchItem {
    fn resolve(&self, resolution: Resolution) -> Resolved {
        Resolved {
            id: self.id,
            session_id: self.session_id,
            action: self.action,
            tx_hash: self.tx_hash,
            pool: self.pool,
            resolution,
        }
    }
}

#[derive(Default)]
pub struct TxWatcher {
    items: Vec<WatchItem>,
}

impl TxWatcher {
    pub fn add(
        &mut self,
        session_id: Uuid,
        action: LendAction,
        tx_hash: TxHash,
        pool: Address,
    ) -> Uuid {
        let id = Uuid::new_v4();
        self.items.push(WatchItem {
            id,
            session_id,
            action,
            tx_hash,
            pool,
            submitted_at: Instant::now(),
        });
        id
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn watched_items(&self) -> Vec<WatchedItemInfo> {
        self.items
            .iter()
            .map(|item| WatchedItemInfo {
                id: item.id,
                session_id: item.session_id,
                action: item.action,
                tx_hash: item.tx_hash,
                pool: item.pool,
                elapsed_secs: item.submitted_at.elapsed().as_secs(),
            })
            .collect()
    }

    /// Remove items older than `timeout`. Needs no client.
    pub fn expire(&mut self, timeout: Duration) -> Vec<Resolved> {
        let mut expired = Vec::new();
        self.items.retain(|item| {
            if item.submitted_at.elapsed() >= timeout {
                expired.push(item.resolve(Resolution::Timeout));
                false
            } else {
                true
            }
        });
        expired
    }

    /// Expire old items, check the rest once and remove the ones that resolved
    pub async fn poll(&mut self, client: &dyn ContractClient, timeout: Duration) -> Vec<Resolved> {
        let mut resolved = self.expire(timeout);

        for item in &self.items {
            match client.transaction_status(item.tx_hash).await {
                Ok(status) if status.is_final() => {
                    resolved.push(item.resolve(Resolution::Status(status)))
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(tx_hash = %item.tx_hash, error = %e, "Receipt lookup failed");
                }
            }
        }

        self.items
            .retain(|item| !resolved.iter().any(|r| r.id == item.id));
        resolved
    }
}

/// Apply a resolution to its session's view and notices.
///
/// When the session has since moved to another pool only the notice is
/// queued.
pub fn apply_resolution(session: &mut Session, resolved: &Resolved) {
    let Session { view, notices } = session;
    if view.row().pool != resolved.pool {
        tracing::debug!(pool = %resolved.pool, "Session moved to another pool, notice only");
        let notice = match resolved.resolution {
            Resolution::Status(status) => status_notice(resolved.action, status),
            Resolution::Timeout => timeout_notice(resolved.tx_hash),
        };
        notices.notify(notice);
        return;
    }

    match resolved.resolution {
        Resolution::Status(status) => on_status(view, notices, resolved.action, status),
        Resolution::Timeout => {
            // Unblocks a pending approval so it can be retried
            view.apply_tx_status(resolved.action, TxStatus::Error);
            notices.notify(timeout_notice(resolved.tx_hash));
        }
    }
}

fn timeout_notice(tx_hash: TxHash) -> Notice {
    Notice::error(format!("Transaction {} was not confirmed in time", tx_hash))
}

/// Deliver resolutions to their sessions; unmounted sessions are skipped
pub async fn deliver(state: &AppState, resolved: Vec<Resolved>) {
    for r in resolved {
        tracing::info!(tx_hash = %r.tx_hash, action = %r.action, resolution = ?r.resolution, "Transaction resolved");
        match state.session(r.session_id).await {
            Some(session) => apply_resolution(&mut *session.lock().await, &r),
            None => {
                tracing::debug!(session_id = %r.session_id, "Session gone, dropping status update")
            }
        }
    }
}

pub struct TxWatcherState {
    watcher: Mutex<TxWatcher>,
    polling: Arc<AtomicBool>,
}

impl Default for TxWatcherState {
    fn default() -> Self {
        Self {
            watcher: Mutex::new(TxWatcher::default()),
            polling: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl TxWatcherState {
    pub async fn watched_items(&self) -> Vec<WatchedItemInfo> {
        self.watcher.lock().await.watched_items()
    }

    pub fn is_polling(&self) -> bool {
        self.polling.load(Ordering::SeqCst)
    }
}

/// Start watching a submitted transaction
pub async fn watch(
    state: &AppState,
    session_id: Uuid,
    action: LendAction,
    tx_hash: TxHash,
    pool: Address,
) -> Uuid {
    let id = {
        let mut watcher = state.watcher().watcher.lock().await;
        watcher.add(session_id, action, tx_hash, pool)
    };
    ensure_poll_loop(state.clone());
    id
}

fn ensure_poll_loop(state: AppState) {
    if state.watcher().polling.swap(true, Ordering::SeqCst) {
        return; // Already running
    }

    tokio::spawn(async move {
        loop {
            let config = state.config().await.watcher;
            tokio::time::sleep(Duration::from_secs(config.poll_interval_secs)).await;
            let timeout = Duration::from_secs(config.timeout_secs);

            // May probe the endpoint, so fetched before taking the watcher lock
            let client = state.contract_client().await;

            let resolved = {
                let mut watcher = state.watcher().watcher.lock().await;
                if watcher.is_empty() {
                    // Cleared under the lock so a concurrent watch() restarts the loop
                    state.watcher().polling.store(false, Ordering::SeqCst);
                    break;
                }
                match client {
                    Some(client) => watcher.poll(client.as_ref(), timeout).await,
                    None => watcher.expire(timeout),
                }
            };

            deliver(&state, resolved).await;
        }

        tracing::debug!("TxWatcher poll loop stopped (no items)");
    });
}
