//! Tulia-api: HTTP API layer for the Tulia lend view
//!
//! Hosts lend-view sessions behind a REST surface and watches submitted
//! transactions until they resolve.

pub mod dto;
pub mod routes;
pub mod server;
pub mod state;
pub mod tx_watcher;

pub use server::*;
pub use state::{AppState, Session, SharedSession};

#[cfg(test)]
pub(crate) mod test_support;
