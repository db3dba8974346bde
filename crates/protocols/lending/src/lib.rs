//! Tulia Lend View
//!
//! Client-side management of a single Tulia lending pool from the lender's
//! side: reads the pool's ledger state, derives what the lender sees, and
//! dispatches guarded write transactions.
//!
//! # Lifecycle
//!
//! A pool moves through loan-state codes reported by the pool contract:
//! - 0: created, lender has not funded it (approve, then activate)
//! - 1: waiting for a borrower (close allowed)
//! - 2: borrower found (interest claimable, default once the window ends)
//!
//! # Layout
//!
//! `fetch` issues reads, `view` folds them into `ViewState`, `guards` decide
//! what may be sent, and `dispatch` builds intents via `tx_builder` and
//! submits them.

pub mod abi;
pub mod calculator;
pub mod constants;
pub mod dispatch;
pub mod fetch;
pub mod guards;
pub mod notify;
pub mod state;
pub mod tx_builder;
pub mod view;

#[cfg(test)]
pub(crate) mod test_support;

// Re-exports
pub use calculator::*;
pub use dispatch::{dispatch, on_status, status_notice, DispatchContext, DispatchOutcome};
pub use fetch::{fetch_reads, LendReads};
pub use guards::GuardViolation;
pub use notify::{Notice, NoticeLevel, NoticeLog, Notifier};
pub use state::*;
pub use tx_builder::{AbiRef, IntentArg, TransactionIntent};
pub use view::LendView;
