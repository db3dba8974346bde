//! Lend View State Types
//!
//! The pool row supplied by the caller, the actions the view can dispatch,
//! and the derived view state presented to the user.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, U256};
use serde::{Deserialize, Serialize};

/// How a pool accrues interest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterestModel {
    Simple,
    Compound,
    FlashLoan,
}

/// Funding status as listed in the pools table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FundingStatus {
    Pending,
    Funded,
    /// Any status the table reports that the view does not act on
    #[serde(other)]
    Other,
}

/// One lending pool as listed in the caller's table.
///
/// Read-only inside the view; the ledger is authoritative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRow {
    pub pool: Address,
    /// Lender wallet address
    #[serde(alias = "walletAddress")]
    pub lender: Address,
    /// Borrower wallet address (zero address when none yet)
    pub borrower: Address,
    /// Loan amount in the smallest currency unit
    pub amount: U256,
    /// Interest rate in percent (e.g. 10.0 means 10%)
    pub interest_rate: f64,
    /// Repayment period in seconds
    pub repayment_period: u64,
    pub interest_model: InterestModel,
    /// ERC-20 the loan is denominated in
    pub loan_currency_address: Address,
    pub token_symbol: String,
    /// Display name of the borrowed token
    pub borrow_token_name: String,
    pub funding_status: FundingStatus,
}

/// Actions the lend view can dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LendAction {
    Approve,
    ActivateLoan,
    ClaimInterest,
    ClaimRewards,
    DefaultLoan,
    CloseDeal,
}

impl LendAction {
    pub const ALL: [LendAction; 6] = [
        Self::Approve,
        Self::ActivateLoan,
        Self::ClaimInterest,
        Self::ClaimRewards,
        Self::DefaultLoan,
        Self::CloseDeal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "approve",
            Self::ActivateLoan => "activate_loan",
            Self::ClaimInterest => "claim_interest",
            Self::ClaimRewards => "claim_rewards",
            Self::DefaultLoan => "default_loan",
            Self::CloseDeal => "close_deal",
        }
    }
}

impl fmt::Display for LendAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LendAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| format!("Unknown lend action: {}", s))
    }
}

/// The button the view leads with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryAction {
    /// Unfunded pool, allowance below the loan amount
    Approve { disabled: bool },
    /// Unfunded pool, allowance sufficient
    ActivateLoan,
    /// Funded pool: open the management dialog
    Manage,
}

/// A value backed by a contract read.
///
/// `Stale` keeps the last good value after a failed refresh so the display
/// never silently shows an outdated figure as current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "value", rename_all = "lowercase")]
pub enum Observed<T> {
    Loading,
    Fresh(T),
    Stale(T),
}

impl<T> Default for Observed<T> {
    fn default() -> Self {
        Self::Loading
    }
}

impl<T: Clone + PartialEq> Observed<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Loading => None,
            Self::Fresh(v) | Self::Stale(v) => Some(v),
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self, Self::Stale(_))
    }

    /// Record a read result. Returns true when the observed value changed.
    pub fn observe<E: fmt::Display>(&mut self, field: &'static str, result: Result<T, E>) -> bool {
        match result {
            Ok(new) => {
                let changed = self.value() != Some(&new);
                *self = Self::Fresh(new);
                changed
            }
            Err(e) => {
                tracing::debug!(field, error = %e, "Read failed, keeping last value");
                if let Self::Fresh(v) = self {
                    *self = Self::Stale(v.clone());
                }
                false
            }
        }
    }
}

/// Loan-state change reported when the ledger code moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LoanStateTransition {
    pub from: Option<u8>,
    pub to: u8,
    /// Label after the transition
    pub label: Option<&'static str>,
}

/// Derived view state presented by the lend view.
///
/// Every figure is derived from the row and the latest reads; none is
/// authoritative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub loan_state: Observed<u8>,
    pub loan_state_label: Option<&'static str>,

    pub remaining_seconds: Observed<u64>,
    pub formatted_remaining_time: Option<String>,

    pub allowance: Observed<U256>,
    pub approval_needed: bool,
    pub approval_pending: bool,

    /// Reward APY as returned by the reward manager
    pub apy: Observed<U256>,
    pub apy_percent: Option<f64>,

    /// Interest claimable from the vault manager
    pub claimable_interest: Observed<U256>,
    pub claimable_interest_display: Option<String>,

    /// Rewards claimable from the reward manager
    pub claimable_rewards: Observed<U256>,
    pub claimable_rewards_display: Option<f64>,

    /// Principal plus interest, in the smallest currency unit
    pub collateral: U256,
    pub collateral_display: f64,
    /// Loan amount with the token symbol, e.g. "1000 USDT"
    pub loan_amount_display: String,

    pub repayment_period_days: f64,
    pub borrower_short: String,
    pub is_lender: bool,
    pub is_funded: bool,
    /// Flash-loan pools offer the borrower contract template
    pub is_flash_loan: bool,

    pub primary_action: PrimaryAction,
}
