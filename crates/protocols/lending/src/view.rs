//! Lend view derivation
//!
//! `LendView` is one mounted instance of the lend-management view. Inputs
//! arrive as discrete events (row replaced, account changed, a read
//! returned, a transaction status arrived); each event recomputes only the
//! derived fields that declare it as a dependency.
//!
//! | Derived field              | Inputs                                  |
//! |----------------------------|-----------------------------------------|
//! | loan_state_label           | loan_state                              |
//! | collateral(_display)       | row.amount, row.interest_rate           |
//! | loan_amount_display        | row.amount, row.token_symbol            |
//! | approval_needed            | allowance, row.amount, approve status   |
//! | formatted_remaining_time   | remaining_seconds                       |
//! | apy_percent                | apy                                     |
//! | claimable_*_display        | claimable_interest / claimable_rewards  |
//! | is_lender                  | account, row.lender                     |
//! | is_funded                  | row.funding_status                      |
//! | primary_action             | loan_state, approval_needed/pending     |
//!
//! Read-backed fields belong to one pool and currency. Pointing the row at
//! another pool or currency drops them back to loading.

use alloy_primitives::{Address, U256};
use tulia_core::constants::TOKEN_DECIMALS;
use tulia_core::TxStatus;

use crate::calculator;
use crate::constants::loan_state;
use crate::fetch::LendReads;
use crate::state::{
    FundingStatus, InterestModel, LendAction, LoanRow, LoanStateTransition, Observed,
    PrimaryAction, ViewState,
};

/// One mounted lend view
#[derive(Debug, Clone)]
pub struct LendView {
    row: LoanRow,
    account: Option<Address>,
    state: ViewState,
}

impl LendView {
    /// Mount a view for `row` as seen by `account`
    pub fn mount(row: LoanRow, account: Option<Address>) -> Self {
        let state = ViewState {
            loan_state: Observed::Loading,
            loan_state_label: None,
            remaining_seconds: Observed::Loading,
            formatted_remaining_time: None,
            allowance: Observed::Loading,
            approval_needed: false,
            approval_pending: false,
            apy: Observed::Loading,
            apy_percent: None,
            claimable_interest: Observed::Loading,
            claimable_interest_display: None,
            claimable_rewards: Observed::Loading,
            claimable_rewards_display: None,
            collateral: U256::ZERO,
            collateral_display: 0.0,
            loan_amount_display: String::new(),
            repayment_period_days: 0.0,
            borrower_short: String::new(),
            is_lender: false,
            is_funded: false,
            is_flash_loan: false,
            primary_action: PrimaryAction::Manage,
        };

        let mut view = Self {
            row,
            account,
            state,
        };
        view.derive_from_row();
        view.derive_is_lender();
        view.derive_approval_needed();
        view.derive_primary_action();

        tracing::debug!(pool = %view.row.pool, account = ?view.account, "Lend view mounted");
        view
    }

    pub fn row(&self) -> &LoanRow {
        &self.row
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Owned copy of the current view state for presentation
    pub fn snapshot(&self) -> ViewState {
        self.state.clone()
    }

    /// Replace the row (the table refreshed)
    pub fn set_row(&mut self, row: LoanRow) {
        let target_changed = row.pool != self.row.pool
            || row.loan_currency_address != self.row.loan_currency_address;
        let amount_changed = row.amount != self.row.amount;
        let lender_changed = row.lender != self.row.lender;
        self.row = row;

        if target_changed {
            tracing::debug!(pool = %self.row.pool, "Row points at another pool, dropping reads");
            self.reset_reads();
        }
        self.derive_from_row();
        if lender_changed {
            self.derive_is_lender();
        }
        if amount_changed || target_changed {
            self.derive_approval_needed();
            self.derive_primary_action();
        }
    }

    /// Switch the connected account.
    ///
    /// Allowance is per-account, so it reloads for the new one.
    pub fn set_account(&mut self, account: Option<Address>) {
        if account == self.account {
            return;
        }
        self.account = account;
        self.state.allowance = Observed::Loading;
        self.derive_is_lender();
        self.derive_approval_needed();
        self.derive_primary_action();
    }

    /// Record a loan-state read.
    ///
    /// Returns the transition when the code moved; re-observing the same code
    /// is a no-op.
    pub fn observe_loan_state<E: std::fmt::Display>(
        &mut self,
        result: Result<u8, E>,
    ) -> Option<LoanStateTransition> {
        let from = self.state.loan_state.value().copied();
        if !self.state.loan_state.observe("loan_state", result) {
            return None;
        }
        let to = *self.state.loan_state.value()?;

        if let Some(label) = calculator::loan_state_label(to) {
            self.state.loan_state_label = Some(label);
        }
        self.derive_primary_action();

        tracing::info!(pool = %self.row.pool, ?from, to, "Loan state changed");
        Some(LoanStateTransition {
            from,
            to,
            label: self.state.loan_state_label,
        })
    }

    pub fn observe_allowance<E: std::fmt::Display>(&mut self, result: Result<U256, E>) {
        if self.state.allowance.observe("allowance", result) {
            self.derive_approval_needed();
            self.derive_primary_action();
        }
    }

    pub fn observe_remaining_seconds<E: std::fmt::Display>(&mut self, result: Result<u64, E>) {
        if self.state.remaining_seconds.observe("remaining_seconds", result)
            || self.state.formatted_remaining_time.is_none()
        {
            self.state.formatted_remaining_time = self
                .state
                .remaining_seconds
                .value()
                .map(|s| calculator::format_duration(*s));
        }
    }

    pub fn observe_apy<E: std::fmt::Display>(&mut self, result: Result<U256, E>) {
        if self.state.apy.observe("apy", result) {
            self.state.apy_percent = self.state.apy.value().map(|v| calculator::apy_percent(*v));
        }
    }

    pub fn observe_claimable_interest<E: std::fmt::Display>(&mut self, result: Result<U256, E>) {
        if self
            .state
            .claimable_interest
            .observe("claimable_interest", result)
        {
            self.state.claimable_interest_display = self
                .state
                .claimable_interest
                .value()
                .map(|v| calculator::interest_display(*v, TOKEN_DECIMALS));
        }
    }

    pub fn observe_claimable_rewards<E: std::fmt::Display>(&mut self, result: Result<U256, E>) {
        if self
            .state
            .claimable_rewards
            .observe("claimable_rewards", result)
        {
            self.state.claimable_rewards_display = self
                .state
                .claimable_rewards
                .value()
                .map(|v| calculator::rewards_display(*v));
        }
    }

    /// Apply one refresh worth of reads
    pub fn apply_reads(&mut self, reads: LendReads) -> Option<LoanStateTransition> {
        let transition = self.observe_loan_state(reads.loan_state);
        self.observe_remaining_seconds(reads.remaining_seconds);
        if let Some(allowance) = reads.allowance {
            self.observe_allowance(allowance);
        }
        self.observe_claimable_interest(reads.claimable_interest);
        self.observe_claimable_rewards(reads.claimable_rewards);
        self.observe_apy(reads.reward_apy);
        transition
    }

    /// A transaction for `action` was handed to the wallet
    pub fn mark_submitted(&mut self, action: LendAction) {
        if action == LendAction::Approve {
            self.state.approval_pending = true;
            self.derive_primary_action();
        }
    }

    /// A status update arrived for a submitted `action`
    pub fn apply_tx_status(&mut self, action: LendAction, status: TxStatus) {
        if action != LendAction::Approve || !status.is_final() {
            return;
        }
        self.state.approval_pending = false;
        if status == TxStatus::Success {
            // Cleared until the next allowance change re-evaluates it
            self.state.approval_needed = false;
        }
        self.derive_primary_action();
    }

    fn reset_reads(&mut self) {
        let state = &mut self.state;
        state.loan_state = Observed::Loading;
        state.loan_state_label = None;
        state.remaining_seconds = Observed::Loading;
        state.formatted_remaining_time = None;
        state.allowance = Observed::Loading;
        state.approval_pending = false;
        state.apy = Observed::Loading;
        state.apy_percent = None;
        state.claimable_interest = Observed::Loading;
        state.claimable_interest_display = None;
        state.claimable_rewards = Observed::Loading;
        state.claimable_rewards_display = None;
    }

    fn derive_from_row(&mut self) {
        self.state.collateral =
            calculator::calculate_collateral(self.row.amount, self.row.interest_rate);
        self.state.collateral_display =
            calculator::amount_to_f64(self.state.collateral, TOKEN_DECIMALS);
        self.state.loan_amount_display = format!(
            "{} {}",
            calculator::format_amount(self.row.amount, TOKEN_DECIMALS),
            self.row.token_symbol
        );
        self.state.repayment_period_days =
            calculator::repayment_period_days(self.row.repayment_period);
        self.state.borrower_short = calculator::short_address(&self.row.borrower.to_string());
        self.state.is_flash_loan = self.row.interest_model == InterestModel::FlashLoan;

        match self.row.funding_status {
            FundingStatus::Funded => self.state.is_funded = true,
            FundingStatus::Pending => self.state.is_funded = false,
            FundingStatus::Other => {}
        }
    }

    fn derive_is_lender(&mut self) {
        self.state.is_lender = self.account == Some(self.row.lender);
    }

    fn derive_approval_needed(&mut self) {
        let allowance = self
            .state
            .allowance
            .value()
            .copied()
            .unwrap_or(U256::ZERO);
        self.state.approval_needed = allowance < self.row.amount;
    }

    fn derive_primary_action(&mut self) {
        let unfunded = self.state.loan_state.value().copied() == Some(loan_state::PENDING);
        self.state.primary_action = if !unfunded {
            PrimaryAction::Manage
        } else if self.state.approval_needed {
            PrimaryAction::Approve {
                disabled: self.state.approval_pending,
            }
        } else {
            PrimaryAction::ActivateLoan
        };
    }
}
