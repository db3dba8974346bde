//! Action guards
//!
//! Named predicates deciding whether an action may be submitted, and the
//! violation reported to the user when it may not.

use alloy_primitives::U256;
use thiserror::Error;

use crate::calculator::format_duration;
use crate::constants::loan_state;
use crate::state::{LendAction, ViewState};

/// Why an action was refused before submission
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardViolation {
    #[error("Token approval is required before activating the loan.")]
    ApprovalRequired,

    #[error("Waiting for borrower to give interest")]
    NoBorrowerYet,

    #[error("No rewards available to claim.")]
    NoRewards,

    #[error("There is still {remaining} remaining before you can default the loan.")]
    RepaymentWindowOpen { remaining: String },

    #[error("Loan is not in a state to be closed.")]
    NotClosable,

    /// The read the guard depends on has not succeeded yet
    #[error("{field} is still loading, try again shortly.")]
    Unknown { field: &'static str },
}

impl GuardViolation {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ApprovalRequired => "approval_required",
            Self::NoBorrowerYet => "no_borrower_yet",
            Self::NoRewards => "no_rewards",
            Self::RepaymentWindowOpen { .. } => "repayment_window_open",
            Self::NotClosable => "not_closable",
            Self::Unknown { .. } => "state_loading",
        }
    }
}

pub fn can_activate(approval_needed: bool) -> bool {
    !approval_needed
}

/// Interest only accrues once a borrower has taken the loan
pub fn can_claim_interest(loan_state: u8) -> bool {
    loan_state > loan_state::WAITING_FOR_BORROWER
}

pub fn can_claim_rewards(claimable_rewards: U256) -> bool {
    !claimable_rewards.is_zero()
}

/// A loan can be defaulted only once its repayment window has elapsed
pub fn can_default(remaining_seconds: u64) -> bool {
    remaining_seconds == 0
}

/// A pool can be closed only before a borrower takes it
pub fn can_close(loan_state: u8) -> bool {
    loan_state <= loan_state::WAITING_FOR_BORROWER
}

/// Check the guard for `action` against the current view state
pub fn check(action: LendAction, view: &ViewState) -> Result<(), GuardViolation> {
    match action {
        LendAction::Approve => Ok(()),
        LendAction::ActivateLoan => {
            if can_activate(view.approval_needed) {
                Ok(())
            } else {
                Err(GuardViolation::ApprovalRequired)
            }
        }
        LendAction::ClaimInterest => {
            let state = *view.loan_state.value().ok_or(GuardViolation::Unknown {
                field: "Loan state",
            })?;
            if can_claim_interest(state) {
                Ok(())
            } else {
                Err(GuardViolation::NoBorrowerYet)
            }
        }
        LendAction::ClaimRewards => {
            let rewards = *view
                .claimable_rewards
                .value()
                .ok_or(GuardViolation::Unknown {
                    field: "Claimable rewards",
                })?;
            if can_claim_rewards(rewards) {
                Ok(())
            } else {
                Err(GuardViolation::NoRewards)
            }
        }
        LendAction::DefaultLoan => {
            let remaining = *view
                .remaining_seconds
                .value()
                .ok_or(GuardViolation::Unknown {
                    field: "Remaining repayment time",
                })?;
            if can_default(remaining) {
                Ok(())
            } else {
                Err(GuardViolation::RepaymentWindowOpen {
                    remaining: format_duration(remaining),
                })
            }
        }
        LendAction::CloseDeal => {
            let state = *view.loan_state.value().ok_or(GuardViolation::Unknown {
                field: "Loan state",
            })?;
            if can_close(state) {
                Ok(())
            } else {
                Err(GuardViolation::NotClosable)
            }
        }
    }
}
