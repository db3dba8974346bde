//! Lend Action Dispatch
//!
//! Checks an action's guard against the current view, builds its intent, and
//! hands it to the wallet. Submission does not wait for inclusion: the caller
//! gets the transaction hash back and feeds later status updates through
//! [`on_status`].

use alloy_primitives::TxHash;
use evm_client::ContractClient;
use serde::Serialize;
use tulia_core::constants::TOKEN_DECIMALS;
use tulia_core::{ApprovalConfig, ContractAddresses, TxError, TxStatus};

use crate::calculator;
use crate::guards;
use crate::notify::{Notice, Notifier};
use crate::state::LendAction;
use crate::tx_builder::{build_intent, TransactionIntent};
use crate::view::LendView;

/// What a dispatch did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DispatchOutcome {
    Submitted {
        action: LendAction,
        tx_hash: TxHash,
        intent: TransactionIntent,
    },
    /// The guard refused; nothing was sent
    Blocked {
        action: LendAction,
        code: &'static str,
        reason: String,
    },
}

/// Everything dispatch needs besides the view itself
pub struct DispatchContext<'a> {
    pub client: &'a dyn ContractClient,
    pub notifier: &'a dyn Notifier,
    pub contracts: &'a ContractAddresses,
    pub approval: &'a ApprovalConfig,
}

/// Dispatch `action` for the mounted view
pub async fn dispatch(
    ctx: &DispatchContext<'_>,
    view: &mut LendView,
    action: LendAction,
) -> Result<DispatchOutcome, TxError> {
    if let Err(violation) = guards::check(action, view.state()) {
        tracing::info!(pool = %view.row().pool, %action, code = violation.code(), "Action blocked");
        ctx.notifier.notify(Notice::error(violation.to_string()));
        return Ok(DispatchOutcome::Blocked {
            action,
            code: violation.code(),
            reason: violation.to_string(),
        });
    }

    let Some(account) = view.account() else {
        ctx.notifier.notify(Notice::error(TxError::NoAccount.to_string()));
        return Err(TxError::NoAccount);
    };

    let intent = build_intent(
        action,
        view.row(),
        ctx.contracts,
        ctx.approval,
        Some(account),
    )?;

    let tx_hash = match ctx.client.write_contract(account, &intent.to_call()).await {
        Ok(hash) => hash,
        Err(e) => {
            tracing::warn!(pool = %view.row().pool, %action, error = %e, "Submission failed");
            on_status(view, ctx.notifier, action, TxStatus::Error);
            return Err(TxError::SubmissionFailed {
                message: e.to_string(),
            });
        }
    };

    view.mark_submitted(action);
    on_status(view, ctx.notifier, action, TxStatus::Pending);
    if let Some(message) = claiming_message(action, view) {
        ctx.notifier.notify(Notice::info(message));
    }

    Ok(DispatchOutcome::Submitted {
        action,
        tx_hash,
        intent,
    })
}

/// Feed a status update for a submitted action into the view and notices
pub fn on_status(
    view: &mut LendView,
    notifier: &dyn Notifier,
    action: LendAction,
    status: TxStatus,
) {
    view.apply_tx_status(action, status);
    notifier.notify(status_notice(action, status));
}

/// Fixed notice for each action and status
pub fn status_notice(action: LendAction, status: TxStatus) -> Notice {
    let (pending, success, error) = match action {
        LendAction::Approve => (
            "Approve transaction pending",
            "Approve transaction successful",
            "Error approving token",
        ),
        LendAction::ActivateLoan => (
            "Loan activation pending",
            "Loan activated successfully",
            "Error activating loan",
        ),
        LendAction::ClaimInterest => (
            "Interest claim pending",
            "Interest claimed successfully",
            "Error claiming interest",
        ),
        LendAction::ClaimRewards => (
            "Reward claim pending",
            "Rewards claimed successfully",
            "Error claiming rewards",
        ),
        LendAction::DefaultLoan => (
            "Loan default pending",
            "Loan defaulted successfully",
            "Error defaulting loan",
        ),
        LendAction::CloseDeal => (
            "Close deal pending",
            "Loan deal closed successfully",
            "Error closing loan deal",
        ),
    };

    match status {
        TxStatus::Pending => Notice::info(pending),
        TxStatus::Success => Notice::success(success),
        TxStatus::Error => Notice::error(error),
    }
}

/// "Claiming {amount} {token}" for claim actions
fn claiming_message(action: LendAction, view: &LendView) -> Option<String> {
    let state = view.state();
    let amount = match action {
        LendAction::ClaimInterest => {
            let raw = state.claimable_interest.value().copied().unwrap_or_default();
            calculator::format_amount(raw, TOKEN_DECIMALS)
        }
        LendAction::ClaimRewards => {
            let raw = state.claimable_rewards.value().copied().unwrap_or_default();
            calculator::rewards_display(raw).to_string()
        }
        _ => return None,
    };
    Some(format!("Claiming {} {}", amount, view.row().borrow_token_name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{NoticeLevel, NoticeLog};
    use crate::state::PrimaryAction;
    use crate::test_support::{sample_row, MockClient};
    use alloy_primitives::{Address, U256};
    use tulia_core::RpcError;

    fn account() -> Address {
        Address::repeat_byte(0x22)
    }

    struct Harness {
        client: MockClient,
        notices: NoticeLog,
        contracts: ContractAddresses,
        approval: ApprovalConfig,
    }

    impl Harness {
        fn new(client: MockClient) -> Self {
            Self {
                client,
                notices: NoticeLog::new(),
                contracts: ContractAddresses::default(),
                approval: ApprovalConfig::default(),
            }
        }

        fn ctx(&self) -> DispatchContext<'_> {
            DispatchContext {
                client: &self.client,
                notifier: &self.notices,
                contracts: &self.contracts,
                approval: &self.approval,
            }
        }
    }

    fn mounted() -> LendView {
        LendView::mount(sample_row(), Some(account()))
    }

    #[tokio::test]
    async fn test_default_allowed_when_window_elapsed() {
        let harness = Harness::new(MockClient::new());
        let mut view = mounted();
        view.observe_remaining_seconds(Ok::<_, String>(0));

        let outcome = dispatch(&harness.ctx(), &mut view, LendAction::DefaultLoan)
            .await
            .unwrap();
        assert!(matches!(outcome, DispatchOutcome::Submitted { .. }));

        let writes = harness.client.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].0, account());
        assert_eq!(writes[0].1.function, "checkAndHandleDefault()");
        assert_eq!(writes[0].1.to, view.row().pool);
    }

    #[tokio::test]
    async fn test_default_not_sent_on_previous_pool_reads() {
        let harness = Harness::new(MockClient::new());
        let mut view = mounted();
        view.observe_loan_state(Ok::<_, String>(2));
        view.observe_remaining_seconds(Ok::<_, String>(0));

        let mut other = view.row().clone();
        other.pool = Address::repeat_byte(0xbb);
        view.set_row(other);

        let outcome = dispatch(&harness.ctx(), &mut view, LendAction::DefaultLoan)
            .await
            .unwrap();
        assert!(matches!(outcome, DispatchOutcome::Blocked { code: "state_loading", .. }));
        assert!(harness.client.writes().is_empty());
    }

    #[tokio::test]
    async fn test_default_blocked_while_window_open() {
        let harness = Harness::new(MockClient::new());
        let mut view = mounted();
        view.observe_remaining_seconds(Ok::<_, String>(120));

        let outcome = dispatch(&harness.ctx(), &mut view, LendAction::DefaultLoan)
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            DispatchOutcome::Blocked { code: "repayment_window_open", .. }
        ));
        assert!(harness.client.writes().is_empty());

        let notices = harness.notices.drain();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
        assert!(notices[0].message.contains("0d 0h 2m"));
    }

    #[tokio::test]
    async fn test_close_guard() {
        let harness = Harness::new(MockClient::new());
        let mut view = mounted();

        view.observe_loan_state(Ok::<_, String>(2));
        let outcome = dispatch(&harness.ctx(), &mut view, LendAction::CloseDeal)
            .await
            .unwrap();
        assert!(matches!(outcome, DispatchOutcome::Blocked { .. }));
        assert!(harness.client.writes().is_empty());

        view.observe_loan_state(Ok::<_, String>(1));
        let outcome = dispatch(&harness.ctx(), &mut view, LendAction::CloseDeal)
            .await
            .unwrap();
        assert!(matches!(outcome, DispatchOutcome::Submitted { .. }));
        assert_eq!(harness.client.writes().len(), 1);
    }

    #[tokio::test]
    async fn test_claim_interest_waits_for_borrower() {
        let harness = Harness::new(MockClient::new());
        let mut view = mounted();
        view.observe_loan_state(Ok::<_, String>(1));

        let outcome = dispatch(&harness.ctx(), &mut view, LendAction::ClaimInterest)
            .await
            .unwrap();
        assert!(matches!(outcome, DispatchOutcome::Blocked { .. }));
        // Blocked claims do not announce an amount
        let notices = harness.notices.drain();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].message, "Waiting for borrower to give interest");
    }

    #[tokio::test]
    async fn test_claim_interest_announces_amount() {
        let harness = Harness::new(MockClient::new());
        let mut view = mounted();
        view.observe_loan_state(Ok::<_, String>(2));
        view.observe_claimable_interest(Ok::<_, String>(U256::from(
            1_500_000_000_000_000_000u64,
        )));

        dispatch(&harness.ctx(), &mut view, LendAction::ClaimInterest)
            .await
            .unwrap();

        let writes = harness.client.writes();
        assert_eq!(writes[0].1.to, harness.contracts.vault_manager);

        let notices = harness.notices.drain();
        assert_eq!(notices[0], Notice::info("Interest claim pending"));
        assert_eq!(notices[1], Notice::info("Claiming 1.5 USDT"));
    }

    #[tokio::test]
    async fn test_claim_rewards_requires_rewards() {
        let harness = Harness::new(MockClient::new());
        let mut view = mounted();
        view.observe_claimable_rewards(Ok::<_, String>(U256::ZERO));

        let outcome = dispatch(&harness.ctx(), &mut view, LendAction::ClaimRewards)
            .await
            .unwrap();
        assert!(matches!(outcome, DispatchOutcome::Blocked { code: "no_rewards", .. }));

        view.observe_claimable_rewards(Ok::<_, String>(U256::from(25_000_000u64)));
        dispatch(&harness.ctx(), &mut view, LendAction::ClaimRewards)
            .await
            .unwrap();
        let notices = harness.notices.drain();
        assert_eq!(notices.last().unwrap().message, "Claiming 2.5 USDT");
    }

    #[tokio::test]
    async fn test_guard_blocks_while_read_loading() {
        let harness = Harness::new(MockClient::new());
        let mut view = mounted();
        let outcome = dispatch(&harness.ctx(), &mut view, LendAction::CloseDeal)
            .await
            .unwrap();
        assert!(matches!(outcome, DispatchOutcome::Blocked { code: "state_loading", .. }));
    }

    #[tokio::test]
    async fn test_activation_gated_on_approval() {
        let harness = Harness::new(MockClient::new());
        let mut row = sample_row();
        row.amount = U256::from(1000u64);
        let mut view = LendView::mount(row, Some(account()));
        view.observe_loan_state(Ok::<_, String>(0));

        view.observe_allowance(Ok::<_, String>(U256::from(500u64)));
        let outcome = dispatch(&harness.ctx(), &mut view, LendAction::ActivateLoan)
            .await
            .unwrap();
        assert!(matches!(outcome, DispatchOutcome::Blocked { code: "approval_required", .. }));

        view.observe_allowance(Ok::<_, String>(U256::from(1000u64)));
        let outcome = dispatch(&harness.ctx(), &mut view, LendAction::ActivateLoan)
            .await
            .unwrap();
        assert!(matches!(outcome, DispatchOutcome::Submitted { .. }));
        assert_eq!(harness.client.writes()[0].1.function, "fundLoan()");
    }

    #[tokio::test]
    async fn test_approve_lifecycle() {
        let harness = Harness::new(MockClient::new());
        let mut view = mounted();
        view.observe_loan_state(Ok::<_, String>(0));
        view.observe_allowance(Ok::<_, String>(U256::ZERO));

        dispatch(&harness.ctx(), &mut view, LendAction::Approve)
            .await
            .unwrap();
        assert_eq!(
            view.state().primary_action,
            PrimaryAction::Approve { disabled: true }
        );

        on_status(&mut view, &harness.notices, LendAction::Approve, TxStatus::Success);
        assert_eq!(view.state().primary_action, PrimaryAction::ActivateLoan);
        let notices = harness.notices.drain();
        assert_eq!(notices.last().unwrap(), &Notice::success("Approve transaction successful"));
    }

    #[tokio::test]
    async fn test_no_account_is_error() {
        let harness = Harness::new(MockClient::new());
        let mut view = LendView::mount(sample_row(), None);
        view.observe_remaining_seconds(Ok::<_, String>(0));

        let err = dispatch(&harness.ctx(), &mut view, LendAction::DefaultLoan)
            .await
            .unwrap_err();
        assert!(matches!(err, TxError::NoAccount));
        assert!(harness.client.writes().is_empty());
    }

    #[tokio::test]
    async fn test_submission_failure_reports_error() {
        let client = MockClient::new().with_write_error(RpcError::Rpc {
            code: -32000,
            message: "user rejected".into(),
        });
        let harness = Harness::new(client);
        let mut view = mounted();
        view.observe_loan_state(Ok::<_, String>(0));

        let err = dispatch(&harness.ctx(), &mut view, LendAction::CloseDeal)
            .await
            .unwrap_err();
        assert!(matches!(err, TxError::SubmissionFailed { .. }));
        assert_eq!(
            harness.notices.drain(),
            vec![Notice::error("Error closing loan deal")]
        );
    }

    #[test]
    fn test_activation_notices() {
        assert_eq!(
            status_notice(LendAction::ActivateLoan, TxStatus::Pending),
            Notice::info("Loan activation pending")
        );
        assert_eq!(
            status_notice(LendAction::ActivateLoan, TxStatus::Success),
            Notice::success("Loan activated successfully")
        );
        assert_eq!(
            status_notice(LendAction::ActivateLoan, TxStatus::Error),
            Notice::error("Error activating loan")
        );
    }
}
