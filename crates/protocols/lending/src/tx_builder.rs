//! Tulia Lend Transaction Builder
//!
//! Turns a lend action into a `TransactionIntent`: the target contract, the
//! function and its arguments, and the encoded calldata handed to the wallet.
//!
//! | Action         | Contract        | Function                          |
//! |----------------|-----------------|-----------------------------------|
//! | approve        | loan currency   | approve(pool, amount)             |
//! | activate_loan  | pool            | fundLoan()                        |
//! | claim_interest | vault manager   | distributeInterest(pool, account) |
//! | claim_rewards  | reward manager  | claimRewards(pool, true)          |
//! | default_loan   | pool            | checkAndHandleDefault()           |
//! | close_deal     | pool            | reclaimLoanAndClosePool()         |

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::SolCall;
use evm_client::ContractCall;
use serde::Serialize;
use tulia_core::constants::WEI_PER_TOKEN;
use tulia_core::{ApprovalConfig, ApprovalPolicy, ContractAddresses, TxError};

use crate::abi::{RewardManager, Token, TuliaPool, VaultManager};
use crate::state::{LendAction, LoanRow};

/// Which contract interface the intent targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AbiRef {
    TuliaPool,
    Token,
    VaultManager,
    RewardManager,
}

/// A decoded call argument, kept alongside the calldata for display
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum IntentArg {
    Address(Address),
    Uint(U256),
    Bool(bool),
}

/// A write transaction ready for the wallet
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransactionIntent {
    pub action: LendAction,
    pub contract: Address,
    pub abi: AbiRef,
    pub function: &'static str,
    pub args: Vec<IntentArg>,
    pub calldata: Bytes,
}

impl TransactionIntent {
    fn new<C: SolCall>(
        action: LendAction,
        contract: Address,
        abi: AbiRef,
        call: C,
        args: Vec<IntentArg>,
    ) -> Self {
        Self {
            action,
            contract,
            abi,
            function: C::SIGNATURE,
            args,
            calldata: call.abi_encode().into(),
        }
    }

    pub fn to_call(&self) -> ContractCall {
        ContractCall::new(self.contract, self.calldata.clone(), self.function)
    }
}

/// Allowance to request when approving the pool.
///
/// The fixed policy may grant more than the loan needs; that is logged.
pub fn approval_amount(config: &ApprovalConfig, loan_amount: U256) -> U256 {
    match config.policy {
        ApprovalPolicy::Exact => loan_amount,
        ApprovalPolicy::Fixed => {
            let amount =
                U256::from(config.fixed_amount_tokens).saturating_mul(WEI_PER_TOKEN);
            if amount > loan_amount {
                tracing::warn!(
                    %amount,
                    %loan_amount,
                    "Approval exceeds the loan amount"
                );
            } else if amount < loan_amount {
                tracing::warn!(
                    %amount,
                    %loan_amount,
                    "Fixed approval is below the loan amount, activation will stay blocked"
                );
            }
            amount
        }
    }
}

pub fn build_approve(row: &LoanRow, approval: &ApprovalConfig) -> TransactionIntent {
    let amount = approval_amount(approval, row.amount);
    TransactionIntent::new(
        LendAction::Approve,
        row.loan_currency_address,
        AbiRef::Token,
        Token::approveCall {
            spender: row.pool,
            amount,
        },
        vec![IntentArg::Address(row.pool), IntentArg::Uint(amount)],
    )
}

pub fn build_activate_loan(row: &LoanRow) -> TransactionIntent {
    TransactionIntent::new(
        LendAction::ActivateLoan,
        row.pool,
        AbiRef::TuliaPool,
        TuliaPool::fundLoanCall {},
        Vec::new(),
    )
}

/// Interest is distributed to the connected account
pub fn build_claim_interest(
    row: &LoanRow,
    contracts: &ContractAddresses,
    account: Address,
) -> TransactionIntent {
    TransactionIntent::new(
        LendAction::ClaimInterest,
        contracts.vault_manager,
        AbiRef::VaultManager,
        VaultManager::distributeInterestCall {
            pool: row.pool,
            lender: account,
        },
        vec![IntentArg::Address(row.pool), IntentArg::Address(account)],
    )
}

pub fn build_claim_rewards(row: &LoanRow, contracts: &ContractAddresses) -> TransactionIntent {
    TransactionIntent::new(
        LendAction::ClaimRewards,
        contracts.reward_manager,
        AbiRef::RewardManager,
        RewardManager::claimRewardsCall {
            pool: row.pool,
            isLender: true,
        },
        vec![IntentArg::Address(row.pool), IntentArg::Bool(true)],
    )
}

pub fn build_default_loan(row: &LoanRow) -> TransactionIntent {
    TransactionIntent::new(
        LendAction::DefaultLoan,
        row.pool,
        AbiRef::TuliaPool,
        TuliaPool::checkAndHandleDefaultCall {},
        Vec::new(),
    )
}

pub fn build_close_deal(row: &LoanRow) -> TransactionIntent {
    TransactionIntent::new(
        LendAction::CloseDeal,
        row.pool,
        AbiRef::TuliaPool,
        TuliaPool::reclaimLoanAndClosePoolCall {},
        Vec::new(),
    )
}

/// Build the intent for any action
pub fn build_intent(
    action: LendAction,
    row: &LoanRow,
    contracts: &ContractAddresses,
    approval: &ApprovalConfig,
    account: Option<Address>,
) -> Result<TransactionIntent, TxError> {
    let intent = match action {
        LendAction::Approve => build_approve(row, approval),
        LendAction::ActivateLoan => build_activate_loan(row),
        LendAction::ClaimInterest => {
            build_claim_interest(row, contracts, account.ok_or(TxError::NoAccount)?)
        }
        LendAction::ClaimRewards => build_claim_rewards(row, contracts),
        LendAction::DefaultLoan => build_default_loan(row),
        LendAction::CloseDeal => build_close_deal(row),
    };
    Ok(intent)
}
