//! Lend View Reads
//!
//! Reads the ledger values the lend view derives from. Each read is
//! independent: one failing does not stop the others, and the view keeps
//! the last good value for the failed one.

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolCall;
use evm_client::{ContractCall, ContractClient};
use tulia_core::{ContractAddresses, Error, ProtocolError};

use crate::abi::{RewardManager, Token, TuliaPool, VaultManager};
use crate::state::LoanRow;

pub type ReadResult<T> = Result<T, Error>;

/// One refresh worth of reads for a pool
#[derive(Debug)]
pub struct LendReads {
    pub loan_state: ReadResult<u8>,
    pub remaining_seconds: ReadResult<u64>,
    /// `None` when no account is connected
    pub allowance: Option<ReadResult<U256>>,
    pub claimable_interest: ReadResult<U256>,
    pub claimable_rewards: ReadResult<U256>,
    pub reward_apy: ReadResult<U256>,
}

/// Execute a view call and decode its return
pub async fn read_call<C: SolCall>(
    client: &dyn ContractClient,
    to: Address,
    call: C,
) -> ReadResult<C::Return> {
    let request = ContractCall::new(to, call.abi_encode(), C::SIGNATURE);
    let data = client.read_contract(&request).await?;
    C::abi_decode_returns(&data, true).map_err(|e| {
        ProtocolError::DecodeFailed {
            function: C::SIGNATURE.to_string(),
            message: e.to_string(),
        }
        .into()
    })
}

pub async fn fetch_loan_state(client: &dyn ContractClient, pool: Address) -> ReadResult<u8> {
    let ret = read_call(client, pool, TuliaPool::getLoanStateCall {}).await?;
    Ok(ret.state)
}

/// Seconds left in the repayment window, saturated to `u64`
pub async fn fetch_remaining_seconds(
    client: &dyn ContractClient,
    pool: Address,
) -> ReadResult<u64> {
    let ret = read_call(client, pool, TuliaPool::getRemainingRepaymentPeriodCall {}).await?;
    Ok(u64::try_from(ret.remaining).unwrap_or(u64::MAX))
}

/// Allowance `owner` granted the pool on the loan currency
pub async fn fetch_allowance(
    client: &dyn ContractClient,
    row: &LoanRow,
    owner: Address,
) -> ReadResult<U256> {
    let ret = read_call(
        client,
        row.loan_currency_address,
        Token::allowanceCall {
            owner,
            spender: row.pool,
        },
    )
    .await?;
    Ok(ret.remaining)
}

pub async fn fetch_claimable_interest(
    client: &dyn ContractClient,
    contracts: &ContractAddresses,
    pool: Address,
) -> ReadResult<U256> {
    let ret = read_call(
        client,
        contracts.vault_manager,
        VaultManager::calculateClaimableInterestCall { pool },
    )
    .await?;
    Ok(ret.interest)
}

/// Lender-side rewards accrued in the reward manager
pub async fn fetch_claimable_rewards(
    client: &dyn ContractClient,
    contracts: &ContractAddresses,
    pool: Address,
) -> ReadResult<U256> {
    let ret = read_call(
        client,
        contracts.reward_manager,
        RewardManager::calculateClaimableInterestCall {
            pool,
            isLender: true,
        },
    )
    .await?;
    Ok(ret.interest)
}

/// Reward APY for the loan amount over its repayment period
pub async fn fetch_reward_apy(
    client: &dyn ContractClient,
    contracts: &ContractAddresses,
    row: &LoanRow,
) -> ReadResult<U256> {
    let ret = read_call(
        client,
        contracts.reward_manager,
        RewardManager::calculateRewardAPYCall {
            loanAmount: row.amount,
            durationSeconds: U256::from(row.repayment_period),
        },
    )
    .await?;
    Ok(ret.apy)
}

/// Issue every read for `row` concurrently
pub async fn fetch_reads(
    client: &dyn ContractClient,
    row: &LoanRow,
    account: Option<Address>,
    contracts: &ContractAddresses,
) -> LendReads {
    let allowance = async {
        match account {
            Some(owner) => Some(fetch_allowance(client, row, owner).await),
            None => None,
        }
    };

    let (
        loan_state,
        remaining_seconds,
        allowance,
        claimable_interest,
        claimable_rewards,
        reward_apy,
    ) = tokio::join!(
        fetch_loan_state(client, row.pool),
        fetch_remaining_seconds(client, row.pool),
        allowance,
        fetch_claimable_interest(client, contracts, row.pool),
        fetch_claimable_rewards(client, contracts, row.pool),
        fetch_reward_apy(client, contracts, row),
    );

    for (field, failed) in [
        ("loan_state", loan_state.is_err()),
        ("remaining_seconds", remaining_seconds.is_err()),
        ("allowance", matches!(allowance, Some(Err(_)))),
        ("claimable_interest", claimable_interest.is_err()),
        ("claimable_rewards", claimable_rewards.is_err()),
        ("reward_apy", reward_apy.is_err()),
    ] {
        if failed {
            tracing::warn!(pool = %row.pool, field, "Lend view read failed");
        }
    }

    LendReads {
        loan_state,
        remaining_seconds,
        allowance,
        claimable_interest,
        claimable_rewards,
        reward_apy,
    }
}
