//! Fixtures shared by the unit tests

use std::collections::HashMap;
use std::sync::Mutex;

use alloy_primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use evm_client::{ContractCall, ContractClient};
use lending::{FundingStatus, InterestModel, LoanRow};
use tulia_core::{RpcError, TxStatus};

pub fn sample_row() -> LoanRow {
    LoanRow {
        pool: Address::repeat_byte(0x11),
        lender: Address::repeat_byte(0x22),
        borrower: Address::ZERO,
        amount: U256::from(1000u64) * tulia_core::constants::WEI_PER_TOKEN,
        interest_rate: 10.0,
        repayment_period: 30 * 86_400,
        interest_model: InterestModel::FlashLoan,
        loan_currency_address: Address::repeat_byte(0x33),
        token_symbol: "USDT".to_string(),
        borrow_token_name: "USDT".to_string(),
        funding_status: FundingStatus::Pending,
    }
}

/// Scripted contract client keyed by function signature
#[derive(Default)]
pub struct MockClient {
    reads: Mutex<HashMap<&'static str, Bytes>>,
    statuses: Mutex<HashMap<TxHash, TxStatus>>,
    writes: Mutex<Vec<(Address, ContractCall)>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_read(&self, function: &'static str, value: U256) {
        self.reads
            .lock()
            .unwrap()
            .insert(function, value.to_be_bytes::<32>().to_vec().into());
    }

    pub fn set_status(&self, tx_hash: TxHash, status: TxStatus) {
        self.statuses.lock().unwrap().insert(tx_hash, status);
    }

    pub fn writes(&self) -> Vec<(Address, ContractCall)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContractClient for MockClient {
    async fn read_contract(&self, call: &ContractCall) -> Result<Bytes, RpcError> {
        self.reads
            .lock()
            .unwrap()
            .get(call.function)
            .cloned()
            .ok_or_else(|| RpcError::ApiError {
                message: format!("no scripted read for {}", call.function),
            })
    }

    async fn write_contract(
        &self,
        from: Address,
        call: &ContractCall,
    ) -> Result<TxHash, RpcError> {
        let mut writes = self.writes.lock().unwrap();
        writes.push((from, call.clone()));
        Ok(TxHash::with_last_byte(writes.len() as u8))
    }

    async fn transaction_status(&self, tx_hash: TxHash) -> Result<TxStatus, RpcError> {
        Ok(self
            .statuses
            .lock()
            .unwrap()
            .get(&tx_hash)
            .copied()
            .unwrap_or(TxStatus::Pending))
    }
}
