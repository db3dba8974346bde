//! Fixtures shared by the unit tests

use std::collections::HashMap;
use std::sync::Mutex;

use alloy_primitives::{Address, Bytes, TxHash, U256};
use async_trait::async_trait;
use evm_client::{ContractCall, ContractClient};
use tulia_core::{RpcError, TxStatus};

use crate::state::{FundingStatus, InterestModel, LoanRow};

/// 1000 tokens at 10% over 30 days, no borrower yet
pub fn sample_row() -> LoanRow {
    LoanRow {
        pool: Address::repeat_byte(0x11),
        lender: Address::repeat_byte(0x22),
        borrower: Address::repeat_byte(0xab),
        amount: U256::from(1000u64) * tulia_core::constants::WEI_PER_TOKEN,
        interest_rate: 10.0,
        repayment_period: 30 * 86_400,
        interest_model: InterestModel::Simple,
        loan_currency_address: Address::repeat_byte(0x33),
        token_symbol: "USDT".to_string(),
        borrow_token_name: "USDT".to_string(),
        funding_status: FundingStatus::Pending,
    }
}

/// A single ABI word holding `value`
pub fn word(value: u64) -> Bytes {
    U256::from(value).to_be_bytes::<32>().to_vec().into()
}

/// Scripted contract client: reads answer by (target, selector), writes are recorded
#[derive(Default)]
pub struct MockClient {
    reads: HashMap<(Address, [u8; 4]), Result<Bytes, RpcError>>,
    write_error: Option<RpcError>,
    writes: Mutex<Vec<(Address, ContractCall)>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_read(
        mut self,
        to: Address,
        selector: [u8; 4],
        result: Result<Bytes, RpcError>,
    ) -> Self {
        self.reads.insert((to, selector), result);
        self
    }

    pub fn with_write_error(mut self, err: RpcError) -> Self {
        self.write_error = Some(err);
        self
    }

    pub fn writes(&self) -> Vec<(Address, ContractCall)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContractClient for MockClient {
    async fn read_contract(&self, call: &ContractCall) -> Result<Bytes, RpcError> {
        let mut selector = [0u8; 4];
        selector.copy_from_slice(&call.data[..4]);
        self.reads
            .get(&(call.to, selector))
            .cloned()
            .unwrap_or_else(|| {
                Err(RpcError::ApiError {
                    message: format!("no scripted read for {}", call.function),
                })
            })
    }

    async fn write_contract(
        &self,
        from: Address,
        call: &ContractCall,
    ) -> Result<TxHash, RpcError> {
        if let Some(err) = &self.write_error {
            return Err(err.clone());
        }
        let mut writes = self.writes.lock().unwrap();
        writes.push((from, call.clone()));
        Ok(TxHash::with_last_byte(writes.len() as u8))
    }

    async fn transaction_status(&self, _tx_hash: TxHash) -> Result<TxStatus, RpcError> {
        Ok(TxStatus::Pending)
    }
}
