//! Core type definitions for Tulia

use std::fmt;

use serde::{Deserialize, Serialize};

pub use alloy_primitives::{Address, Bytes, TxHash, U256};

/// Block number
pub type BlockNumber = u64;

/// Chain ID (EIP-155)
pub type ChainId = u64;

/// Amount in the smallest unit of an 18-decimal token
pub type Wei = U256;

/// Outcome of a submitted transaction as reported by the wallet client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Pending,
    Success,
    Error,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Success => "success",
            Self::Error => "error",
        }
    }

    /// Whether the transaction has left the pending state
    pub fn is_final(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Constants
pub mod constants {
    use super::Wei;

    /// Decimals of the tokens Tulia pools are denominated in
    pub const TOKEN_DECIMALS: u8 = 18;

    /// 1 token in wei
    pub const WEI_PER_TOKEN: Wei = Wei::from_limbs([1_000_000_000_000_000_000, 0, 0, 0]);

    pub const SECONDS_PER_MINUTE: u64 = 60;
    pub const SECONDS_PER_HOUR: u64 = 3_600;
    pub const SECONDS_PER_DAY: u64 = 86_400;
}
