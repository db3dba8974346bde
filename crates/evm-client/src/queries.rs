//! JSON-RPC envelope types and response decoding helpers

use alloy_primitives::{Address, Bytes, TxHash};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tulia_core::{RpcError, TxStatus};

use crate::Result;

/// Outgoing JSON-RPC 2.0 request
#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

/// Error object inside a JSON-RPC response
#[derive(Debug, Clone, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Incoming JSON-RPC 2.0 response.
///
/// `result` is kept as a raw value because `null` is meaningful for some
/// methods (a receipt that does not exist yet).
#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Value,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

impl RpcResponse {
    pub fn into_result(self) -> Result<Value> {
        match self.error {
            Some(err) => {
                // Revert reasons come back in `data` on most clients
                let message = match err.data {
                    Some(Value::String(data)) => format!("{} ({})", err.message, data),
                    _ => err.message,
                };
                Err(RpcError::Rpc {
                    code: err.code,
                    message,
                })
            }
            None => Ok(self.result),
        }
    }
}

/// Call object for `eth_call` / `eth_sendTransaction`
#[derive(Debug, Clone, Serialize)]
pub struct CallObject {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from: Option<Address>,
    pub to: Address,
    pub data: Bytes,
}

/// Parse a hex quantity ("0x1a") into a u64
pub fn parse_quantity(value: &Value) -> Result<u64> {
    let raw = value
        .as_str()
        .ok_or_else(|| RpcError::ParseError(format!("Expected hex quantity, got {}", value)))?;
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    if digits.is_empty() {
        return Ok(0);
    }
    u64::from_str_radix(digits, 16)
        .map_err(|e| RpcError::ParseError(format!("Invalid quantity {}: {}", raw, e)))
}

/// Parse `eth_call` return data
pub fn parse_bytes(value: Value) -> Result<Bytes> {
    serde_json::from_value(value).map_err(|e| RpcError::ParseError(format!("Invalid bytes: {}", e)))
}

/// Parse a transaction hash
pub fn parse_tx_hash(value: Value) -> Result<TxHash> {
    serde_json::from_value(value)
        .map_err(|e| RpcError::ParseError(format!("Invalid transaction hash: {}", e)))
}

/// Map an `eth_getTransactionReceipt` result onto a transaction status.
///
/// A missing receipt means the transaction is still in the mempool.
pub fn receipt_status(receipt: &Value) -> Result<TxStatus> {
    if receipt.is_null() {
        return Ok(TxStatus::Pending);
    }
    match receipt.get("status") {
        Some(status) => match parse_quantity(status)? {
            1 => Ok(TxStatus::Success),
            _ => Ok(TxStatus::Error),
        },
        // Pre-Byzantium receipts carry no status; treat inclusion as success
        None => Ok(TxStatus::Success),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity(&json!("0x1a")).unwrap(), 26);
        assert_eq!(parse_quantity(&json!("0x")).unwrap(), 0);
        assert!(parse_quantity(&json!(26)).is_err());
        assert!(parse_quantity(&json!("0xzz")).is_err());
    }

    #[test]
    fn test_receipt_status() {
        assert_eq!(receipt_status(&Value::Null).unwrap(), TxStatus::Pending);
        assert_eq!(
            receipt_status(&json!({ "status": "0x1" })).unwrap(),
            TxStatus::Success
        );
        assert_eq!(
            receipt_status(&json!({ "status": "0x0" })).unwrap(),
            TxStatus::Error
        );
    }

    #[test]
    fn test_error_response_carries_revert_data() {
        let response: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": 3, "message": "execution reverted", "data": "0x08c379a0" }
        }))
        .unwrap();
        match response.into_result() {
            Err(RpcError::Rpc { code, message }) => {
                assert_eq!(code, 3);
                assert_eq!(message, "execution reverted (0x08c379a0)");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_null_result_is_ok() {
        let response: RpcResponse =
            serde_json::from_value(json!({ "jsonrpc": "2.0", "id": 7, "result": null })).unwrap();
        assert!(response.into_result().unwrap().is_null());
    }

    #[test]
    fn test_call_object_omits_missing_from() {
        let call = CallObject {
            from: None,
            to: Address::ZERO,
            data: Bytes::from(vec![0xab, 0xcd]),
        };
        let json = serde_json::to_value(&call).unwrap();
        assert!(json.get("from").is_none());
        assert_eq!(json["data"], "0xabcd");
    }
}
