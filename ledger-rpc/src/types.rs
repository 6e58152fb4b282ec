//! JSON-RPC envelope and method payloads

use crate::RpcError;
use chrono::{DateTime, SecondsFormat};
use ledger_core::{Address, Block, Transaction};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Protocol version carried by every envelope
pub const JSONRPC_VERSION: &str = "2.0";

/// Incoming JSON-RPC call
#[derive(Debug, Clone, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
    #[serde(default)]
    pub id: Value,
}

/// Outgoing JSON-RPC reply, carrying either a result or an error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcErrorObject>,
    pub id: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

impl RpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    pub fn failure(id: Value, error: &RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(RpcErrorObject {
                code: error.code(),
                message: error.to_string(),
            }),
            id,
        }
    }
}

/// Transaction as submitted by clients; the nonce defaults to 0
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionInput {
    pub from: String,
    pub to: String,
    pub value: u64,
    #[serde(default)]
    pub nonce: u64,
}

impl From<TransactionInput> for Transaction {
    fn from(input: TransactionInput) -> Self {
        Transaction::new(
            Address::from(input.from),
            Address::from(input.to),
            input.nonce,
            input.value,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddBlockArgs {
    pub transactions: Vec<TransactionInput>,
}

/// Height and hash of an appended block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockReceipt {
    pub block_height: u64,
    pub block_hash: String,
}

impl From<&Block> for BlockReceipt {
    fn from(block: &Block) -> Self {
        Self {
            block_height: block.height as u64,
            block_hash: block.hash().to_hex(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShowChainResult {
    pub chain_head: String,
    pub chain_height: u64,
    pub blocks: Vec<ChainBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainBlock {
    pub height: u64,
    pub nonce: u64,
    /// Header timestamp in RFC 3339
    pub timestamp: String,
    pub block_hash: String,
    pub prev_block_hash: String,
    pub txn_count: usize,
    pub transactions: Vec<BlockTransaction>,
}

impl From<&Block> for ChainBlock {
    fn from(block: &Block) -> Self {
        let timestamp = DateTime::from_timestamp(block.header.timestamp, 0)
            .map(|time| time.to_rfc3339_opts(SecondsFormat::Secs, true))
            .unwrap_or_default();

        Self {
            height: block.height as u64,
            nonce: block.header.nonce as u64,
            timestamp,
            block_hash: block.hash().to_hex(),
            prev_block_hash: block.priori().to_hex(),
            txn_count: block.txn_count(),
            transactions: block.transactions.iter().map(BlockTransaction::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockTransaction {
    pub from: String,
    pub to: String,
    pub value: u64,
    pub nonce: u64,
}

impl From<&Transaction> for BlockTransaction {
    fn from(txn: &Transaction) -> Self {
        Self {
            from: txn.from.to_string(),
            to: txn.to.to_string(),
            value: txn.value,
            nonce: txn.nonce,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitTransactionResult {
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStatus {
    pub active: usize,
    pub pending: usize,
    pub senders: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults() {
        let request: RpcRequest =
            serde_json::from_value(json!({"method": "show_chain"})).unwrap();
        assert_eq!(request.method, "show_chain");
        assert!(request.params.is_null());
        assert!(request.id.is_null());
    }

    #[test]
    fn test_failure_envelope() {
        let error = RpcError::MethodNotFound("frobnicate".to_string());
        let value = serde_json::to_value(RpcResponse::failure(json!(7), &error)).unwrap();

        assert_eq!(value["jsonrpc"], "2.0");
        assert_eq!(value["id"], 7);
        assert_eq!(value["error"]["code"], -32601);
        assert!(value.get("result").is_none());
    }

    #[test]
    fn test_transaction_input_nonce_defaults_to_zero() {
        let input: TransactionInput =
            serde_json::from_value(json!({"from": "alice", "to": "bob", "value": 5})).unwrap();
        let txn = Transaction::from(input);
        assert_eq!(txn.nonce, 0);
        assert_eq!(txn.from, Address::from("alice"));
        assert_eq!(txn.value, 5);
    }

    #[test]
    fn test_chain_block_view() {
        let genesis = Block::genesis().unwrap();
        let view = ChainBlock::from(&genesis);

        assert_eq!(view.height, 0);
        assert_eq!(view.txn_count, 1);
        assert_eq!(view.block_hash, genesis.hash().to_hex());
        assert_eq!(view.prev_block_hash, format!("0x{}", "0".repeat(64)));
        assert!(view.timestamp.ends_with('Z'));
        assert_eq!(view.transactions[0].from, "miner");
    }
}
