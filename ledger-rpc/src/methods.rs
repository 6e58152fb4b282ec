//! JSON-RPC method handlers

use crate::types::{
    AddBlockArgs, BlockReceipt, ChainBlock, PoolStatus, ShowChainResult,
    SubmitTransactionResult, TransactionInput,
};
use crate::{ApiState, RpcError, RpcResult};
use ledger_core::Transaction;
use ledger_txpool::TxnPool;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

/// Route a call to its handler and encode the result
pub async fn dispatch(state: &ApiState, method: &str, params: Value) -> RpcResult<Value> {
    debug!(method, "RPC call");

    match method {
        "add_block" | "API.AddBlock" => to_value(add_block(state, parse_params(params)?).await?),
        "show_chain" | "API.ShowChain" => to_value(show_chain(state).await?),
        "submit_transaction" => to_value(submit_transaction(state, parse_params(params)?)),
        "mine_block" => to_value(mine_block(state).await?),
        "pool_status" => to_value(pool_status(state)),
        other => Err(RpcError::MethodNotFound(other.to_string())),
    }
}

/// Decode method params, accepting a bare object or a one-element array
fn parse_params<T: DeserializeOwned>(params: Value) -> RpcResult<T> {
    let params = match params {
        Value::Array(mut items) if items.len() == 1 => items.remove(0),
        other => other,
    };
    serde_json::from_value(params).map_err(|e| RpcError::InvalidParams(e.to_string()))
}

fn to_value<T: serde::Serialize>(result: T) -> RpcResult<Value> {
    serde_json::to_value(result).map_err(|e| RpcError::Internal(e.to_string()))
}

/// Mint and append a block over the given transactions
pub async fn add_block(state: &ApiState, args: AddBlockArgs) -> RpcResult<BlockReceipt> {
    if args.transactions.is_empty() {
        return Err(RpcError::InvalidParams("no transactions received".to_string()));
    }

    let transactions: Vec<Transaction> =
        args.transactions.into_iter().map(Transaction::from).collect();

    let chain = state.chain.clone();
    let block =
        tokio::task::spawn_blocking(move || chain.lock().add_block(transactions)).await??;

    info!(height = block.height, hash = %block.hash(), "Block added over RPC");
    Ok(BlockReceipt::from(&block))
}

/// Head, height and every block from head back to genesis
pub async fn show_chain(state: &ApiState) -> RpcResult<ShowChainResult> {
    let chain = state.chain.clone();

    tokio::task::spawn_blocking(move || -> RpcResult<ShowChainResult> {
        let chain = chain.lock();
        let blocks = chain
            .iter()
            .map(|block| block.map(|block| ChainBlock::from(&block)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ShowChainResult {
            chain_head: chain.head().to_hex(),
            chain_height: chain.height() as u64,
            blocks,
        })
    })
    .await?
}

/// Queue a transaction in the pool
pub fn submit_transaction(state: &ApiState, input: TransactionInput) -> SubmitTransactionResult {
    let txn = Transaction::from(input);
    let hash = txn.hash();
    state.pool.insert(&[txn]);

    SubmitTransactionResult {
        hash: hash.to_hex(),
    }
}

/// Mine the next page of pooled transactions, `None` when the pool is empty
pub async fn mine_block(state: &ApiState) -> RpcResult<Option<BlockReceipt>> {
    let chain = state.chain.clone();
    let pool = state.pool.clone();

    let block =
        tokio::task::spawn_blocking(move || chain.lock().mine_pending(&*pool)).await??;

    Ok(block.as_ref().map(BlockReceipt::from))
}

pub fn pool_status(state: &ApiState) -> PoolStatus {
    let stats = state.pool.stats();
    PoolStatus {
        active: stats.active,
        pending: stats.pending,
        senders: stats.senders,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        value: u64,
    }

    #[test]
    fn test_parse_params_object() {
        let probe: Probe = parse_params(json!({"value": 3})).unwrap();
        assert_eq!(probe.value, 3);
    }

    #[test]
    fn test_parse_params_wrapped_in_array() {
        let probe: Probe = parse_params(json!([{"value": 4}])).unwrap();
        assert_eq!(probe.value, 4);
    }

    #[test]
    fn test_parse_params_rejects_mismatch() {
        let result: RpcResult<Probe> = parse_params(json!({"other": 1}));
        assert!(matches!(result, Err(RpcError::InvalidParams(_))));
    }
}
