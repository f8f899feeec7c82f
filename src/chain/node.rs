use alloy_primitives::{Address, Bytes, B256, U64};
use async_trait::async_trait;
use serde_json::json;

use super::rpc::{RpcBlock, RpcClient, RpcReceipt, RpcTransaction, TransactionRequest};
use super::ChainError;

/// Queries the ledger and portal need from a chain node.
///
/// Implemented by [`RpcClient`] for a live node; tests provide in-memory
/// chains.
#[async_trait]
pub trait ChainNode: Send + Sync {
    /// Current chain head
    async fn block_number(&self) -> Result<u64, ChainError>;

    /// Block with full transaction bodies, `None` if the node does not have it
    async fn block_with_transactions(&self, number: u64) -> Result<Option<RpcBlock>, ChainError>;

    async fn transaction(&self, hash: B256) -> Result<Option<RpcTransaction>, ChainError>;

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<RpcReceipt>, ChainError>;

    /// Read-only contract call against the latest block
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError>;

    /// Submit a state-changing transaction; never retried
    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256, ChainError>;

    /// Accounts managed by the node
    async fn accounts(&self) -> Result<Vec<Address>, ChainError>;

    /// Network id as reported by `net_version`
    async fn network_id(&self) -> Result<String, ChainError>;
}

fn quantity(number: u64) -> String {
    format!("{:#x}", number)
}

#[async_trait]
impl ChainNode for RpcClient {
    async fn block_number(&self) -> Result<u64, ChainError> {
        let head: U64 = self.read("eth_blockNumber", json!([])).await?;
        Ok(head.to::<u64>())
    }

    async fn block_with_transactions(&self, number: u64) -> Result<Option<RpcBlock>, ChainError> {
        self.read("eth_getBlockByNumber", json!([quantity(number), true])).await
    }

    async fn transaction(&self, hash: B256) -> Result<Option<RpcTransaction>, ChainError> {
        self.read("eth_getTransactionByHash", json!([hash])).await
    }

    async fn transaction_receipt(&self, hash: B256) -> Result<Option<RpcReceipt>, ChainError> {
        self.read("eth_getTransactionReceipt", json!([hash])).await
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        self.read("eth_call", json!([{ "to": to, "data": data }, "latest"])).await
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256, ChainError> {
        RpcClient::send_transaction(self, &request).await
    }

    async fn accounts(&self) -> Result<Vec<Address>, ChainError> {
        self.read("eth_accounts", json!([])).await
    }

    async fn network_id(&self) -> Result<String, ChainError> {
        self.read("net_version", json!([])).await
    }
}
