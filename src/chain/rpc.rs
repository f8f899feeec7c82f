/// Ethereum JSON-RPC client over HTTP
///
/// Reads are retried once on transport failures. Writes go through
/// `send_transaction`, which never retries: a resend after a lost response
/// could submit the same burn twice.

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, warn, instrument};

use super::ChainError;

/// Configuration for the node connection
#[derive(Debug, Clone)]
pub struct RpcClientConfig {
    /// Node HTTP endpoint
    pub endpoint: String,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Retries allowed for a failed read
    pub read_retries: u32,
    /// Delay before a read retry in milliseconds
    pub retry_delay_ms: u64,
}

impl Default for RpcClientConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://127.0.0.1:8545".to_string(),
            request_timeout_secs: 10,
            read_retries: 1,
            retry_delay_ms: 500,
        }
    }
}

/// Block as returned by `eth_getBlockByNumber` with full transactions
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RpcBlock {
    pub number: U64,
    #[serde(default)]
    pub hash: Option<B256>,
    pub timestamp: U64,
    #[serde(default)]
    pub transactions: Vec<RpcTransaction>,
}

/// Transaction body
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RpcTransaction {
    pub hash: B256,
    #[serde(default)]
    pub block_number: Option<U64>,
    pub from: Address,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub value: U256,
    #[serde(default)]
    pub gas_price: Option<U256>,
    #[serde(default)]
    pub nonce: U64,
    #[serde(default)]
    pub input: Bytes,
    #[serde(default)]
    pub transaction_index: Option<U64>,
}

/// Confirmation receipt
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RpcReceipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub transaction_index: Option<U64>,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub gas_used: Option<U256>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    /// 1 for success, 0 for revert; absent on pre-Byzantium nodes
    #[serde(default)]
    pub status: Option<U64>,
}

impl RpcReceipt {
    pub fn succeeded(&self) -> Option<bool> {
        self.status.map(|status| status == U64::from(1u64))
    }

    pub fn gas_used_u64(&self) -> Option<u64> {
        self.gas_used.map(|gas| gas.saturating_to::<u64>())
    }
}

/// Parameters for `eth_sendTransaction` on a node-managed account
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub data: Bytes,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gas: Option<U64>,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

pub struct RpcClient {
    client: Client,
    config: RpcClientConfig,
    next_id: AtomicU64,
}

impl RpcClient {
    pub fn new(config: RpcClientConfig) -> Result<Self, ChainError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ChainError::Connectivity(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }

    /// Issue a read-only call, retrying transport failures
    #[instrument(skip(self, params), fields(endpoint = %self.config.endpoint))]
    pub async fn read<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ChainError> {
        let max_attempts = self.config.read_retries + 1;
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self.request(method, params.clone()).await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempts < max_attempts => {
                    warn!(
                        error = %e,
                        attempt = attempts,
                        max_attempts = max_attempts,
                        "Read failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Submit a transaction from a node-managed account. Single attempt.
    #[instrument(skip(self, request), fields(from = %request.from, to = %request.to))]
    pub async fn send_transaction(&self, request: &TransactionRequest) -> Result<B256, ChainError> {
        let params = json!([request]);
        let hash: B256 = self.request("eth_sendTransaction", params).await?;
        debug!(tx_hash = %hash, "Transaction submitted");
        Ok(hash)
    }

    /// Single JSON-RPC round trip
    async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });

        debug!(method = method, id = id, "JSON-RPC request");

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        if !response.status().is_success() {
            return Err(ChainError::Connectivity(format!("HTTP {}", response.status())));
        }

        let payload: RpcResponse = response
            .json()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        parse_result(method, payload)
    }

    fn map_transport_error(&self, e: reqwest::Error) -> ChainError {
        if e.is_timeout() {
            ChainError::Timeout(Duration::from_secs(self.config.request_timeout_secs))
        } else if e.is_decode() {
            ChainError::InvalidResponse(e.to_string())
        } else {
            ChainError::Connectivity(e.to_string())
        }
    }
}

fn parse_result<T: DeserializeOwned>(method: &str, payload: RpcResponse) -> Result<T, ChainError> {
    if let Some(error) = payload.error {
        return Err(ChainError::Rpc {
            code: error.code,
            message: error.message,
        });
    }

    let result = payload.result.unwrap_or(Value::Null);
    serde_json::from_value(result)
        .map_err(|e| ChainError::InvalidResponse(format!("{}: {}", method, e)))
}
