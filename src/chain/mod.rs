/// Chain access: JSON-RPC transport, node seam and the token contract codec

pub mod rpc;
pub mod node;
pub mod contract;

pub use rpc::{RpcBlock, RpcClient, RpcClientConfig, RpcReceipt, RpcTransaction, TransactionRequest};
pub use node::ChainNode;
pub use contract::{ContractCall, DecodeError, DecodedCall, TokenContract};

use std::time::Duration;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ChainError {
    #[error("Node unreachable: {0}")]
    Connectivity(String),

    #[error("Node request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Node returned error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Malformed node response: {0}")]
    InvalidResponse(String),
}

impl ChainError {
    /// Transport-level failures that a read may retry once
    pub fn is_transient(&self) -> bool {
        matches!(self, ChainError::Connectivity(_) | ChainError::Timeout(_))
    }
}
