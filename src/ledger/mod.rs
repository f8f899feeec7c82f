/// Ledger reconstruction: classification rules, chain reader and totals

pub mod classifier;
pub mod reader;
pub mod summary;

pub use classifier::{classify, Classification};
pub use reader::{LedgerReader, ScanOutcome};
pub use summary::LedgerSummary;

use alloy_primitives::B256;

use crate::chain::ChainError;

#[derive(thiserror::Error, Debug)]
pub enum LedgerError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error("Transaction {0} not found")]
    TransactionNotFound(B256),
}
