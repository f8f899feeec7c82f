/// Wallet session and reward actions

pub mod portal;

pub use portal::{ActionReceipt, PortalSettings, PurchaseReceipt, RewardsPortal};

use alloy_primitives::{Address, B256};
use serde::Serialize;
use std::time::Duration;

use crate::chain::contract::ContractError;
use crate::chain::ChainError;
use crate::ledger::LedgerError;

/// Connected wallet. Created on connect, dropped on disconnect; the balance
/// only changes through a refresh after a confirmed transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WalletSession {
    pub address: Address,
    /// Balance in whole tokens
    pub balance: f64,
}

impl WalletSession {
    /// `0x1234...abcd` form for status lines
    pub fn short_address(&self) -> String {
        let full = self.address.to_string();
        format!("{}...{}", &full[..6], &full[full.len() - 4..])
    }
}

#[derive(thiserror::Error, Debug)]
pub enum PortalError {
    #[error("No wallet connected")]
    NotConnected,

    #[error("Invalid wallet address: {0}")]
    InvalidAddress(String),

    #[error("Insufficient balance: {required} TKN required, {available:.2} TKN available")]
    InsufficientBalance { required: u64, available: f64 },

    #[error("Unknown catalog entry: {0}")]
    UnknownItem(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Transaction {hash} failed on chain")]
    Reverted { hash: B256 },

    #[error("Transaction submission failed: {0}")]
    Submission(ChainError),

    #[error("Transaction {hash} not confirmed within {waited:?}")]
    ConfirmationTimeout { hash: B256, waited: Duration },

    #[error("Stopped waiting for transaction {0}")]
    Cancelled(B256),

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Contract(#[from] ContractError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
