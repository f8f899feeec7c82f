use alloy_primitives::{Address, B256, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants::TOKEN_DECIMALS;

/// Direction of a token movement
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Tokens credited to the wallet
    Earned,
    /// Tokens burned for a reward or partner offer
    Spent,
    /// Tokens burned for a cause
    Donated,
    /// Call the ledger could not interpret
    Unknown,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EntryKind::Earned => "Earned",
            EntryKind::Spent => "Spent",
            EntryKind::Donated => "Donated",
            EntryKind::Unknown => "Unknown",
        };
        f.write_str(label)
    }
}

/// Confirmation state of an entry. Only mined transactions are observed.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum EntryStatus {
    #[default]
    Confirmed,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Confirmed")
    }
}

/// One classified token movement reconstructed from a chain transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LedgerEntry {
    /// Transaction hash, used for detail lookups
    pub transaction_hash: B256,
    /// Block containing the transaction
    pub block_number: u64,
    /// Timestamp of the containing block
    pub timestamp: DateTime<Utc>,
    /// Human readable label
    pub description: String,
    /// Signed token amount (positive = credit)
    pub amount: f64,
    pub kind: EntryKind,
    pub status: EntryStatus,
    /// Partner name for partner redemptions
    pub partner_name: Option<String>,
    /// Gas used, when the receipt was available
    pub gas_used: Option<u64>,
}

impl LedgerEntry {
    /// Block date as shown in history listings
    pub fn date(&self) -> String {
        self.timestamp.format("%Y-%m-%d").to_string()
    }

    pub fn is_credit(&self) -> bool {
        self.amount > 0.0
    }
}

/// Full view of a single transaction for drill-down
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionDetail {
    pub transaction_hash: B256,
    pub block_number: u64,
    pub block_time: Option<DateTime<Utc>>,
    pub from: Address,
    pub to: Option<Address>,
    pub contract_created: Option<Address>,
    pub gas_used: Option<u64>,
    pub gas_price_gwei: Option<f64>,
    pub value_ether: f64,
    pub nonce: u64,
    pub transaction_index: Option<u64>,
    pub success: Option<bool>,
    pub call: CallView,
}

/// What the transaction input decoded to
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CallView {
    /// Plain value transfer with no input
    Empty,
    /// Function call decoded against the contract ABI
    Decoded {
        function: String,
        arguments: serde_json::Value,
    },
    /// Input that did not match the ABI, as 0x-prefixed hex
    Raw(String),
}

/// 10^decimals as a U256
pub fn unit_scale(decimals: u32) -> U256 {
    U256::from(10u64).pow(U256::from(decimals))
}

/// Convert a fixed-point token amount into whole tokens
pub fn units_to_tokens(units: U256) -> f64 {
    scaled_to_f64(units, TOKEN_DECIMALS)
}

/// Convert whole tokens into the contract's fixed-point representation
pub fn tokens_to_units(tokens: u64) -> U256 {
    U256::from(tokens) * unit_scale(TOKEN_DECIMALS)
}

/// Divide a raw integer by 10^decimals, keeping the fractional part exact
/// up to f64 precision.
pub fn scaled_to_f64(raw: U256, decimals: u32) -> f64 {
    let scale = unit_scale(decimals);
    let whole = raw / scale;
    let fraction = raw % scale;
    f64::from(whole) + f64::from(fraction) / f64::from(scale)
}
