/// Ledger reconstruction from raw chain data
///
/// Walks backwards from the chain head one block at a time, picks out
/// transactions sent by the wallet or addressed to the token contract, and
/// classifies each into a [`LedgerEntry`]. Strictly sequential: each query is
/// awaited before the next is issued.

use alloy_primitives::{Address, B256};
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn, instrument};

use crate::chain::{ChainError, ChainNode, RpcTransaction, TokenContract};
use crate::core::constants::{DEFAULT_HISTORY_LIMIT, DEFAULT_LOOKBACK_BLOCKS};
use crate::core::types::{scaled_to_f64, CallView, EntryStatus, LedgerEntry, TransactionDetail};

use super::classifier::classify;
use super::LedgerError;

/// Result of a history scan. A connectivity failure stops the scan early but
/// keeps what was already collected; any other failure only skips the block
/// or receipt it hit.
#[derive(Debug, Clone, Default)]
pub struct ScanOutcome {
    /// Entries, most recent first
    pub entries: Vec<LedgerEntry>,
    /// Failure that ended the scan before the window was exhausted
    pub interrupted: Option<ChainError>,
    pub blocks_scanned: u64,
}

impl ScanOutcome {
    pub fn is_complete(&self) -> bool {
        self.interrupted.is_none()
    }
}

/// Wallet identifier as given by the caller; matched case-insensitively
#[derive(Debug, Clone)]
struct WalletMatcher {
    address: Option<Address>,
    lowercase: String,
}

impl WalletMatcher {
    fn new(wallet: &str) -> Self {
        Self {
            address: wallet.trim().parse::<Address>().ok(),
            lowercase: wallet.trim().to_lowercase(),
        }
    }

    fn matches(&self, sender: &Address) -> bool {
        match self.address {
            Some(address) => address == *sender,
            None => sender.to_string().to_lowercase() == self.lowercase,
        }
    }
}

pub struct LedgerReader<'a> {
    node: &'a dyn ChainNode,
    contract: &'a TokenContract,
    lookback_blocks: u64,
}

impl<'a> LedgerReader<'a> {
    pub fn new(node: &'a dyn ChainNode, contract: &'a TokenContract) -> Self {
        Self {
            node,
            contract,
            lookback_blocks: DEFAULT_LOOKBACK_BLOCKS,
        }
    }

    pub fn with_lookback(mut self, blocks: u64) -> Self {
        self.lookback_blocks = blocks;
        self
    }

    fn is_relevant(&self, tx: &RpcTransaction, wallet: &WalletMatcher) -> bool {
        tx.to == Some(self.contract.address()) || wallet.matches(&tx.from)
    }

    /// Up to [`DEFAULT_HISTORY_LIMIT`] most recent entries
    pub async fn recent_history(&self, wallet: &str) -> ScanOutcome {
        self.recent_entries(wallet, DEFAULT_HISTORY_LIMIT).await
    }

    /// Collect up to `limit` entries involving `wallet` or the contract,
    /// most recent first.
    #[instrument(skip(self), fields(contract = %self.contract.address(), lookback = self.lookback_blocks))]
    pub async fn recent_entries(&self, wallet: &str, limit: usize) -> ScanOutcome {
        let mut outcome = ScanOutcome::default();
        if limit == 0 || self.lookback_blocks == 0 {
            return outcome;
        }

        let head = match self.node.block_number().await {
            Ok(head) => head,
            Err(e) => {
                warn!(error = %e, "Could not read chain head, history unavailable");
                outcome.interrupted = Some(e);
                return outcome;
            }
        };

        let wallet = WalletMatcher::new(wallet);
        let floor = head.saturating_sub(self.lookback_blocks - 1);
        debug!(head = head, floor = floor, "Scanning blocks for ledger entries");

        'scan: for number in (floor..=head).rev() {
            let block = match self.node.block_with_transactions(number).await {
                Ok(Some(block)) => block,
                Ok(None) => {
                    debug!(block = number, "Block not available, skipping");
                    outcome.blocks_scanned += 1;
                    continue;
                }
                Err(e) if e.is_transient() => {
                    warn!(block = number, error = %e, "Block fetch failed, returning partial history");
                    outcome.interrupted = Some(e);
                    break;
                }
                Err(e) => {
                    warn!(block = number, error = %e, "Block unreadable, skipping");
                    outcome.blocks_scanned += 1;
                    continue;
                }
            };
            outcome.blocks_scanned += 1;

            let timestamp = block_time(block.timestamp.to::<u64>());

            for tx in &block.transactions {
                if !self.is_relevant(tx, &wallet) {
                    continue;
                }

                let gas_used = match self.node.transaction_receipt(tx.hash).await {
                    Ok(receipt) => receipt.and_then(|r| r.gas_used_u64()),
                    Err(e) if e.is_transient() => {
                        warn!(tx_hash = %tx.hash, error = %e, "Receipt fetch failed, returning partial history");
                        outcome.interrupted = Some(e);
                        break 'scan;
                    }
                    Err(e) => {
                        warn!(tx_hash = %tx.hash, error = %e, "Receipt unavailable");
                        None
                    }
                };

                let call = self.contract.decode_call(&tx.input);
                let classification = classify(&call);

                outcome.entries.push(LedgerEntry {
                    transaction_hash: tx.hash,
                    block_number: number,
                    timestamp,
                    description: classification.description,
                    amount: classification.amount,
                    kind: classification.kind,
                    status: EntryStatus::Confirmed,
                    partner_name: classification.partner_name,
                    gas_used,
                });

                if outcome.entries.len() >= limit {
                    break 'scan;
                }
            }
        }

        info!(
            "📒 Collected {} ledger entries from {} blocks{}",
            outcome.entries.len(),
            outcome.blocks_scanned,
            if outcome.is_complete() { "" } else { " (partial)" }
        );
        outcome
    }

    /// Full detail for one transaction
    #[instrument(skip(self))]
    pub async fn transaction_detail(&self, hash: B256) -> Result<TransactionDetail, LedgerError> {
        let tx = self
            .node
            .transaction(hash)
            .await?
            .ok_or(LedgerError::TransactionNotFound(hash))?;
        let receipt = self.node.transaction_receipt(hash).await?;

        let block_number = tx
            .block_number
            .or_else(|| receipt.as_ref().and_then(|r| r.block_number))
            .map(|n| n.to::<u64>());

        let block_time = match block_number {
            Some(number) => self
                .node
                .block_with_transactions(number)
                .await?
                .map(|block| self::block_time(block.timestamp.to::<u64>())),
            None => None,
        };

        let call = if tx.input.is_empty() {
            CallView::Empty
        } else {
            match self.contract.decode_input(&tx.input) {
                Ok(decoded) => CallView::Decoded {
                    arguments: decoded.arguments_json(),
                    function: decoded.function,
                },
                Err(e) => {
                    debug!(error = %e, "Showing raw input");
                    CallView::Raw(format!("0x{}", hex::encode(&tx.input)))
                }
            }
        };

        Ok(TransactionDetail {
            transaction_hash: tx.hash,
            block_number: block_number.unwrap_or_default(),
            block_time,
            from: tx.from,
            to: tx.to,
            contract_created: receipt.as_ref().and_then(|r| r.contract_address),
            gas_used: receipt.as_ref().and_then(|r| r.gas_used_u64()),
            gas_price_gwei: tx.gas_price.map(|price| scaled_to_f64(price, 9)),
            value_ether: scaled_to_f64(tx.value, 18),
            nonce: tx.nonce.to::<u64>(),
            transaction_index: receipt
                .as_ref()
                .and_then(|r| r.transaction_index)
                .or(tx.transaction_index)
                .map(|i| i.to::<u64>()),
            success: receipt.as_ref().and_then(|r| r.succeeded()),
            call,
        })
    }
}

fn block_time(seconds: u64) -> DateTime<Utc> {
    DateTime::from_timestamp(seconds as i64, 0).unwrap_or_default()
}
