/// Rewards portal: wallet session plus the token actions that write to chain
///
/// Every action follows the same path: validate against the catalog and the
/// cached balance, submit exactly once, wait for the receipt, then refresh
/// the balance. Nothing in the session changes before confirmation.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, Bytes, B256, U256, U64};
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn, instrument};

use crate::chain::{ChainNode, RpcReceipt, TokenContract, TransactionRequest};
use crate::core::catalog::{self, ConversionQuote, Currency};
use crate::core::constants::{functions, ACTION_GAS_LIMIT, MAX_DONATION_TOKENS, MIN_DONATION_TOKENS};
use crate::core::constants::{DEFAULT_HISTORY_LIMIT, DEFAULT_LOOKBACK_BLOCKS, DEFAULT_TOKEN_USD_RATE};
use crate::core::types::{tokens_to_units, units_to_tokens, TransactionDetail};
use crate::ledger::{LedgerReader, LedgerSummary, ScanOutcome};

use super::{PortalError, WalletSession};

/// Tunables for the portal
#[derive(Debug, Clone)]
pub struct PortalSettings {
    /// TKN to USD rate used for valuations
    pub token_usd_rate: f64,
    /// Longest wait for a submitted transaction's receipt
    pub confirmation_timeout: Duration,
    /// Delay between receipt polls
    pub receipt_poll_interval: Duration,
    pub history_limit: usize,
    pub lookback_blocks: u64,
}

impl Default for PortalSettings {
    fn default() -> Self {
        Self {
            token_usd_rate: DEFAULT_TOKEN_USD_RATE,
            confirmation_timeout: Duration::from_secs(120),
            receipt_poll_interval: Duration::from_millis(500),
            history_limit: DEFAULT_HISTORY_LIMIT,
            lookback_blocks: DEFAULT_LOOKBACK_BLOCKS,
        }
    }
}

/// Confirmed token action
#[derive(Debug, Clone, Serialize)]
pub struct ActionReceipt {
    pub transaction_hash: B256,
    /// What was bought, redeemed or supported
    pub label: String,
    /// Tokens debited from the wallet; zero for purchases
    pub tokens: u64,
    pub gas_used: Option<u64>,
    /// Wallet balance after the refresh that follows confirmation
    pub balance_after: f64,
}

/// Confirmed store purchase
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseReceipt {
    pub total_usd: u64,
    pub usd_spent_cents: u64,
    /// Reward estimate shown at checkout, at the configured rate
    pub estimated_tokens: f64,
    pub action: ActionReceipt,
}

pub struct RewardsPortal {
    node: Arc<dyn ChainNode>,
    contract: TokenContract,
    settings: PortalSettings,
    session: Option<WalletSession>,
    cancel_tx: broadcast::Sender<()>,
}

impl RewardsPortal {
    pub fn new(node: Arc<dyn ChainNode>, contract: TokenContract, settings: PortalSettings) -> Self {
        let (cancel_tx, _) = broadcast::channel(4);
        Self {
            node,
            contract,
            settings,
            session: None,
            cancel_tx,
        }
    }

    pub fn session(&self) -> Option<&WalletSession> {
        self.session.as_ref()
    }

    pub fn contract(&self) -> &TokenContract {
        &self.contract
    }

    pub fn settings(&self) -> &PortalSettings {
        &self.settings
    }

    /// Sender that aborts any confirmation wait in progress. Waiting stops,
    /// the submitted transaction does not.
    pub fn cancel_handle(&self) -> broadcast::Sender<()> {
        self.cancel_tx.clone()
    }

    /// Accounts the node can sign for
    pub async fn accounts(&self) -> Result<Vec<Address>, PortalError> {
        Ok(self.node.accounts().await?)
    }

    /// On-chain balance of any address, in whole tokens
    pub async fn balance_of(&self, owner: Address) -> Result<f64, PortalError> {
        let data = self.contract.balance_of_call(owner)?;
        let output = self.node.call(self.contract.address(), data).await?;
        let units = self.contract.decode_balance(&output)?;
        Ok(units_to_tokens(units))
    }

    /// Start a session for `wallet`, replacing any current one
    #[instrument(skip(self))]
    pub async fn connect(&mut self, wallet: &str) -> Result<&WalletSession, PortalError> {
        let address = wallet
            .trim()
            .parse::<Address>()
            .map_err(|_| PortalError::InvalidAddress(wallet.to_string()))?;

        let balance = self.balance_of(address).await?;
        info!("🔗 Wallet {} connected, balance {:.2} TKN", address, balance);
        Ok(&*self.session.insert(WalletSession { address, balance }))
    }

    pub fn disconnect(&mut self) -> Option<WalletSession> {
        let previous = self.session.take();
        if let Some(session) = &previous {
            info!("🔌 Wallet {} disconnected", session.short_address());
        }
        previous
    }

    fn connected(&self) -> Result<&WalletSession, PortalError> {
        self.session.as_ref().ok_or(PortalError::NotConnected)
    }

    /// Re-read the connected wallet's balance
    pub async fn refresh_balance(&mut self) -> Result<f64, PortalError> {
        let address = self.connected()?.address;
        let balance = self.balance_of(address).await?;
        if let Some(session) = self.session.as_mut() {
            session.balance = balance;
        }
        Ok(balance)
    }

    fn reader(&self) -> LedgerReader<'_> {
        LedgerReader::new(self.node.as_ref(), &self.contract).with_lookback(self.settings.lookback_blocks)
    }

    /// Recent ledger entries for the connected wallet
    pub async fn history(&self, limit: Option<usize>) -> Result<ScanOutcome, PortalError> {
        let wallet = self.connected()?.address.to_string();
        let limit = limit.unwrap_or(self.settings.history_limit);
        Ok(self.reader().recent_entries(&wallet, limit).await)
    }

    pub fn summarize(&self, outcome: &ScanOutcome) -> LedgerSummary {
        LedgerSummary::from_entries(&outcome.entries, self.settings.token_usd_rate)
    }

    pub async fn transaction_detail(&self, hash: B256) -> Result<TransactionDetail, PortalError> {
        Ok(self.reader().transaction_detail(hash).await?)
    }

    /// Conversion quote for `tokens`; never more than the connected balance
    pub fn quote_conversion(&self, tokens: f64, currency: Currency) -> Result<ConversionQuote, PortalError> {
        if !(tokens > 0.0) {
            return Err(PortalError::InvalidAmount(format!("{} TKN", tokens)));
        }
        let session = self.connected()?;
        if tokens > session.balance {
            return Err(PortalError::InsufficientBalance {
                required: tokens.ceil() as u64,
                available: session.balance,
            });
        }
        Ok(catalog::quote_conversion(tokens, currency))
    }

    /// Buy store items; the contract mints the purchase reward to the wallet
    #[instrument(skip(self, cart))]
    pub async fn purchase(&mut self, cart: &[(&str, u32)]) -> Result<PurchaseReceipt, PortalError> {
        let customer = self.connected()?.address;

        let mut total_usd = 0u64;
        let mut labels = Vec::with_capacity(cart.len());
        for (name, quantity) in cart {
            let item = catalog::store_item(name).ok_or_else(|| PortalError::UnknownItem(name.to_string()))?;
            if *quantity == 0 {
                return Err(PortalError::InvalidAmount(format!("quantity 0 for {}", item.name)));
            }
            total_usd += item.price_usd * u64::from(*quantity);
            labels.push(format!("{} x{}", item.name, quantity));
        }
        if total_usd == 0 {
            return Err(PortalError::InvalidAmount("empty cart".to_string()));
        }

        let usd_spent_cents = total_usd * 100;
        let estimated_tokens = (usd_spent_cents as f64 * 5.0) / (1000.0 * self.settings.token_usd_rate);

        let data = self.contract.encode_call(
            functions::REWARD_PURCHASE,
            &[
                DynSolValue::Address(customer),
                DynSolValue::Uint(U256::from(usd_spent_cents), 256),
            ],
        )?;

        info!("🛒 Purchasing {} for ${}", labels.join(", "), total_usd);
        let action = self.execute(data, labels.join(", "), 0).await?;
        Ok(PurchaseReceipt {
            total_usd,
            usd_spent_cents,
            estimated_tokens,
            action,
        })
    }

    /// Burn tokens for a catalog reward
    #[instrument(skip(self))]
    pub async fn redeem_reward(&mut self, item_name: &str) -> Result<ActionReceipt, PortalError> {
        let item = catalog::reward_item(item_name).ok_or_else(|| PortalError::UnknownItem(item_name.to_string()))?;
        self.ensure_balance(item.price_tokens)?;

        let data = self.contract.encode_call(
            functions::BURN,
            &[
                DynSolValue::Uint(tokens_to_units(item.price_tokens), 256),
                DynSolValue::String(item.name.to_string()),
            ],
        )?;

        info!("🎁 Redeeming {} for {} TKN", item.name, item.price_tokens);
        self.execute(data, item.name.to_string(), item.price_tokens).await
    }

    /// Donate whole tokens to a listed cause
    #[instrument(skip(self))]
    pub async fn donate(&mut self, cause_name: &str, tokens: u64) -> Result<ActionReceipt, PortalError> {
        let cause = catalog::donation_cause(cause_name).ok_or_else(|| PortalError::UnknownItem(cause_name.to_string()))?;
        if !(MIN_DONATION_TOKENS..=MAX_DONATION_TOKENS).contains(&tokens) {
            return Err(PortalError::InvalidAmount(format!(
                "donations must be between {} and {} TKN, got {}",
                MIN_DONATION_TOKENS, MAX_DONATION_TOKENS, tokens
            )));
        }
        self.ensure_balance(tokens)?;

        let data = self.contract.encode_call(
            functions::DONATE,
            &[
                DynSolValue::Uint(tokens_to_units(tokens), 256),
                DynSolValue::String(cause.name.to_string()),
            ],
        )?;

        info!("💚 Donating {} TKN to {}", tokens, cause.name);
        self.execute(data, cause.name.to_string(), tokens).await
    }

    /// Spend tokens on a partner offer
    #[instrument(skip(self))]
    pub async fn redeem_partner(&mut self, partner_name: &str) -> Result<ActionReceipt, PortalError> {
        let offer = catalog::partner_offer(partner_name).ok_or_else(|| PortalError::UnknownItem(partner_name.to_string()))?;
        let customer = self.connected()?.address;
        self.ensure_balance(offer.price_tokens)?;

        let data = self.contract.encode_call(
            functions::REDEEM_PARTNER_REWARD,
            &[
                DynSolValue::Address(customer),
                DynSolValue::Uint(tokens_to_units(offer.price_tokens), 256),
                DynSolValue::String(offer.name.to_string()),
            ],
        )?;

        info!("🤝 Redeeming {} for {} TKN", offer.name, offer.price_tokens);
        self.execute(data, offer.name.to_string(), offer.price_tokens).await
    }

    fn ensure_balance(&self, required: u64) -> Result<(), PortalError> {
        let session = self.connected()?;
        if session.balance < required as f64 {
            return Err(PortalError::InsufficientBalance {
                required,
                available: session.balance,
            });
        }
        Ok(())
    }

    /// Submit once, wait for confirmation, then refresh the session balance
    async fn execute(&mut self, data: Bytes, label: String, tokens: u64) -> Result<ActionReceipt, PortalError> {
        let from = self.connected()?.address;
        let request = TransactionRequest {
            from,
            to: self.contract.address(),
            data,
            gas: Some(U64::from(ACTION_GAS_LIMIT)),
        };

        let hash = self
            .node
            .send_transaction(request)
            .await
            .map_err(PortalError::Submission)?;
        info!("📤 Submitted transaction {}", hash);

        let receipt = self.await_confirmation(hash).await?;
        if receipt.succeeded() == Some(false) {
            error!("❌ Transaction {} reverted", hash);
            return Err(PortalError::Reverted { hash });
        }

        let balance_after = match self.refresh_balance().await {
            Ok(balance) => balance,
            Err(e) => {
                warn!(error = %e, "Balance refresh failed after confirmation, keeping cached value");
                self.connected()?.balance
            }
        };

        info!("✅ Transaction {} confirmed, balance {:.2} TKN", hash, balance_after);
        Ok(ActionReceipt {
            transaction_hash: hash,
            label,
            tokens,
            gas_used: receipt.gas_used_u64(),
            balance_after,
        })
    }

    /// Poll for the receipt until it appears, the timeout passes or a cancel
    /// signal arrives.
    async fn await_confirmation(&self, hash: B256) -> Result<RpcReceipt, PortalError> {
        let started = Instant::now();
        let timeout = self.settings.confirmation_timeout;
        let deadline = tokio::time::sleep(timeout);
        tokio::pin!(deadline);
        let mut cancel_rx = self.cancel_tx.subscribe();
        let mut poll = tokio::time::interval(self.settings.receipt_poll_interval);

        loop {
            tokio::select! {
                _ = &mut deadline => {
                    warn!("⏰ No receipt for {} after {:?}", hash, timeout);
                    return Err(PortalError::ConfirmationTimeout { hash, waited: started.elapsed() });
                }
                _ = cancel_rx.recv() => {
                    warn!("🛑 Stopped waiting for {}", hash);
                    return Err(PortalError::Cancelled(hash));
                }
                _ = poll.tick() => {
                    match self.node.transaction_receipt(hash).await {
                        Ok(Some(receipt)) => return Ok(receipt),
                        Ok(None) => debug!("Receipt for {} not available yet", hash),
                        Err(e) if e.is_transient() => {
                            debug!(error = %e, "Receipt poll failed, polling again");
                        }
                        Err(e) => return Err(e.into()),
                    }
                }
            }
        }
    }
}
