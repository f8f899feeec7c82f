/// Fixed protocol constants for the TKN token contract

/// Decimals used by the contract's fixed-point token amounts
pub const TOKEN_DECIMALS: u32 = 18;

/// Default number of ledger entries returned by a history scan
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Default number of blocks scanned backwards from the chain head
pub const DEFAULT_LOOKBACK_BLOCKS: u64 = 1000;

/// Fixed TKN to USD rate used for display valuations
pub const DEFAULT_TOKEN_USD_RATE: f64 = 0.54;

/// Tokens earned per reward unit of spend
pub const REWARD_TOKENS_PER_UNIT: u64 = 5;

/// Reward unit of spend, in whole dollars
pub const REWARD_UNIT_USD: u64 = 10;

/// Divisor baked into the on-chain purchase reward amounts.
///
/// This is the 0.54 rate expressed in cents and is independent of the
/// configurable `token_usd_rate`; existing reward history depends on it.
pub const REWARD_RATE_DIVISOR: u64 = 54;

/// Donation bounds in whole tokens
pub const MIN_DONATION_TOKENS: u64 = 1;
pub const MAX_DONATION_TOKENS: u64 = 1000;

/// Gas limit sent with portal transactions
pub const ACTION_GAS_LIMIT: u64 = 300_000;

/// Fee charged on token conversions, in percent of the converted amount
pub const CONVERSION_FEE_PERCENT: f64 = 1.0;

/// Labels used when a call cannot be classified
pub const UNKNOWN_DESCRIPTION: &str = "Blockchain Transaction";
pub const TOKEN_BURN_DESCRIPTION: &str = "Token Burn";
pub const PURCHASE_REWARD_DESCRIPTION: &str = "Purchase Reward";

/// Contract function names
pub mod functions {
    pub const REWARD_PURCHASE: &str = "rewardPurchase";
    pub const BURN: &str = "burn";
    pub const REDEEM_PARTNER_REWARD: &str = "redeemPartnerReward";
    pub const DONATE: &str = "donate";
    pub const BALANCE_OF: &str = "balanceOf";
}
