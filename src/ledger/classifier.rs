/// Ledger classification rules
///
/// Maps a typed contract call to the kind, label and signed token amount shown
/// in the history. Pure: no I/O, same input gives the same output.

use alloy_primitives::U256;

use crate::chain::ContractCall;
use crate::core::constants::{
    PURCHASE_REWARD_DESCRIPTION, REWARD_RATE_DIVISOR, REWARD_TOKENS_PER_UNIT, REWARD_UNIT_USD,
    TOKEN_BURN_DESCRIPTION, UNKNOWN_DESCRIPTION,
};
use crate::core::types::{units_to_tokens, EntryKind};

#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub kind: EntryKind,
    pub description: String,
    pub amount: f64,
    pub partner_name: Option<String>,
}

impl Classification {
    fn new(kind: EntryKind, description: impl Into<String>, amount: f64) -> Self {
        Self {
            kind,
            description: description.into(),
            amount,
            partner_name: None,
        }
    }

    pub fn unknown() -> Self {
        Self::new(EntryKind::Unknown, UNKNOWN_DESCRIPTION, 0.0)
    }
}

/// Tokens credited for a purchase of `usd_spent_cents`.
///
/// Uses the fixed 54 divisor the contract mints with, not the configurable
/// display rate; the two disagree whenever the rate is changed.
pub fn purchase_reward_tokens(usd_spent_cents: U256) -> f64 {
    let cents = f64::from(usd_spent_cents);
    (cents * REWARD_TOKENS_PER_UNIT as f64) / (REWARD_UNIT_USD * REWARD_RATE_DIVISOR) as f64
}

/// Negated token amount; zero stays `0.0` rather than `-0.0`
fn debit(units: U256) -> f64 {
    if units.is_zero() {
        return 0.0;
    }
    -units_to_tokens(units)
}

pub fn classify(call: &ContractCall) -> Classification {
    match call {
        ContractCall::RewardPurchase(args) => Classification::new(
            EntryKind::Earned,
            PURCHASE_REWARD_DESCRIPTION,
            purchase_reward_tokens(args.usd_spent_cents),
        ),
        ContractCall::Burn(args) => match (&args.cause, &args.description) {
            (Some(cause), _) => {
                Classification::new(EntryKind::Donated, format!("Donation: {}", cause), debit(args.amount))
            }
            (None, Some(description)) => {
                Classification::new(EntryKind::Spent, description.clone(), debit(args.amount))
            }
            (None, None) => Classification::new(EntryKind::Spent, TOKEN_BURN_DESCRIPTION, debit(args.amount)),
        },
        ContractCall::RedeemPartnerReward(args) => Classification {
            kind: EntryKind::Spent,
            description: format!("Partner Redemption: {}", args.partner_name),
            amount: debit(args.amount),
            partner_name: Some(args.partner_name.clone()),
        },
        ContractCall::Donate(args) => {
            Classification::new(EntryKind::Donated, format!("Donation: {}", args.cause), debit(args.amount))
        }
        ContractCall::Unknown { .. } => Classification::unknown(),
    }
}
