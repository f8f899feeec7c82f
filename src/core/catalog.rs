/// Fixed-price catalog: store items, reward items, donation causes, partner
/// offers and the token converter's rates.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::constants::CONVERSION_FEE_PERCENT;

/// Store item that earns tokens when purchased
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreItem {
    pub name: &'static str,
    pub price_usd: u64,
}

/// Item redeemable by burning tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RewardItem {
    pub name: &'static str,
    pub price_tokens: u64,
}

/// Cause that accepts token donations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DonationCause {
    pub name: &'static str,
    pub category: &'static str,
}

/// Partner accepting TKN for discounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PartnerOffer {
    pub name: &'static str,
    pub category: &'static str,
    pub discount: &'static str,
    pub price_tokens: u64,
}

pub const STORE_ITEMS: &[StoreItem] = &[
    StoreItem { name: "T-Shirt", price_usd: 20 },
    StoreItem { name: "Headphones", price_usd: 50 },
    StoreItem { name: "Sneakers", price_usd: 80 },
    StoreItem { name: "Backpack", price_usd: 30 },
    StoreItem { name: "Smartwatch", price_usd: 100 },
    StoreItem { name: "Sunglasses", price_usd: 25 },
];

pub const REWARD_ITEMS: &[RewardItem] = &[
    RewardItem { name: "VIP Event Pass", price_tokens: 750 },
    RewardItem { name: "Early Product Access", price_tokens: 500 },
    RewardItem { name: "Art NFT", price_tokens: 300 },
    RewardItem { name: "Gaming NFT", price_tokens: 150 },
];

pub const DONATION_CAUSES: &[DonationCause] = &[
    DonationCause { name: "Environmental Causes", category: "Environment" },
    DonationCause { name: "Education", category: "Education" },
    DonationCause { name: "Health Research", category: "Health" },
];

pub const PARTNER_OFFERS: &[PartnerOffer] = &[
    PartnerOffer {
        name: "Amazon Gift Coupon",
        category: "E-Commerce",
        discount: "30% off + free shipping",
        price_tokens: 600,
    },
    PartnerOffer {
        name: "Apple Store Gift Card",
        category: "Tech Store",
        discount: "50$ off on apple products",
        price_tokens: 800,
    },
    PartnerOffer {
        name: "Xbox",
        category: "Gaming",
        discount: "15% off on adventures",
        price_tokens: 500,
    },
];

fn find_by_name<'a, T>(items: &'a [T], name: &str, key: impl Fn(&T) -> &str) -> Option<&'a T> {
    items.iter().find(|item| key(item).eq_ignore_ascii_case(name))
}

pub fn store_item(name: &str) -> Option<&'static StoreItem> {
    find_by_name(STORE_ITEMS, name, |i| i.name)
}

pub fn reward_item(name: &str) -> Option<&'static RewardItem> {
    find_by_name(REWARD_ITEMS, name, |i| i.name)
}

pub fn donation_cause(name: &str) -> Option<&'static DonationCause> {
    find_by_name(DONATION_CAUSES, name, |c| c.name)
}

pub fn partner_offer(name: &str) -> Option<&'static PartnerOffer> {
    find_by_name(PARTNER_OFFERS, name, |p| p.name)
}

/// Target of a token conversion quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    Usd,
    Eth,
    Btc,
}

impl Currency {
    /// The converter's own fixed rates (1 TKN in the target currency)
    pub fn rate_per_token(&self) -> f64 {
        match self {
            Currency::Usd => 0.25,
            Currency::Eth => 0.0001,
            Currency::Btc => 0.00001,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Currency::Usd => "USD",
            Currency::Eth => "ETH",
            Currency::Btc => "BTC",
        };
        f.write_str(symbol)
    }
}

impl std::str::FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "ETH" => Ok(Currency::Eth),
            "BTC" => Ok(Currency::Btc),
            other => Err(format!("unsupported currency: {}", other)),
        }
    }
}

/// Quote for converting TKN into another currency
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConversionQuote {
    pub tokens: f64,
    pub currency: Currency,
    pub rate: f64,
    pub gross: f64,
    /// Fee in TKN
    pub fee_tokens: f64,
    /// Amount received after the fee is deducted
    pub net: f64,
}

/// Quote a conversion. The fee is charged in TKN and subtracted from the
/// converted amount as-is, which is how the portal has always shown it.
pub fn quote_conversion(tokens: f64, currency: Currency) -> ConversionQuote {
    let rate = currency.rate_per_token();
    let gross = tokens * rate;
    let fee_tokens = tokens * CONVERSION_FEE_PERCENT / 100.0;
    ConversionQuote {
        tokens,
        currency,
        rate,
        gross,
        fee_tokens,
        net: gross - fee_tokens,
    }
}
