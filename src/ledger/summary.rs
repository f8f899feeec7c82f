/// Earned/spent totals over a set of ledger entries

use serde::Serialize;

use crate::core::types::{EntryKind, LedgerEntry};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LedgerSummary {
    /// Sum of all credits
    pub total_earned: f64,
    /// Sum of spent debits, as a positive number. Donations are not included.
    pub total_spent: f64,
    /// Sum of donated debits, as a positive number
    pub total_donated: f64,
    pub earned_usd: f64,
    pub spent_usd: f64,
}

impl LedgerSummary {
    pub fn from_entries(entries: &[LedgerEntry], token_usd_rate: f64) -> Self {
        let total_earned: f64 = entries
            .iter()
            .filter(|entry| entry.amount > 0.0)
            .map(|entry| entry.amount)
            .sum();
        let total_spent: f64 = entries
            .iter()
            .filter(|entry| entry.kind == EntryKind::Spent)
            .map(|entry| entry.amount.abs())
            .sum();
        let total_donated: f64 = entries
            .iter()
            .filter(|entry| entry.kind == EntryKind::Donated)
            .map(|entry| entry.amount.abs())
            .sum();

        Self {
            total_earned,
            total_spent,
            total_donated,
            earned_usd: total_earned * token_usd_rate,
            spent_usd: total_spent * token_usd_rate,
        }
    }
}
