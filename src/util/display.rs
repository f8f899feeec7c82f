/// Terminal rendering for the portal CLI

use alloy_primitives::{Address, B256};
use colored::Colorize;

use crate::core::catalog::{
    ConversionQuote, DONATION_CAUSES, PARTNER_OFFERS, REWARD_ITEMS, STORE_ITEMS,
};
use crate::core::types::{CallView, EntryKind, LedgerEntry, TransactionDetail};
use crate::ledger::{LedgerSummary, ScanOutcome};
use crate::session::{ActionReceipt, PurchaseReceipt, WalletSession};

/// Signed amount with two decimals, e.g. `+9.26 TKN`
pub fn format_amount(amount: f64) -> String {
    if amount > 0.0 {
        format!("+{:.2} TKN", amount)
    } else {
        format!("{:.2} TKN", amount)
    }
}

/// First 10 and last 8 hex characters of a hash
pub fn short_hash(hash: &B256) -> String {
    let full = hash.to_string();
    format!("{}...{}", &full[..10], &full[full.len() - 8..])
}

fn kind_icon(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Earned => "🟢",
        EntryKind::Spent => "🔴",
        EntryKind::Donated => "💚",
        EntryKind::Unknown => "⚪",
    }
}

pub fn print_session(session: &WalletSession, token_usd_rate: f64) {
    println!("\n{}", "👛 WALLET".bold());
    println!("{}", "═".repeat(60).black());
    println!("   Address: {}", session.address);
    println!(
        "   Balance: {} (${:.2})",
        format!("{:.2} TKN", session.balance).bold(),
        session.balance * token_usd_rate
    );
}

pub fn print_accounts(accounts: &[Address]) {
    if accounts.is_empty() {
        println!("{}", "💤 Node manages no accounts".bright_yellow());
        return;
    }
    for (i, account) in accounts.iter().enumerate() {
        println!("   [{}] {}", i, account);
    }
}

pub fn print_history(outcome: &ScanOutcome, summary: &LedgerSummary) {
    println!("\n{}", "📒 TRANSACTION HISTORY".bold());
    println!("{}", "═".repeat(70).black());

    if outcome.entries.is_empty() {
        println!("{}", "💤 No blockchain transactions found for this wallet".bright_yellow());
    }

    for (i, entry) in outcome.entries.iter().enumerate() {
        print_entry(entry);
        if i < outcome.entries.len() - 1 {
            println!("{}", "─".repeat(70).bright_black());
        }
    }

    if let Some(e) = &outcome.interrupted {
        println!(
            "{} {}",
            "⚠️",
            format!("History is partial ({} blocks scanned): {}", outcome.blocks_scanned, e).yellow()
        );
    }

    println!("{}", "═".repeat(70).black());
    println!(
        "{} Earned: {} (${:.2}) | Spent: {} (${:.2}) | Donated: {}",
        "📈".bright_green(),
        format!("{:.2} TKN", summary.total_earned).green(),
        summary.earned_usd,
        format!("{:.2} TKN", summary.total_spent).red(),
        summary.spent_usd,
        format!("{:.2} TKN", summary.total_donated).cyan()
    );
}

fn print_entry(entry: &LedgerEntry) {
    let amount = format_amount(entry.amount);
    let amount = if entry.is_credit() {
        amount.green()
    } else if entry.amount < 0.0 {
        amount.red()
    } else {
        amount.normal()
    };

    println!(
        "{} {} | {} | {} | {}",
        kind_icon(entry.kind),
        entry.date(),
        entry.description.bold(),
        amount,
        entry.status
    );
    println!(
        "   🔗 {} | block {}{}",
        short_hash(&entry.transaction_hash),
        entry.block_number,
        entry.gas_used.map(|gas| format!(" | gas {}", gas)).unwrap_or_default()
    );
}

pub fn print_detail(detail: &TransactionDetail) {
    println!("\n{}", "🔍 TRANSACTION DETAILS".bold());
    println!("{}", "═".repeat(70).black());
    println!("   Hash: {}", detail.transaction_hash);
    println!("   Block: {}", detail.block_number);
    if let Some(time) = detail.block_time {
        println!("   Time: {}", time.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!("   From: {}", detail.from);
    match (detail.to, detail.contract_created) {
        (Some(to), _) => println!("   To: {}", to),
        (None, Some(created)) => println!("   To: Contract Creation ({})", created),
        (None, None) => println!("   To: Contract Creation"),
    }
    println!("   Value: {} ETH", detail.value_ether);
    if let Some(gas) = detail.gas_used {
        println!("   Gas Used: {}", gas);
    }
    if let Some(price) = detail.gas_price_gwei {
        println!("   Gas Price: {:.2} Gwei", price);
    }
    println!("   Nonce: {}", detail.nonce);
    if let Some(index) = detail.transaction_index {
        println!("   Transaction Index: {}", index);
    }
    match detail.success {
        Some(true) => println!("   Status: {}", "Success".green()),
        Some(false) => println!("   Status: {}", "Failed".red()),
        None => println!("   Status: {}", "Pending".yellow()),
    }

    match &detail.call {
        CallView::Empty => {}
        CallView::Decoded { function, arguments } => {
            println!("\n   {} {}", "Function:".bold(), function);
            let pretty = serde_json::to_string_pretty(arguments).unwrap_or_else(|_| arguments.to_string());
            for line in pretty.lines() {
                println!("   {}", line);
            }
        }
        CallView::Raw(input) => {
            println!("\n   {} {}", "Input:".bold(), input.bright_black());
        }
    }
}

pub fn print_action(receipt: &ActionReceipt) {
    println!(
        "✅ {} | {} | {}",
        receipt.label.bold(),
        if receipt.tokens > 0 {
            format!("-{} TKN", receipt.tokens).red()
        } else {
            "no tokens spent".normal()
        },
        short_hash(&receipt.transaction_hash)
    );
    println!("   New balance: {:.2} TKN", receipt.balance_after);
}

pub fn print_purchase(receipt: &PurchaseReceipt) {
    println!("\n{}", "🛒 PURCHASE CONFIRMED".green().bold());
    println!("   Total: ${}", receipt.total_usd);
    println!(
        "   Estimated reward: {}",
        format!("{:.2} TKN", receipt.estimated_tokens).green()
    );
    print_action(&receipt.action);
}

pub fn print_quote(quote: &ConversionQuote) {
    println!("\n{}", "💱 CONVERSION QUOTE".bold());
    println!("   {:.2} TKN x {} = {:.8} {}", quote.tokens, quote.rate, quote.gross, quote.currency);
    println!("   Fee: {:.2} TKN", quote.fee_tokens);
    println!("   You receive: {}", format!("{:.8} {}", quote.net, quote.currency).bold());
}

pub fn print_catalog() {
    println!("\n{}", "🏪 STORE".bold());
    for item in STORE_ITEMS {
        println!("   {:<22} ${}", item.name, item.price_usd);
    }

    println!("\n{}", "🎁 REWARDS".bold());
    for item in REWARD_ITEMS {
        println!("   {:<22} {} TKN", item.name, item.price_tokens);
    }

    println!("\n{}", "💚 CAUSES".bold());
    for cause in DONATION_CAUSES {
        println!("   {:<22} {}", cause.name, cause.category.bright_black());
    }

    println!("\n{}", "🤝 PARTNERS".bold());
    for offer in PARTNER_OFFERS {
        println!(
            "   {:<22} {} TKN | {} | {}",
            offer.name,
            offer.price_tokens,
            offer.category.bright_black(),
            offer.discount
        );
    }
}
