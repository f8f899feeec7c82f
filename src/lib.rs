// Core types, constants and catalog
pub mod core;

// Node access and contract codec
pub mod chain;

// History reconstruction
pub mod ledger;

// Wallet session and write actions
pub mod session;

pub mod config;
pub mod util;

// Re-export commonly used types for convenience
pub use crate::core::*;
pub use chain::{ChainError, ChainNode, RpcClient, TokenContract};
pub use ledger::{LedgerReader, LedgerSummary, ScanOutcome};
pub use session::{PortalError, RewardsPortal, WalletSession};
