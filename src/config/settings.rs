/// Portal configuration structures

use alloy_primitives::Address;
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::chain::RpcClientConfig;
use crate::core::constants::{DEFAULT_HISTORY_LIMIT, DEFAULT_LOOKBACK_BLOCKS, DEFAULT_TOKEN_USD_RATE};
use crate::session::PortalSettings;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub node: Node,
    #[serde(default)]
    pub contract: Contract,
    #[serde(default)]
    pub history: History,
    #[serde(default)]
    pub portal: Portal,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Node {
    pub rpc_url: String,
    pub request_timeout_secs: u64,
    pub retry_delay_ms: u64,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            rpc_url: "http://127.0.0.1:8545".to_string(),
            request_timeout_secs: 10,
            retry_delay_ms: 500,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Contract {
    /// Truffle build artifact with the ABI and deployments
    pub artifact_path: PathBuf,
    /// Overrides the address recorded in the artifact
    pub address: Option<Address>,
}

impl Default for Contract {
    fn default() -> Self {
        Self {
            artifact_path: PathBuf::from("abi/TKNToken.json"),
            address: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct History {
    pub default_limit: usize,
    pub lookback_blocks: u64,
}

impl Default for History {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_HISTORY_LIMIT,
            lookback_blocks: DEFAULT_LOOKBACK_BLOCKS,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Portal {
    pub token_usd_rate: f64,
    pub confirmation_timeout_secs: u64,
    pub receipt_poll_interval_ms: u64,
}

impl Default for Portal {
    fn default() -> Self {
        Self {
            token_usd_rate: DEFAULT_TOKEN_USD_RATE,
            confirmation_timeout_secs: 120,
            receipt_poll_interval_ms: 500,
        }
    }
}

impl Config {
    pub fn load_from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let url = Url::parse(&self.node.rpc_url)
            .with_context(|| format!("Invalid node.rpc_url: {}", self.node.rpc_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!("node.rpc_url must be http or https, got {}", url.scheme());
        }
        if self.node.request_timeout_secs == 0 {
            bail!("node.request_timeout_secs must be positive");
        }
        if self.history.default_limit == 0 || self.history.lookback_blocks == 0 {
            bail!("history.default_limit and history.lookback_blocks must be positive");
        }
        if !(self.portal.token_usd_rate > 0.0) {
            bail!("portal.token_usd_rate must be positive");
        }
        if self.portal.receipt_poll_interval_ms == 0
            || self.portal.receipt_poll_interval_ms >= self.portal.confirmation_timeout_secs * 1000
        {
            bail!("portal.receipt_poll_interval_ms must be positive and shorter than the confirmation timeout");
        }
        Ok(())
    }

    pub fn rpc_client_config(&self) -> RpcClientConfig {
        RpcClientConfig {
            endpoint: self.node.rpc_url.clone(),
            request_timeout_secs: self.node.request_timeout_secs,
            retry_delay_ms: self.node.retry_delay_ms,
            ..RpcClientConfig::default()
        }
    }

    pub fn portal_settings(&self) -> PortalSettings {
        PortalSettings {
            token_usd_rate: self.portal.token_usd_rate,
            confirmation_timeout: Duration::from_secs(self.portal.confirmation_timeout_secs),
            receipt_poll_interval: Duration::from_millis(self.portal.receipt_poll_interval_ms),
            history_limit: self.history.default_limit,
            lookback_blocks: self.history.lookback_blocks,
        }
    }
}
