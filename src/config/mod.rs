//! Configuration for the minter
//!
//! Loaded once at startup from an optional JSON file, then overridden by the
//! environment. The deployed contract address is the only value without a
//! usable default.

pub mod rpc;

use crate::{Error, Result};
use alloy::primitives::Address;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

// Re-export RPC config
pub use rpc::RpcConfig;

/// Deployed Science Fund contract address environment variable name
pub const CONTRACT_ADDRESS_ENV: &str = "SCIENCE_FUND_CONTRACT_ADDRESS";

/// Default environment variable holding the local wallet key
pub const PRIVATE_KEY_ENV: &str = "PRIVATE_KEY";

/// Networks the wallet may report, named the way ethers names them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[serde(alias = "mainnet")]
    Homestead,
    Ropsten,
    Rinkeby,
    Goerli,
    Sepolia,
    #[serde(alias = "polygon")]
    Matic,
    Arbitrum,
    Optimism,
    Base,
}

impl Network {
    pub fn chain_id(&self) -> u64 {
        match self {
            Network::Homestead => 1,
            Network::Ropsten => 3,
            Network::Rinkeby => 4,
            Network::Goerli => 5,
            Network::Sepolia => 11_155_111,
            Network::Matic => 137,
            Network::Arbitrum => 42161,
            Network::Optimism => 10,
            Network::Base => 8453,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Network::Homestead => "homestead",
            Network::Ropsten => "ropsten",
            Network::Rinkeby => "rinkeby",
            Network::Goerli => "goerli",
            Network::Sepolia => "sepolia",
            Network::Matic => "matic",
            Network::Arbitrum => "arbitrum",
            Network::Optimism => "optimism",
            Network::Base => "base",
        }
    }

    pub fn from_chain_id(chain_id: u64) -> Option<Self> {
        [
            Network::Homestead,
            Network::Ropsten,
            Network::Rinkeby,
            Network::Goerli,
            Network::Sepolia,
            Network::Matic,
            Network::Arbitrum,
            Network::Optimism,
            Network::Base,
        ]
        .into_iter()
        .find(|n| n.chain_id() == chain_id)
    }
}

/// Human-readable name for a chain id; `unknown` for chains we don't name
pub fn network_name(chain_id: u64) -> &'static str {
    Network::from_chain_id(chain_id)
        .map(|n| n.name())
        .unwrap_or("unknown")
}

fn default_key_env() -> String {
    PRIVATE_KEY_ENV.to_string()
}

/// How a wallet provider option builds its transport
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProviderKind {
    /// A locally held key read from an environment variable
    LocalKey {
        #[serde(default = "default_key_env")]
        key_env: String,
    },
}

/// A named entry in the wallet chooser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderOption {
    pub id: String,
    #[serde(flatten)]
    pub kind: ProviderKind,
}

/// Wallet chooser settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalConfig {
    /// Network the chooser connects transports to
    pub network: Network,
    /// Remember the chosen provider across runs
    pub cache_provider: bool,
    /// Where the cached provider choice is written
    pub cache_path: PathBuf,
    /// Provider to pick when nothing is cached and several are configured
    pub preferred: Option<String>,
    /// Available providers
    pub providers: Vec<ProviderOption>,
    /// Seconds between chain id polls on local transports; `None` disables
    pub chain_poll_secs: Option<u64>,
}

impl Default for ModalConfig {
    fn default() -> Self {
        Self {
            network: Network::Homestead,
            cache_provider: true,
            cache_path: PathBuf::from(".science-fund/provider.json"),
            preferred: None,
            providers: vec![ProviderOption {
                id: "injected".to_string(),
                kind: ProviderKind::LocalKey {
                    key_env: default_key_env(),
                },
            }],
            chain_poll_secs: Some(12),
        }
    }
}

/// Donation form settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DonationConfig {
    /// Minimum donation in ETH, as a decimal string
    pub min_eth: String,
    /// Placeholder ETH/USD rate used for the displayed estimate
    pub eth_usd_rate: f64,
}

impl Default for DonationConfig {
    fn default() -> Self {
        Self {
            min_eth: "0.3".to_string(),
            eth_usd_rate: 3600.0,
        }
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Deployed Science Fund contract
    pub contract_address: Option<Address>,
    /// Wallet chooser settings
    pub modal: ModalConfig,
    /// Donation form settings
    pub donation: DonationConfig,
}

impl Config {
    /// Load from an optional file and apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)
                    .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
                serde_json::from_str(&content)
                    .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?
            }
            None => Config::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply environment overrides using the given lookup
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(CONTRACT_ADDRESS_ENV) {
            let address = Address::from_str(raw.trim()).map_err(|e| {
                Error::Config(format!("{} is not an address: {}", CONTRACT_ADDRESS_ENV, e))
            })?;
            tracing::debug!(%address, "Using contract address from environment");
            self.contract_address = Some(address);
        }
        Ok(())
    }

    /// The deployed contract address, required before any session can bind
    pub fn contract_address(&self) -> Result<Address> {
        self.contract_address.ok_or_else(|| {
            Error::Config(format!(
                "No contract address configured. Set {} or contract_address in the config file.",
                CONTRACT_ADDRESS_ENV
            ))
        })
    }
}
