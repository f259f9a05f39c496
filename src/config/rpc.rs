//! RPC endpoint configuration
//!
//! Resolution order:
//! 1. Per-chain env vars (ETH_RPC_URL, SEPOLIA_RPC_URL, etc.) - highest priority
//! 2. INFURA_API_KEY - builds URLs for every chain Infura serves
//! 3. Public RPC fallbacks - for testing only
//!
//! ```bash
//! export ETH_RPC_URL="https://eth-mainnet.g.alchemy.com/v2/YOUR_KEY"
//! # or
//! export INFURA_API_KEY="YOUR_KEY"
//! ```

use std::collections::HashMap;

/// RPC configuration for the chains a wallet may sit on
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// RPC URLs indexed by chain ID
    urls: HashMap<u64, String>,
}

/// Chain ID constants
pub mod chains {
    pub const HOMESTEAD: u64 = 1;
    pub const RINKEBY: u64 = 4;
    pub const GOERLI: u64 = 5;
    pub const SEPOLIA: u64 = 11_155_111;
    pub const POLYGON: u64 = 137;
}

/// Environment variable names
mod env_vars {
    pub const ETH_RPC_URL: &str = "ETH_RPC_URL";
    pub const RINKEBY_RPC_URL: &str = "RINKEBY_RPC_URL";
    pub const GOERLI_RPC_URL: &str = "GOERLI_RPC_URL";
    pub const SEPOLIA_RPC_URL: &str = "SEPOLIA_RPC_URL";
    pub const POLYGON_RPC_URL: &str = "POLYGON_RPC_URL";

    pub const INFURA_API_KEY: &str = "INFURA_API_KEY";
}

/// Public RPC endpoints (rate limited, for testing only)
mod public_rpcs {
    pub const HOMESTEAD: &str = "https://eth.llamarpc.com";
    pub const SEPOLIA: &str = "https://rpc.sepolia.org";
    pub const POLYGON: &str = "https://polygon-rpc.com";
}

impl RpcConfig {
    /// Create RPC config from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create RPC config from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut urls = HashMap::new();

        let per_chain = [
            (env_vars::ETH_RPC_URL, chains::HOMESTEAD),
            (env_vars::RINKEBY_RPC_URL, chains::RINKEBY),
            (env_vars::GOERLI_RPC_URL, chains::GOERLI),
            (env_vars::SEPOLIA_RPC_URL, chains::SEPOLIA),
            (env_vars::POLYGON_RPC_URL, chains::POLYGON),
        ];
        for (var, chain_id) in per_chain {
            if let Some(url) = lookup(var) {
                tracing::debug!(chain_id, "Using {} for RPC", var);
                urls.insert(chain_id, url);
            }
        }

        if urls.is_empty() {
            if let Some(key) = lookup(env_vars::INFURA_API_KEY) {
                tracing::info!("Building RPC URLs from INFURA_API_KEY");
                urls.insert(
                    chains::HOMESTEAD,
                    format!("https://mainnet.infura.io/v3/{}", key),
                );
                urls.insert(
                    chains::GOERLI,
                    format!("https://goerli.infura.io/v3/{}", key),
                );
                urls.insert(
                    chains::SEPOLIA,
                    format!("https://sepolia.infura.io/v3/{}", key),
                );
                urls.insert(
                    chains::POLYGON,
                    format!("https://polygon-mainnet.infura.io/v3/{}", key),
                );
            }
        }

        if !urls.contains_key(&chains::HOMESTEAD) {
            tracing::warn!("No RPC configured for mainnet, using public RPC (rate limited)");
        }
        urls.entry(chains::HOMESTEAD)
            .or_insert_with(|| public_rpcs::HOMESTEAD.to_string());
        urls.entry(chains::SEPOLIA)
            .or_insert_with(|| public_rpcs::SEPOLIA.to_string());
        urls.entry(chains::POLYGON)
            .or_insert_with(|| public_rpcs::POLYGON.to_string());

        Self { urls }
    }

    /// Create with explicit RPC URLs
    pub fn with_urls(urls: HashMap<u64, String>) -> Self {
        Self { urls }
    }

    /// Get RPC URL for a chain
    pub fn get(&self, chain_id: u64) -> Option<&str> {
        self.urls.get(&chain_id).map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_fallbacks_without_env() {
        let config = RpcConfig::from_lookup(|_| None);

        assert_eq!(config.get(chains::HOMESTEAD), Some(public_rpcs::HOMESTEAD));
        assert_eq!(config.get(chains::SEPOLIA), Some(public_rpcs::SEPOLIA));
        assert_eq!(config.get(chains::RINKEBY), None);
    }

    #[test]
    fn test_per_chain_url_wins() {
        let config = RpcConfig::from_lookup(|key| match key {
            "ETH_RPC_URL" => Some("https://custom.rpc".to_string()),
            "INFURA_API_KEY" => Some("ignored".to_string()),
            _ => None,
        });

        assert_eq!(config.get(chains::HOMESTEAD), Some("https://custom.rpc"));
        assert_eq!(config.get(chains::GOERLI), None);
    }

    #[test]
    fn test_infura_key_builds_urls() {
        let config = RpcConfig::from_lookup(|key| {
            (key == "INFURA_API_KEY").then(|| "abc123".to_string())
        });

        assert_eq!(
            config.get(chains::GOERLI),
            Some("https://goerli.infura.io/v3/abc123")
        );
        assert_eq!(
            config.get(chains::HOMESTEAD),
            Some("https://mainnet.infura.io/v3/abc123")
        );
    }

    #[test]
    fn test_get_returns_url() {
        let mut urls = HashMap::new();
        urls.insert(1, "https://custom.rpc".to_string());
        let config = RpcConfig::with_urls(urls);

        assert_eq!(config.get(1), Some("https://custom.rpc"));
        assert_eq!(config.get(999), None);
    }
}
