//! Wallet provider chooser
//!
//! The chooser is the only place that knows how to turn a provider option
//! into a live transport. Sessions receive it as an explicit dependency, so
//! tests swap in their own.

use super::local::LocalKeyTransport;
use super::signer::SecureWallet;
use super::transport::WalletTransport;
use crate::config::{ModalConfig, ProviderKind, ProviderOption, RpcConfig};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

#[async_trait]
pub trait TransportChooser: Send + Sync {
    /// Select a provider and open a transport to it. May wait on the user.
    async fn connect(&self) -> Result<Arc<dyn WalletTransport>>;

    /// Provider id remembered from an earlier connect, if any
    async fn cached_provider(&self) -> Option<String>;

    /// Forget the remembered provider
    async fn clear_cached_provider(&self) -> Result<()>;
}

/// On-disk record of the last chosen provider
#[derive(Debug, Serialize, Deserialize)]
struct CachedProvider {
    provider: String,
    cached_at: DateTime<Utc>,
}

type KeyLookup = dyn Fn(&str) -> Option<String> + Send + Sync;

/// Chooser over the providers listed in [`ModalConfig`]
pub struct ModalChooser {
    config: ModalConfig,
    rpc: RpcConfig,
    key_lookup: Arc<KeyLookup>,
}

impl ModalChooser {
    pub fn new(config: ModalConfig, rpc: RpcConfig) -> Self {
        Self {
            config,
            rpc,
            key_lookup: Arc::new(|var| std::env::var(var).ok()),
        }
    }

    /// Read wallet keys through a custom lookup instead of the environment
    pub fn with_key_lookup<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.key_lookup = Arc::new(lookup);
        self
    }

    /// Override the configured preferred provider
    pub fn with_preferred(mut self, preferred: Option<String>) -> Self {
        if preferred.is_some() {
            self.config.preferred = preferred;
        }
        self
    }

    fn find(&self, id: &str) -> Option<&ProviderOption> {
        self.config.providers.iter().find(|p| p.id == id)
    }

    /// Cached choice first, then the preferred one, then the only one
    async fn select(&self) -> Result<&ProviderOption> {
        if let Some(cached) = self.cached_provider().await {
            if let Some(option) = self.find(&cached) {
                return Ok(option);
            }
            tracing::warn!(provider = %cached, "Cached provider is no longer configured");
        }

        if let Some(preferred) = &self.config.preferred {
            return self
                .find(preferred)
                .ok_or_else(|| Error::Unavailable(format!("Unknown provider '{}'", preferred)));
        }

        match self.config.providers.as_slice() {
            [only] => Ok(only),
            [] => Err(Error::Unavailable(
                "No wallet providers configured".to_string(),
            )),
            _ => Err(Error::Rejected(
                "Several wallet providers configured; choose one with --provider".to_string(),
            )),
        }
    }

    async fn build(&self, option: &ProviderOption) -> Result<Arc<dyn WalletTransport>> {
        match &option.kind {
            ProviderKind::LocalKey { key_env } => {
                let key = (self.key_lookup)(key_env).ok_or_else(|| {
                    Error::Unavailable(format!(
                        "No wallet found: {} is not set for provider '{}'",
                        key_env, option.id
                    ))
                })?;
                let wallet = SecureWallet::from_secret(&SecretString::from(key))?;

                let network = self.config.network;
                let rpc_url = self.rpc.get(network.chain_id()).ok_or_else(|| {
                    Error::Unavailable(format!("No RPC URL configured for {}", network.name()))
                })?;

                let local = LocalKeyTransport::new(option.id.clone(), wallet, rpc_url)?;
                if let Some(secs) = self.config.chain_poll_secs.filter(|s| *s > 0) {
                    let chain_id = local.chain_id().await?;
                    local.watch_chain(chain_id, Duration::from_secs(secs));
                }
                let transport: Arc<dyn WalletTransport> = Arc::new(local);
                Ok(transport)
            }
        }
    }

    async fn remember(&self, provider: &str) -> Result<()> {
        let record = CachedProvider {
            provider: provider.to_string(),
            cached_at: Utc::now(),
        };
        let path = &self.config.cache_path;
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(path, serde_json::to_vec_pretty(&record)?).await?;
        Ok(())
    }
}

#[async_trait]
impl TransportChooser for ModalChooser {
    async fn connect(&self) -> Result<Arc<dyn WalletTransport>> {
        let option = self.select().await?;
        tracing::info!(provider = %option.id, network = self.config.network.name(), "Opening wallet");

        let transport = self.build(option).await?;

        if self.config.cache_provider {
            if let Err(e) = self.remember(&option.id).await {
                tracing::warn!(error = %e, "Failed to cache provider choice");
            }
        }
        Ok(transport)
    }

    async fn cached_provider(&self) -> Option<String> {
        if !self.config.cache_provider {
            return None;
        }
        let content = tokio::fs::read(&self.config.cache_path).await.ok()?;
        match serde_json::from_slice::<CachedProvider>(&content) {
            Ok(record) => Some(record.provider),
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable provider cache");
                None
            }
        }
    }

    async fn clear_cached_provider(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.config.cache_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
