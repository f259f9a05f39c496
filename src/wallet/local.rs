//! Local-key wallet transport
//!
//! Signs with a key held in [`SecureWallet`] and talks to the chain over
//! HTTP JSON-RPC. An optional poller watches the endpoint's chain id and
//! reports changes the way a browser wallet emits `chainChanged`.

use super::signer::SecureWallet;
use super::transport::{TransportEvent, WalletTransport};
use crate::{Error, Result};
use alloy::primitives::{Address, TxHash};
use alloy::providers::{Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

const EVENT_CAPACITY: usize = 16;

/// Where the chain poller reads the current chain id from
#[async_trait]
pub trait ChainIdSource: Send + Sync {
    async fn chain_id(&self) -> Result<u64>;
}

/// Chain id straight from a JSON-RPC endpoint
struct RpcChainId {
    url: url::Url,
}

#[async_trait]
impl ChainIdSource for RpcChainId {
    async fn chain_id(&self) -> Result<u64> {
        let provider = ProviderBuilder::new().connect_http(self.url.clone());
        provider
            .get_chain_id()
            .await
            .map_err(|e| Error::Network(format!("Failed to get chain id: {}", e)))
    }
}

pub struct LocalKeyTransport {
    name: String,
    wallet: SecureWallet,
    rpc_url: url::Url,
    events: broadcast::Sender<TransportEvent>,
    poller: Mutex<Option<JoinHandle<()>>>,
}

impl LocalKeyTransport {
    pub fn new(name: impl Into<String>, wallet: SecureWallet, rpc_url: &str) -> Result<Self> {
        let rpc_url: url::Url = rpc_url
            .parse()
            .map_err(|e| Error::Transport(format!("Invalid RPC URL: {}", e)))?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            name: name.into(),
            wallet,
            rpc_url,
            events,
            poller: Mutex::new(None),
        })
    }

    /// Poll the endpoint's chain id and emit `ChainChanged` when it moves
    pub fn watch_chain(&self, initial_chain_id: u64, period: Duration) {
        let source = Arc::new(RpcChainId {
            url: self.rpc_url.clone(),
        });
        self.watch_chain_from(source, initial_chain_id, period);
    }

    /// Same as [`watch_chain`](Self::watch_chain), reading from any source
    pub fn watch_chain_from(
        &self,
        source: Arc<dyn ChainIdSource>,
        initial_chain_id: u64,
        period: Duration,
    ) {
        let events = self.events.clone();

        let handle = tokio::spawn(async move {
            let mut current = initial_chain_id;
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                match source.chain_id().await {
                    Ok(chain_id) if chain_id != current => {
                        tracing::info!(from = current, to = chain_id, "RPC endpoint changed chain");
                        current = chain_id;
                        // No subscribers is fine; the session may not be listening yet
                        let _ = events.send(TransportEvent::ChainChanged(chain_id));
                    }
                    Ok(_) => {}
                    Err(e) => tracing::debug!(error = %e, "Chain id poll failed"),
                }
            }
        });

        if let Ok(mut slot) = self.poller.lock() {
            if let Some(previous) = slot.replace(handle) {
                previous.abort();
            }
        }
    }

    fn stop_polling(&self) {
        if let Ok(mut slot) = self.poller.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

#[async_trait]
impl WalletTransport for LocalKeyTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(vec![self.wallet.address()])
    }

    async fn chain_id(&self) -> Result<u64> {
        RpcChainId {
            url: self.rpc_url.clone(),
        }
        .chain_id()
        .await
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        let provider = ProviderBuilder::new()
            .wallet(self.wallet.wallet().clone())
            .connect_http(self.rpc_url.clone());

        let pending = provider
            .send_transaction(tx)
            .await
            .map_err(|e| Error::Contract(format!("Failed to send transaction: {}", e)))?;

        Ok(*pending.tx_hash())
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<TransportEvent>> {
        Some(self.events.subscribe())
    }

    fn has_disconnect_hook(&self) -> bool {
        true
    }

    async fn disconnect(&self) -> Result<()> {
        self.stop_polling();
        let _ = self.events.send(TransportEvent::Disconnect);
        tracing::debug!(provider = %self.name, "Local transport closed");
        Ok(())
    }
}

impl Drop for LocalKeyTransport {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
    use tokio::sync::broadcast::error::TryRecvError;

    /// Chain id the test moves by hand
    struct SwitchableChain {
        chain_id: AtomicU64,
        polls: AtomicUsize,
    }

    impl SwitchableChain {
        fn new(chain_id: u64) -> Self {
            Self {
                chain_id: AtomicU64::new(chain_id),
                polls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ChainIdSource for SwitchableChain {
        async fn chain_id(&self) -> Result<u64> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            Ok(self.chain_id.load(Ordering::SeqCst))
        }
    }

    fn wallet() -> SecureWallet {
        SecureWallet::from_secret(&SecretString::from(
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80".to_string(),
        ))
        .unwrap()
    }

    #[test]
    fn test_rejects_bad_rpc_url() {
        let result = LocalKeyTransport::new("injected", wallet(), "not a url");
        let err = result.err().expect("bad url rejected");
        assert!(matches!(err, Error::Transport(_)));
        assert!(err.is_recoverable());
    }

    #[tokio::test]
    async fn test_exposes_wallet_account() {
        let transport = LocalKeyTransport::new("injected", wallet(), "http://127.0.0.1:8545").unwrap();
        let accounts = transport.accounts().await.unwrap();

        assert_eq!(accounts, vec![wallet().address()]);
        assert_eq!(transport.name(), "injected");
    }

    #[tokio::test]
    async fn test_disconnect_notifies_subscribers() {
        let transport = LocalKeyTransport::new("injected", wallet(), "http://127.0.0.1:8545").unwrap();
        let mut events = transport.subscribe().expect("local transport pushes events");

        transport.disconnect().await.unwrap();

        assert_eq!(events.recv().await.unwrap(), TransportEvent::Disconnect);
    }

    #[tokio::test(start_paused = true)]
    async fn test_chain_watch_reports_each_switch_once() {
        let transport = LocalKeyTransport::new("injected", wallet(), "http://127.0.0.1:8545").unwrap();
        let mut events = transport.subscribe().unwrap();
        let chain = Arc::new(SwitchableChain::new(1));
        transport.watch_chain_from(chain.clone(), 1, Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(25)).await;
        assert!(chain.polls.load(Ordering::SeqCst) >= 2);
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

        chain.chain_id.store(5, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(events.try_recv().unwrap(), TransportEvent::ChainChanged(5));
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));

        transport.disconnect().await.unwrap();
        assert_eq!(events.try_recv().unwrap(), TransportEvent::Disconnect);
        tokio::task::yield_now().await;

        let polls = chain.polls.load(Ordering::SeqCst);
        chain.chain_id.store(7, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(chain.polls.load(Ordering::SeqCst), polls);
        assert!(matches!(events.try_recv(), Err(TryRecvError::Empty)));
    }
}
