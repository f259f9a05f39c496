//! Wallet transport abstraction
//!
//! A transport is an established connection to a wallet. It answers the
//! handful of EIP-1193 requests the session needs and, when the wallet can
//! push events, hands out a subscription to them.

use crate::Result;
use alloy::primitives::{Address, TxHash};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use tokio::sync::broadcast;

/// Events a wallet pushes to its subscribers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The wallet moved to another chain
    ChainChanged(u64),
    /// The exposed account set changed
    AccountsChanged(Vec<Address>),
    /// The wallet closed the connection
    Disconnect,
}

#[async_trait]
pub trait WalletTransport: Send + Sync {
    /// Provider id this transport was built from
    fn name(&self) -> &str;

    /// Accounts the wallet exposes, signer first
    async fn accounts(&self) -> Result<Vec<Address>>;

    /// Chain the wallet is currently on
    async fn chain_id(&self) -> Result<u64>;

    /// Sign and submit a transaction
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash>;

    /// Subscribe to wallet events. `None` when the wallet cannot push events.
    fn subscribe(&self) -> Option<broadcast::Receiver<TransportEvent>> {
        None
    }

    /// Whether the transport carries its own disconnect hook
    fn has_disconnect_hook(&self) -> bool {
        false
    }

    /// Transport-specific teardown
    async fn disconnect(&self) -> Result<()> {
        Ok(())
    }
}
