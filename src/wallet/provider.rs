//! Chain-read wrapper over a wallet transport

use super::transport::WalletTransport;
use crate::config::network_name;
use crate::{Error, Result};
use alloy::primitives::{Address, TxHash};
use alloy::rpc::types::TransactionRequest;
use serde::Serialize;
use std::sync::Arc;

/// Chain the wallet reported, with its ethers-style name
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NetworkInfo {
    pub chain_id: u64,
    pub name: String,
}

impl NetworkInfo {
    pub fn from_chain_id(chain_id: u64) -> Self {
        Self {
            chain_id,
            name: network_name(chain_id).to_string(),
        }
    }
}

#[derive(Clone)]
pub struct ChainProvider {
    transport: Arc<dyn WalletTransport>,
}

impl ChainProvider {
    pub fn new(transport: Arc<dyn WalletTransport>) -> Self {
        Self { transport }
    }

    /// Resolve the signing account (the first one the wallet exposes)
    pub async fn signer(&self) -> Result<SignerHandle> {
        let address = self
            .transport
            .accounts()
            .await?
            .into_iter()
            .next()
            .ok_or(Error::NoAccount)?;

        Ok(SignerHandle {
            address,
            provider: self.clone(),
        })
    }

    pub async fn network(&self) -> Result<NetworkInfo> {
        let chain_id = self.transport.chain_id().await?;
        Ok(NetworkInfo::from_chain_id(chain_id))
    }
}

impl std::fmt::Debug for ChainProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChainProvider")
            .field("transport", &self.transport.name())
            .finish()
    }
}

/// Authority to send transactions as one account
#[derive(Debug, Clone)]
pub struct SignerHandle {
    address: Address,
    provider: ChainProvider,
}

impl SignerHandle {
    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        self.provider
            .transport
            .send_transaction(tx.from(self.address))
            .await
    }
}
