//! Science Fund contract binding
//!
//! Binds the deployed contract address to the session's signer. The handle
//! only encodes and dispatches calls; all contract logic lives on chain.

use crate::donation::Donation;
use crate::wallet::SignerHandle;
use crate::Result;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;

alloy::sol! {
    interface IScienceFund {
        function mint(uint8 pool) external payable;
    }
}

#[derive(Debug, Clone)]
pub struct ScienceFundContract {
    address: Address,
    signer: SignerHandle,
}

impl ScienceFundContract {
    pub fn bind(address: Address, signer: SignerHandle) -> Self {
        Self { address, signer }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Account every call from this handle is sent as
    pub fn signer_address(&self) -> Address {
        self.signer.address()
    }

    /// Build the payable `mint` call for a donation without sending it
    pub fn mint_request(&self, donation: &Donation) -> TransactionRequest {
        let data = IScienceFund::mintCall {
            pool: donation.pool.id(),
        }
        .abi_encode();

        TransactionRequest::default()
            .from(self.signer.address())
            .to(self.address)
            .input(Bytes::from(data).into())
            .value(donation.value)
    }

    pub async fn mint(&self, donation: &Donation) -> Result<TxHash> {
        let tx = self.mint_request(donation);
        tracing::info!(
            contract = %self.address,
            from = %self.signer.address(),
            pool = donation.pool.label(),
            value = %donation.value,
            "Sending mint"
        );
        self.signer.send_transaction(tx).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DonationConfig;
    use crate::donation::{DonationForm, FundingPool};
    use crate::testing::{MockTransport, ACCOUNT, CONTRACT};
    use crate::wallet::{ChainProvider, WalletTransport};
    use alloy::primitives::{TxKind, U256};
    use std::sync::Arc;

    async fn bound(transport: Arc<MockTransport>) -> ScienceFundContract {
        let transport: Arc<dyn WalletTransport> = transport;
        let signer = ChainProvider::new(transport).signer().await.unwrap();
        ScienceFundContract::bind(CONTRACT, signer)
    }

    #[tokio::test]
    async fn test_mint_request_targets_contract() {
        let contract = bound(Arc::new(MockTransport::homestead())).await;
        let donation = DonationForm::new(FundingPool::GeneralPool, "0.5")
            .validate(&DonationConfig::default())
            .unwrap();

        let tx = contract.mint_request(&donation);
        assert_eq!(tx.from, Some(ACCOUNT));
        assert_eq!(tx.to, Some(TxKind::Call(CONTRACT)));
        assert_eq!(tx.value, Some(U256::from(500_000_000_000_000_000u128)));

        let input = tx.input.input().expect("calldata");
        assert_eq!(&input[..4], IScienceFund::mintCall::SELECTOR.as_slice());
        let decoded = IScienceFund::mintCall::abi_decode(input).unwrap();
        assert_eq!(decoded.pool, 1);
    }

    #[tokio::test]
    async fn test_mint_sends_as_signer() {
        let transport = Arc::new(MockTransport::homestead());
        let contract = bound(transport.clone()).await;
        let donation = DonationForm::new(FundingPool::PandemicPreparedness, "1")
            .validate(&DonationConfig::default())
            .unwrap();

        contract.mint(&donation).await.unwrap();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].from, Some(contract.signer_address()));
    }
}
