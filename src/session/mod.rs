//! Wallet session state
//!
//! A session is either fully disconnected or fully connected. The connected
//! variant owns every derived handle (transport, chain provider, account,
//! network, contract), so a half-populated session cannot be built.
//!
//! All transitions go through [`reduce`]; [`SessionManager`] drives it.

mod manager;

pub use manager::SessionManager;

use crate::contract::ScienceFundContract;
use crate::wallet::{ChainProvider, NetworkInfo, TransportEvent, WalletTransport};
use alloy::primitives::Address;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct ConnectedSession {
    session_id: Uuid,
    raw_provider: Arc<dyn WalletTransport>,
    chain_provider: ChainProvider,
    account: Address,
    network: NetworkInfo,
    contract: ScienceFundContract,
    connected_at: DateTime<Utc>,
}

impl ConnectedSession {
    pub fn new(
        raw_provider: Arc<dyn WalletTransport>,
        chain_provider: ChainProvider,
        account: Address,
        network: NetworkInfo,
        contract: ScienceFundContract,
    ) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            raw_provider,
            chain_provider,
            account,
            network,
            contract,
            connected_at: Utc::now(),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn raw_provider(&self) -> &Arc<dyn WalletTransport> {
        &self.raw_provider
    }

    pub fn account(&self) -> Address {
        self.account
    }

    pub fn network(&self) -> &NetworkInfo {
        &self.network
    }

    pub fn contract(&self) -> &ScienceFundContract {
        &self.contract
    }
}

impl std::fmt::Debug for ConnectedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectedSession")
            .field("session_id", &self.session_id)
            .field("raw_provider", &self.raw_provider.name())
            .field("chain_provider", &self.chain_provider)
            .field("account", &self.account)
            .field("network", &self.network)
            .field("contract", &self.contract.address())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Disconnected,
    Connected(ConnectedSession),
}

impl SessionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, SessionState::Connected(_))
    }

    pub fn connected(&self) -> Option<&ConnectedSession> {
        match self {
            SessionState::Connected(session) => Some(session),
            SessionState::Disconnected => None,
        }
    }

    pub fn view(&self) -> SessionView {
        match self {
            SessionState::Connected(session) => SessionView {
                session_id: Some(session.session_id),
                provider: Some(session.raw_provider.name().to_string()),
                account: Some(session.account),
                network_name: Some(session.network.name.clone()),
                chain_id: Some(session.network.chain_id),
                contract: Some(session.contract.address()),
                connected_at: Some(session.connected_at),
            },
            SessionState::Disconnected => SessionView::default(),
        }
    }
}

/// Snapshot of the session handed to the rendering layer
///
/// Every field is `Some` while connected and `None` otherwise.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionView {
    pub session_id: Option<Uuid>,
    pub provider: Option<String>,
    pub account: Option<Address>,
    pub network_name: Option<String>,
    pub chain_id: Option<u64>,
    pub contract: Option<Address>,
    pub connected_at: Option<DateTime<Utc>>,
}

impl SessionView {
    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    /// True when the fields are all present or all absent
    pub fn is_consistent(&self) -> bool {
        let present = [
            self.session_id.is_some(),
            self.provider.is_some(),
            self.account.is_some(),
            self.network_name.is_some(),
            self.chain_id.is_some(),
            self.contract.is_some(),
            self.connected_at.is_some(),
        ];
        present.iter().all(|p| *p) || present.iter().all(|p| !*p)
    }
}

/// State transitions
#[derive(Debug)]
pub enum SessionAction {
    SetProvider(ConnectedSession),
    Reset,
}

/// Apply an action. Each action replaces the whole session.
pub fn reduce(state: &mut SessionState, action: SessionAction) {
    *state = match action {
        SessionAction::SetProvider(session) => SessionState::Connected(session),
        SessionAction::Reset => SessionState::Disconnected,
    };
}

/// What the session asks its owner to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionDirective {
    /// The wallet changed network; tear everything down and start over
    Reload { chain_id: u64 },
}

/// Map a wallet event to the directive it triggers, if any
pub fn directive_for(event: &TransportEvent) -> Option<SessionDirective> {
    match event {
        TransportEvent::ChainChanged(chain_id) => Some(SessionDirective::Reload {
            chain_id: *chain_id,
        }),
        TransportEvent::AccountsChanged(_) | TransportEvent::Disconnect => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockTransport, ACCOUNT, CONTRACT};

    async fn connected_session() -> ConnectedSession {
        let transport: Arc<dyn WalletTransport> = Arc::new(MockTransport::homestead());
        let chain_provider = ChainProvider::new(transport.clone());
        let signer = chain_provider.signer().await.unwrap();
        let network = chain_provider.network().await.unwrap();
        let contract = ScienceFundContract::bind(CONTRACT, signer.clone());
        ConnectedSession::new(transport, chain_provider, signer.address(), network, contract)
    }

    #[tokio::test]
    async fn test_reduce_replaces_whole_session() {
        let mut state = SessionState::default();
        assert!(state.view().is_consistent());
        assert!(!state.view().is_connected());

        let first = connected_session().await;
        let first_id = first.session_id();
        reduce(&mut state, SessionAction::SetProvider(first));
        let view = state.view();
        assert!(view.is_consistent());
        assert_eq!(view.account, Some(ACCOUNT));
        assert_eq!(view.network_name.as_deref(), Some("homestead"));

        reduce(&mut state, SessionAction::SetProvider(connected_session().await));
        assert_ne!(state.view().session_id, Some(first_id));

        reduce(&mut state, SessionAction::Reset);
        assert_eq!(state.view(), SessionView::default());
    }

    #[test]
    fn test_only_chain_changes_reload() {
        assert_eq!(
            directive_for(&TransportEvent::ChainChanged(4)),
            Some(SessionDirective::Reload { chain_id: 4 })
        );
        assert_eq!(directive_for(&TransportEvent::AccountsChanged(vec![ACCOUNT])), None);
        assert_eq!(directive_for(&TransportEvent::Disconnect), None);
    }

    #[test]
    fn test_partial_view_is_inconsistent() {
        let view = SessionView {
            account: Some(ACCOUNT),
            ..SessionView::default()
        };
        assert!(!view.is_consistent());
    }
}
