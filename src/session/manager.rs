//! Session manager
//!
//! Owns the connect/disconnect lifecycle and the wallet event subscription.
//!
//! - One `connect()` at a time. A second call while one is pending gets
//!   [`Error::ConnectInFlight`]; the pending one keeps going.
//! - `disconnect()` bumps the session generation. A connect that started
//!   under an older generation drops its result with [`Error::Superseded`],
//!   closes the transport it opened and forgets the provider it cached.
//! - Reconnecting over a live session closes the old transport, unless the
//!   chooser handed back the same one.
//! - Chain changes are never reconciled in place. Each one becomes a
//!   [`SessionDirective::Reload`] on the channel returned by [`SessionManager::new`].

use super::{
    directive_for, reduce, ConnectedSession, SessionAction, SessionDirective, SessionState,
    SessionView,
};
use crate::contract::ScienceFundContract;
use crate::wallet::{ChainProvider, TransportChooser, TransportEvent, WalletTransport};
use crate::{Error, Result};
use alloy::primitives::Address;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

pub struct SessionManager {
    chooser: Arc<dyn TransportChooser>,
    contract_address: Address,
    state: RwLock<SessionState>,
    view: watch::Sender<SessionView>,
    connect_gate: Mutex<()>,
    generation: AtomicU64,
    listener: Mutex<Option<JoinHandle<()>>>,
    directives: mpsc::UnboundedSender<SessionDirective>,
}

impl SessionManager {
    /// Create a disconnected manager and the channel its directives arrive on
    pub fn new(
        chooser: Arc<dyn TransportChooser>,
        contract_address: Address,
    ) -> (Self, mpsc::UnboundedReceiver<SessionDirective>) {
        let (directives, directive_rx) = mpsc::unbounded_channel();
        let (view, _) = watch::channel(SessionView::default());

        let manager = Self {
            chooser,
            contract_address,
            state: RwLock::new(SessionState::Disconnected),
            view,
            connect_gate: Mutex::new(()),
            generation: AtomicU64::new(0),
            listener: Mutex::new(None),
            directives,
        };
        (manager, directive_rx)
    }

    /// Reconnect without user interaction when a provider choice is cached
    ///
    /// Returns whether a connect was attempted and succeeded.
    pub async fn activate(&self) -> Result<bool> {
        match self.chooser.cached_provider().await {
            Some(provider) => {
                info!(%provider, "Reconnecting cached wallet provider");
                self.connect().await?;
                Ok(true)
            }
            None => {
                debug!("No cached wallet provider");
                Ok(false)
            }
        }
    }

    pub async fn connect(&self) -> Result<SessionView> {
        let _in_flight = self
            .connect_gate
            .try_lock()
            .map_err(|_| Error::ConnectInFlight)?;
        let generation = self.generation.load(Ordering::SeqCst);

        let session = self.establish().await?;

        let mut state = self.state.write().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            warn!(
                session_id = %session.session_id(),
                "Disconnect arrived while connecting, dropping new session"
            );
            drop(state);
            close_transport(&session).await;
            // The chooser cached this provider after disconnect cleared it
            if let Err(e) = self.chooser.clear_cached_provider().await {
                warn!(error = %e, "Failed to clear cached wallet provider");
            }
            return Err(Error::Superseded);
        }

        let events = session.raw_provider().subscribe();
        let session_id = session.session_id();
        info!(
            %session_id,
            account = %session.account(),
            network = %session.network().name,
            provider = session.raw_provider().name(),
            "Wallet connected"
        );

        let transport = session.raw_provider().clone();
        let previous = std::mem::take(&mut *state);
        reduce(&mut state, SessionAction::SetProvider(session));
        self.install_listener(session_id, events).await;

        let view = state.view();
        self.view.send_replace(view.clone());
        drop(state);

        if let SessionState::Connected(previous) = previous {
            if !same_transport(previous.raw_provider(), &transport) {
                debug!(session_id = %previous.session_id(), "Closing replaced wallet transport");
                close_transport(&previous).await;
            }
        }
        Ok(view)
    }

    /// Drop the session. Safe to call in any state.
    pub async fn disconnect(&self) {
        if let Err(e) = self.chooser.clear_cached_provider().await {
            warn!(error = %e, "Failed to clear cached wallet provider");
        }

        let previous = {
            let mut state = self.state.write().await;
            self.generation.fetch_add(1, Ordering::SeqCst);
            let previous = std::mem::take(&mut *state);
            reduce(&mut state, SessionAction::Reset);
            self.stop_listener().await;
            self.view.send_replace(state.view());
            previous
        };

        match previous {
            SessionState::Connected(session) => {
                close_transport(&session).await;
                info!(session_id = %session.session_id(), "Wallet disconnected");
            }
            SessionState::Disconnected => debug!("Disconnect while already disconnected"),
        }
    }

    /// Chooser → chain provider → signer → network → contract
    async fn establish(&self) -> Result<ConnectedSession> {
        let transport = self.chooser.connect().await?;
        let chain_provider = ChainProvider::new(transport.clone());
        let signer = chain_provider.signer().await?;
        let network = chain_provider.network().await?;
        let contract = ScienceFundContract::bind(self.contract_address, signer.clone());

        Ok(ConnectedSession::new(
            transport,
            chain_provider,
            signer.address(),
            network,
            contract,
        ))
    }

    async fn install_listener(
        &self,
        session_id: Uuid,
        events: Option<broadcast::Receiver<TransportEvent>>,
    ) {
        let mut slot = self.listener.lock().await;
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        if let Some(events) = events {
            let directives = self.directives.clone();
            *slot = Some(tokio::spawn(forward_events(session_id, events, directives)));
        }
    }

    async fn stop_listener(&self) {
        if let Some(handle) = self.listener.lock().await.take() {
            handle.abort();
        }
    }

    pub fn view(&self) -> SessionView {
        self.view.borrow().clone()
    }

    /// Watch every committed change to the session
    pub fn subscribe(&self) -> watch::Receiver<SessionView> {
        self.view.subscribe()
    }

    pub async fn is_connected(&self) -> bool {
        self.state.read().await.is_connected()
    }

    pub async fn account(&self) -> Option<Address> {
        self.state.read().await.connected().map(|s| s.account())
    }

    pub async fn network_name(&self) -> Option<String> {
        self.state
            .read()
            .await
            .connected()
            .map(|s| s.network().name.clone())
    }

    pub async fn contract(&self) -> Option<ScienceFundContract> {
        self.state
            .read()
            .await
            .connected()
            .map(|s| s.contract().clone())
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Some(handle) = self.listener.get_mut().take() {
            handle.abort();
        }
    }
}

fn same_transport(a: &Arc<dyn WalletTransport>, b: &Arc<dyn WalletTransport>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

async fn close_transport(session: &ConnectedSession) {
    let transport = session.raw_provider();
    if !transport.has_disconnect_hook() {
        return;
    }
    if let Err(e) = transport.disconnect().await {
        warn!(error = %e, provider = transport.name(), "Wallet disconnect hook failed");
    }
}

async fn forward_events(
    session_id: Uuid,
    mut events: broadcast::Receiver<TransportEvent>,
    directives: mpsc::UnboundedSender<SessionDirective>,
) {
    loop {
        match events.recv().await {
            Ok(event) => match directive_for(&event) {
                Some(directive) => {
                    info!(%session_id, ?directive, "Wallet changed network");
                    if directives.send(directive).is_err() {
                        break;
                    }
                }
                None => debug!(%session_id, ?event, "Ignoring wallet event"),
            },
            Err(RecvError::Lagged(skipped)) => {
                warn!(%session_id, skipped, "Wallet event listener lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
