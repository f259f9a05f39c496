//! Test doubles for the wallet layer.
//!
//! [`MockTransport`] answers account and chain queries from fixed values and
//! lets a test push wallet events. [`MockChooser`] hands it out, optionally
//! parking inside `connect()` until released so tests can observe an
//! in-flight connect.

use crate::wallet::{TransportChooser, TransportEvent, WalletTransport};
use crate::{Error, Result};
use alloy::primitives::{address, Address, TxHash, B256};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, Notify};

pub const ACCOUNT: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");
pub const CONTRACT: Address = address!("5fbdb2315678afecb367f032d93f642f64180aa3");

pub struct MockTransport {
    accounts: Vec<Address>,
    chain_id: u64,
    fail_chain_id: bool,
    events: broadcast::Sender<TransportEvent>,
    pub disconnects: AtomicUsize,
    pub sent: Mutex<Vec<TransactionRequest>>,
}

impl MockTransport {
    pub fn new(accounts: Vec<Address>, chain_id: u64) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            accounts,
            chain_id,
            fail_chain_id: false,
            events,
            disconnects: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn homestead() -> Self {
        Self::new(vec![ACCOUNT], 1)
    }

    pub fn failing_network(mut self) -> Self {
        self.fail_chain_id = true;
        self
    }

    pub fn emit(&self, event: TransportEvent) -> usize {
        self.events.send(event).unwrap_or(0)
    }

    pub fn listeners(&self) -> usize {
        self.events.receiver_count()
    }
}

#[async_trait]
impl WalletTransport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.accounts.clone())
    }

    async fn chain_id(&self) -> Result<u64> {
        if self.fail_chain_id {
            return Err(Error::Network("rpc unreachable".to_string()));
        }
        Ok(self.chain_id)
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<TxHash> {
        self.sent.lock().unwrap().push(tx);
        Ok(B256::repeat_byte(0x11))
    }

    fn subscribe(&self) -> Option<broadcast::Receiver<TransportEvent>> {
        Some(self.events.subscribe())
    }

    fn has_disconnect_hook(&self) -> bool {
        true
    }

    async fn disconnect(&self) -> Result<()> {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

pub struct MockChooser {
    transport: Mutex<Arc<MockTransport>>,
    cached: Mutex<Option<String>>,
    reject: AtomicBool,
    gate: Option<Arc<Notify>>,
    pub connects: AtomicUsize,
    pub clears: AtomicUsize,
}

impl MockChooser {
    pub fn new(transport: Arc<MockTransport>) -> Self {
        Self {
            transport: Mutex::new(transport),
            cached: Mutex::new(None),
            reject: AtomicBool::new(false),
            gate: None,
            connects: AtomicUsize::new(0),
            clears: AtomicUsize::new(0),
        }
    }

    /// Park every `connect()` until the returned notify is signalled
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(gate.clone());
        (self, gate)
    }

    pub fn with_cached(self, provider: &str) -> Self {
        *self.cached.lock().unwrap() = Some(provider.to_string());
        self
    }

    pub fn reject_next(&self, reject: bool) {
        self.reject.store(reject, Ordering::SeqCst);
    }

    /// Hand out a different transport from the next `connect()` on
    pub fn switch_transport(&self, transport: Arc<MockTransport>) {
        *self.transport.lock().unwrap() = transport;
    }
}

#[async_trait]
impl TransportChooser for MockChooser {
    async fn connect(&self) -> Result<Arc<dyn WalletTransport>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.reject.load(Ordering::SeqCst) {
            return Err(Error::Rejected("user closed the wallet prompt".to_string()));
        }
        *self.cached.lock().unwrap() = Some("mock".to_string());
        let transport: Arc<dyn WalletTransport> = self.transport.lock().unwrap().clone();
        Ok(transport)
    }

    async fn cached_provider(&self) -> Option<String> {
        self.cached.lock().unwrap().clone()
    }

    async fn clear_cached_provider(&self) -> Result<()> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        *self.cached.lock().unwrap() = None;
        Ok(())
    }
}
