//! Wallet connectivity
//!
//! Transports, the chooser that opens them, and the chain-read wrapper the
//! session builds on. Private keys stay inside [`SecureWallet`].

mod chooser;
mod local;
mod provider;
mod signer;
mod transport;

pub use chooser::{ModalChooser, TransportChooser};
pub use local::{ChainIdSource, LocalKeyTransport};
pub use provider::{ChainProvider, NetworkInfo, SignerHandle};
pub use signer::SecureWallet;
pub use transport::{TransportEvent, WalletTransport};
