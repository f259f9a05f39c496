//! Error types for the minter

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Wallet selection rejected: {0}")]
    Rejected(String),

    #[error("No wallet provider available: {0}")]
    Unavailable(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Network identification failed: {0}")]
    Network(String),

    #[error("Wallet exposed no accounts")]
    NoAccount,

    #[error("A connect request is already in flight")]
    ConnectInFlight,

    #[error("Connect superseded by a disconnect")]
    Superseded,

    #[error("Wallet is not connected")]
    NotConnected,

    #[error("Invalid donation: {0}")]
    Donation(String),

    #[error("Contract call failed: {0}")]
    Contract(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the user can recover by invoking the operation again.
    ///
    /// Nothing in the crate retries on its own; this only tells the
    /// rendering layer whether to keep offering the action.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Config(_) | Error::Io(_) | Error::Json(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
