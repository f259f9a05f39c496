//! Science Fund Minter
//!
//! Wallet session and minting client for the Science Fund donation token:
//! - Connect a wallet through a pluggable provider chooser
//! - Track the active account, network and a signer-bound contract handle
//! - Validate donations and dispatch the payable `mint` call
//!
//! # Session Model
//!
//! - A session is either fully connected or fully disconnected
//! - Network changes are never patched in place; the owner restarts
//! - Private keys never leave the wallet module

pub mod config;
pub mod contract;
pub mod donation;
pub mod session;
pub mod wallet;

mod error;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use config::{Config, RpcConfig, CONTRACT_ADDRESS_ENV};
pub use contract::ScienceFundContract;
pub use donation::{Donation, DonationForm, FundingPool};
pub use error::{Error, Result};
pub use session::{SessionDirective, SessionManager, SessionView};
