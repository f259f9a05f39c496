//! Donation form model
//!
//! Pool choice, amount parsing, the minimum donation and the placeholder
//! USD estimate shown next to the amount.

use crate::config::DonationConfig;
use crate::{Error, Result};
use alloy::primitives::utils::{parse_ether, parse_units, ParseUnits};
use alloy::primitives::U256;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Funding pools a donation can go to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingPool {
    #[default]
    PandemicPreparedness,
    GeneralPool,
}

impl FundingPool {
    /// Pool index passed to the contract
    pub fn id(&self) -> u8 {
        match self {
            FundingPool::PandemicPreparedness => 0,
            FundingPool::GeneralPool => 1,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FundingPool::PandemicPreparedness => "Pandemic Preparedness",
            FundingPool::GeneralPool => "Science Fund General Pool",
        }
    }
}

impl FromStr for FundingPool {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pandemic" | "pandemic-preparedness" | "pandemic_preparedness" => {
                Ok(FundingPool::PandemicPreparedness)
            }
            "general" | "general-pool" | "general_pool" => Ok(FundingPool::GeneralPool),
            _ => Err(Error::Donation(format!(
                "Unknown funding pool '{}'. Use 'pandemic' or 'general'",
                s
            ))),
        }
    }
}

/// Raw form input, as typed
#[derive(Debug, Clone, Default)]
pub struct DonationForm {
    pub pool: FundingPool,
    pub amount: String,
}

/// A validated donation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Donation {
    pub pool: FundingPool,
    /// Amount in ETH as entered
    pub amount_eth: f64,
    /// Amount in wei, sent as the transaction value
    pub value: U256,
}

impl DonationForm {
    pub fn new(pool: FundingPool, amount: impl Into<String>) -> Self {
        Self {
            pool,
            amount: amount.into(),
        }
    }

    pub fn validate(&self, config: &DonationConfig) -> Result<Donation> {
        let amount = self.amount.trim();
        if amount.is_empty() {
            return Err(Error::Donation("Amount is required".to_string()));
        }

        let value = match parse_units(amount, "ether") {
            Ok(ParseUnits::U256(value)) => value,
            Ok(ParseUnits::I256(_)) => {
                return Err(Error::Donation("Amount must be positive".to_string()))
            }
            Err(e) => {
                return Err(Error::Donation(format!(
                    "'{}' is not an ETH amount: {}",
                    amount, e
                )))
            }
        };
        let minimum = parse_ether(&config.min_eth).map_err(|e| {
            Error::Config(format!("min_eth '{}' is not an ETH amount: {}", config.min_eth, e))
        })?;

        if value < minimum {
            return Err(Error::Donation(format!(
                "Minimum of {} ETH is required.",
                config.min_eth
            )));
        }

        let amount_eth = amount
            .parse::<f64>()
            .map_err(|e| Error::Donation(format!("'{}' is not an ETH amount: {}", amount, e)))?;

        Ok(Donation {
            pool: self.pool,
            amount_eth,
            value,
        })
    }
}

impl Donation {
    pub fn usd_estimate(&self, eth_usd_rate: f64) -> f64 {
        usd_estimate(self.amount_eth, eth_usd_rate)
    }
}

/// Placeholder USD conversion, rounded to cents
pub fn usd_estimate(amount_eth: f64, eth_usd_rate: f64) -> f64 {
    (amount_eth * eth_usd_rate * 100.0).round() / 100.0
}
