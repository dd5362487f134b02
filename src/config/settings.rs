// SuretyConfig - tunable parameters of the ledger
//
// Defaults follow the reference deployment: 10 units to fund an airline,
// 1 unit insurance cap, 1.5x payout, 4 airlines before voting applies,
// 1 unit oracle fee, 3 indexes out of 0..10, 3 matching reports to finalize.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base units per native-currency unit
pub const UNIT: u64 = 1_000_000_000;

/// Errors from config validation
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Configuration for the ledger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuretyConfig {
    /// Minimum stake that moves a registered airline to funded
    pub airline_min_funding: u64,
    /// Maximum premium a passenger may pay for one flight
    pub insurance_cap: u64,
    /// Payout multiplier numerator
    pub payout_numerator: u64,
    /// Payout multiplier denominator
    pub payout_denominator: u64,
    /// Registered airline count at which admission requires votes
    pub multiparty_threshold: usize,
    /// Stake a reporter pays to register
    pub oracle_registration_fee: u64,
    /// Number of indexes assigned to each reporter
    pub oracle_index_count: usize,
    /// Indexes are drawn from 0..oracle_index_domain
    pub oracle_index_domain: u16,
    /// Matching reports needed to finalize a flight status
    pub min_responses: usize,
    /// Ledger ticks after which an open status request goes stale
    pub request_ttl: u64,
    /// Deadline for an external payout transfer in milliseconds
    pub payout_timeout_ms: u64,
}

impl SuretyConfig {
    /// Create a new config with builder pattern
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_airline_min_funding(mut self, amount: u64) -> Self {
        self.airline_min_funding = amount;
        self
    }

    pub fn with_insurance_cap(mut self, amount: u64) -> Self {
        self.insurance_cap = amount;
        self
    }

    /// Set the payout multiplier as a ratio
    pub fn with_payout_ratio(mut self, numerator: u64, denominator: u64) -> Self {
        self.payout_numerator = numerator;
        self.payout_denominator = denominator;
        self
    }

    pub fn with_multiparty_threshold(mut self, count: usize) -> Self {
        self.multiparty_threshold = count;
        self
    }

    pub fn with_oracle_registration_fee(mut self, amount: u64) -> Self {
        self.oracle_registration_fee = amount;
        self
    }

    /// Set how many indexes each reporter gets and the domain they come from
    pub fn with_oracle_indexes(mut self, count: usize, domain: u16) -> Self {
        self.oracle_index_count = count;
        self.oracle_index_domain = domain;
        self
    }

    pub fn with_min_responses(mut self, count: usize) -> Self {
        self.min_responses = count;
        self
    }

    pub fn with_request_ttl(mut self, ticks: u64) -> Self {
        self.request_ttl = ticks;
        self
    }

    pub fn with_payout_timeout_ms(mut self, ms: u64) -> Self {
        self.payout_timeout_ms = ms;
        self
    }

    /// Credit owed for a premium
    pub fn payout_for(&self, premium: u64) -> u64 {
        let scaled = premium as u128 * self.payout_numerator as u128
            / self.payout_denominator as u128;
        u64::try_from(scaled).unwrap_or(u64::MAX)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.insurance_cap == 0 {
            return Err(ConfigError::InvalidConfig(
                "insurance_cap must be > 0".to_string(),
            ));
        }
        if self.payout_denominator == 0 || self.payout_numerator < self.payout_denominator {
            return Err(ConfigError::InvalidConfig(
                "payout ratio must be >= 1".to_string(),
            ));
        }
        if self.multiparty_threshold == 0 {
            return Err(ConfigError::InvalidConfig(
                "multiparty_threshold must be > 0".to_string(),
            ));
        }
        if self.oracle_index_domain == 0 || self.oracle_index_domain > 256 {
            return Err(ConfigError::InvalidConfig(
                "oracle_index_domain must be in 1..=256".to_string(),
            ));
        }
        if self.oracle_index_count == 0
            || self.oracle_index_count > self.oracle_index_domain as usize
        {
            return Err(ConfigError::InvalidConfig(
                "oracle_index_count must be in 1..=oracle_index_domain".to_string(),
            ));
        }
        if self.min_responses == 0 {
            return Err(ConfigError::InvalidConfig(
                "min_responses must be > 0".to_string(),
            ));
        }
        if self.request_ttl == 0 {
            return Err(ConfigError::InvalidConfig(
                "request_ttl must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for SuretyConfig {
    fn default() -> Self {
        Self {
            airline_min_funding: 10 * UNIT,
            insurance_cap: UNIT,
            payout_numerator: 3,
            payout_denominator: 2,
            multiparty_threshold: 4,
            oracle_registration_fee: UNIT,
            oracle_index_count: 3,
            oracle_index_domain: 10,
            min_responses: 3,
            request_ttl: 256,
            payout_timeout_ms: 5_000,
        }
    }
}
