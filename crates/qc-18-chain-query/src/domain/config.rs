//! Chain query configuration.

use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

/// Configuration for the chain query service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainQueryConfig {
    /// Slots in one epoch
    pub slots_per_epoch: u64,
    /// Largest page a list request may ask for
    pub max_page_size: usize,
    /// Page size used when a request leaves it at zero
    pub default_page_size: usize,
    /// Consensus constants for the weak subjectivity period
    pub weak_subjectivity: WeakSubjectivityConfig,
}

impl Default for ChainQueryConfig {
    fn default() -> Self {
        Self {
            slots_per_epoch: 32,
            max_page_size: 500,
            default_page_size: 250,
            weak_subjectivity: WeakSubjectivityConfig::default(),
        }
    }
}

impl ChainQueryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `QC_SLOTS_PER_EPOCH`: Slots per epoch (default: 32)
    /// - `QC_MAX_PAGE_SIZE`: Maximum list page size (default: 500)
    /// - `QC_DEFAULT_PAGE_SIZE`: Page size for requests without one (default: 250)
    ///
    /// Unparseable values fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            slots_per_epoch: env::var("QC_SLOTS_PER_EPOCH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.slots_per_epoch),

            max_page_size: env::var("QC_MAX_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_page_size),

            default_page_size: env::var("QC_DEFAULT_PAGE_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.default_page_size),

            weak_subjectivity: defaults.weak_subjectivity,
        }
    }

    /// Check the configuration for values the service cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slots_per_epoch == 0 {
            return Err(ConfigError::ZeroSlotsPerEpoch);
        }
        if self.max_page_size == 0 {
            return Err(ConfigError::ZeroMaxPageSize);
        }
        if self.default_page_size > self.max_page_size {
            return Err(ConfigError::DefaultPageTooLarge {
                default: self.default_page_size,
                max: self.max_page_size,
            });
        }
        self.weak_subjectivity.validate()
    }
}

/// Consensus constants used by the weak subjectivity period computation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeakSubjectivityConfig {
    /// Base period in epochs
    pub min_validator_withdrawability_delay: u64,
    /// Lower bound of the per-epoch validator churn
    pub min_per_epoch_churn_limit: u64,
    /// Active validator count divided by this gives the churn
    pub churn_limit_quotient: u64,
    /// Deposits a block may include
    pub max_deposits: u64,
    /// Safety decay in percent
    pub safety_decay: u64,
    /// Effective balance cap in Gwei
    pub max_effective_balance: u64,
    /// Gwei in one ETH
    pub gwei_per_eth: u64,
}

impl Default for WeakSubjectivityConfig {
    fn default() -> Self {
        Self {
            min_validator_withdrawability_delay: 256,
            min_per_epoch_churn_limit: 4,
            churn_limit_quotient: 65_536,
            max_deposits: 16,
            safety_decay: 10,
            max_effective_balance: 32_000_000_000,
            gwei_per_eth: 1_000_000_000,
        }
    }
}

impl WeakSubjectivityConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.gwei_per_eth == 0 {
            return Err(ConfigError::InvalidConstant("gwei_per_eth"));
        }
        if self.churn_limit_quotient == 0 {
            return Err(ConfigError::InvalidConstant("churn_limit_quotient"));
        }
        Ok(())
    }
}

/// Configuration rejected by [`ChainQueryConfig::validate`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("slots_per_epoch must be non-zero")]
    ZeroSlotsPerEpoch,

    #[error("max_page_size must be non-zero")]
    ZeroMaxPageSize,

    #[error("default_page_size {default} exceeds max_page_size {max}")]
    DefaultPageTooLarge { default: usize, max: usize },

    #[error("{0} must be non-zero")]
    InvalidConstant(&'static str),
}
