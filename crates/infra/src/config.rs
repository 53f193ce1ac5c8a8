//! Summary configuration.
//!
//! Loaded from the process environment the same way the service wiring reads
//! `USE_PERSISTENT_STORES` / `DATABASE_URL`.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CURRENCY_POLICY_VAR: &str = "PARTSUM_CURRENCY_POLICY";
pub const USE_PERSISTENT_STORES_VAR: &str = "USE_PERSISTENT_STORES";
pub const DATABASE_URL_VAR: &str = "DATABASE_URL";

/// What the purchase-cost summary does when a second currency shows up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrencyPolicy {
    /// Stop at the first stock item priced in a different currency. Totals
    /// cover only the items processed before it.
    #[default]
    HaltOnFirstMismatch,
    /// Keep going: items in foreign currencies are left out of the totals and
    /// every distinct foreign currency is reported.
    ScanAll,
}

impl FromStr for CurrencyPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "halt" | "halt_on_first_mismatch" => Ok(Self::HaltOnFirstMismatch),
            "scan_all" | "scan" => Ok(Self::ScanAll),
            other => Err(ConfigError::invalid(CURRENCY_POLICY_VAR, other)),
        }
    }
}

impl fmt::Display for CurrencyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HaltOnFirstMismatch => f.write_str("halt_on_first_mismatch"),
            Self::ScanAll => f.write_str("scan_all"),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("{0} must be set when USE_PERSISTENT_STORES=true")]
    Missing(&'static str),
}

impl ConfigError {
    fn invalid(var: &'static str, value: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub currency_policy: CurrencyPolicy,
    /// Read from Postgres instead of the in-memory inventory.
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
}

impl SummaryConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let currency_policy = match lookup(CURRENCY_POLICY_VAR) {
            Some(v) => v.parse()?,
            None => CurrencyPolicy::default(),
        };

        let use_persistent_stores = match lookup(USE_PERSISTENT_STORES_VAR) {
            Some(v) => v
                .trim()
                .parse::<bool>()
                .map_err(|_| ConfigError::invalid(USE_PERSISTENT_STORES_VAR, v))?,
            None => false,
        };

        let database_url = lookup(DATABASE_URL_VAR).filter(|v| !v.trim().is_empty());
        if use_persistent_stores && database_url.is_none() {
            return Err(ConfigError::Missing(DATABASE_URL_VAR));
        }

        Ok(Self {
            currency_policy,
            use_persistent_stores,
            database_url,
        })
    }
}
