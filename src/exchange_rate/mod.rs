//! Exchange Rate Providers
//!
//! Providers are a closed set selected by key. The key is parsed into a
//! [`ProviderKind`] and the [`ExchangeRateRegistry`] built at startup maps
//! each configured kind to its [`RateProvider`].
//!
//! # Failure semantics
//!
//! - unknown or unconfigured key: [`ExchangeRateError::UnsupportedProvider`], never retried
//! - network failure, bad status, malformed body, missing currency:
//!   [`ExchangeRateError::Unavailable`]
//! - lookup slower than the configured timeout: [`ExchangeRateError::Timeout`]
//!
//! A failed lookup is never replaced by a rate of 1.

pub mod provider;
pub mod registry;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use provider::{FixedRates, FreeCurrencyClient, RateProvider};
pub use registry::ExchangeRateRegistry;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExchangeRateError {
    #[error("Unsupported exchange rate provider: {0}")]
    UnsupportedProvider(String),

    #[error("{provider} lookup failed: {reason}")]
    Unavailable {
        provider: ProviderKind,
        reason: String,
    },

    #[error("{provider} lookup timed out after {timeout_ms}ms")]
    Timeout {
        provider: ProviderKind,
        timeout_ms: u64,
    },
}

impl ExchangeRateError {
    pub fn unavailable(provider: ProviderKind, reason: impl Into<String>) -> Self {
        ExchangeRateError::Unavailable {
            provider,
            reason: reason.into(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        !matches!(self, ExchangeRateError::UnsupportedProvider(_))
    }
}

/// Provider identity, parsed case-insensitively from its key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    /// Always returns 1
    Noop,
    /// Configured table of pair rates
    Fixed,
    /// api.freecurrencyapi.com
    FreeCurrencyApi,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Noop => "noop",
            ProviderKind::Fixed => "fixed",
            ProviderKind::FreeCurrencyApi => "free_currency_api",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = ExchangeRateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-'))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "noop" => Ok(ProviderKind::Noop),
            "fixed" => Ok(ProviderKind::Fixed),
            "freecurrencyapi" => Ok(ProviderKind::FreeCurrencyApi),
            _ => Err(ExchangeRateError::UnsupportedProvider(s.trim().to_string())),
        }
    }
}
