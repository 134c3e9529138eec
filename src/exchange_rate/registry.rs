//! Provider registry resolved at startup

use std::collections::HashMap;
use std::time::Duration;

use tracing::{debug, warn};

use super::provider::{FixedRates, FreeCurrencyClient, RateProvider};
use super::{ExchangeRateError, ProviderKind};
use crate::config::ExchangeRateConfig;
use crate::core_types::CurrencyCode;
use crate::money::ExchangeRate;

/// Immutable mapping from [`ProviderKind`] to its configured provider.
///
/// `Noop` is always registered. Every lookup is bounded by `timeout`.
#[derive(Debug, Clone)]
pub struct ExchangeRateRegistry {
    providers: HashMap<ProviderKind, RateProvider>,
    default_provider: ProviderKind,
    timeout: Duration,
}

impl ExchangeRateRegistry {
    pub fn new(default_provider: ProviderKind, timeout: Duration) -> Self {
        let mut providers = HashMap::new();
        providers.insert(ProviderKind::Noop, RateProvider::Noop);
        Self {
            providers,
            default_provider,
            timeout,
        }
    }

    pub fn with_provider(mut self, provider: RateProvider) -> Self {
        self.providers.insert(provider.kind(), provider);
        self
    }

    /// Build from config. Fails when the default provider is unknown or
    /// not configured.
    pub fn from_config(config: &ExchangeRateConfig) -> Result<Self, ExchangeRateError> {
        let default_provider: ProviderKind = config.default_provider.parse()?;
        let mut registry = Self::new(default_provider, Duration::from_millis(config.timeout_ms));

        if !config.fixed_rates.is_empty() || config.fixed_default_rate.is_some() {
            let rates = FixedRates::from_table(&config.fixed_rates, config.fixed_default_rate)?;
            registry = registry.with_provider(RateProvider::Fixed(rates));
        }
        if let Some(api) = &config.free_currency_api {
            registry = registry.with_provider(RateProvider::FreeCurrencyApi(FreeCurrencyClient::new(
                api.base_url.clone(),
                api.api_key.clone(),
            )));
        }

        registry.resolve(None)?;
        Ok(registry)
    }

    pub fn default_provider(&self) -> ProviderKind {
        self.default_provider
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Map an optional request key to a registered provider.
    pub fn resolve(&self, key: Option<&str>) -> Result<ProviderKind, ExchangeRateError> {
        let kind = match key.map(str::trim).filter(|k| !k.is_empty()) {
            Some(key) => key.parse()?,
            None => self.default_provider,
        };
        if self.providers.contains_key(&kind) {
            Ok(kind)
        } else {
            Err(ExchangeRateError::UnsupportedProvider(kind.to_string()))
        }
    }

    /// Rate to convert `from` into `to`.
    ///
    /// Identical currencies short-circuit to 1 without calling the provider.
    pub async fn get_rate(
        &self,
        kind: ProviderKind,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<ExchangeRate, ExchangeRateError> {
        let provider = self
            .providers
            .get(&kind)
            .ok_or_else(|| ExchangeRateError::UnsupportedProvider(kind.to_string()))?;

        if from == to {
            return Ok(ExchangeRate::ONE);
        }

        match tokio::time::timeout(self.timeout, provider.fetch(from, to)).await {
            Ok(Ok(rate)) => {
                debug!(provider = %kind, %from, %to, %rate, "Exchange rate obtained");
                Ok(rate)
            }
            Ok(Err(e)) => {
                warn!(provider = %kind, %from, %to, error = %e, "Exchange rate lookup failed");
                Err(e)
            }
            Err(_) => {
                let timeout_ms = self.timeout.as_millis() as u64;
                warn!(
                    provider = %kind,
                    %from,
                    %to,
                    timeout_ms,
                    "Exchange rate lookup timed out"
                );
                Err(ExchangeRateError::Timeout {
                    provider: kind,
                    timeout_ms,
                })
            }
        }
    }
}
