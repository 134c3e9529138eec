//! Rate provider implementations

use std::collections::{BTreeMap, HashMap};

use rust_decimal::Decimal;
use serde::Deserialize;

use super::{ExchangeRateError, ProviderKind};
use crate::core_types::CurrencyCode;
use crate::money::ExchangeRate;

pub const FREE_CURRENCY_API_URL: &str = "https://api.freecurrencyapi.com";

#[derive(Debug, Clone)]
pub enum RateProvider {
    Noop,
    Fixed(FixedRates),
    FreeCurrencyApi(FreeCurrencyClient),
}

impl RateProvider {
    pub fn kind(&self) -> ProviderKind {
        match self {
            RateProvider::Noop => ProviderKind::Noop,
            RateProvider::Fixed(_) => ProviderKind::Fixed,
            RateProvider::FreeCurrencyApi(_) => ProviderKind::FreeCurrencyApi,
        }
    }

    pub async fn fetch(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<ExchangeRate, ExchangeRateError> {
        match self {
            RateProvider::Noop => Ok(ExchangeRate::ONE),
            RateProvider::Fixed(rates) => rates.rate(from, to),
            RateProvider::FreeCurrencyApi(client) => client.latest(from, to).await,
        }
    }
}

// ============================================================================
// Fixed table
// ============================================================================

/// Deterministic rates keyed by `"FROM/TO"`.
#[derive(Debug, Clone, Default)]
pub struct FixedRates {
    rates: HashMap<(CurrencyCode, CurrencyCode), ExchangeRate>,
    default_rate: Option<ExchangeRate>,
}

impl FixedRates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from config entries such as `"USD/EUR": 1.25`.
    pub fn from_table(
        table: &BTreeMap<String, Decimal>,
        default_rate: Option<Decimal>,
    ) -> Result<Self, ExchangeRateError> {
        let invalid = |reason: String| ExchangeRateError::unavailable(ProviderKind::Fixed, reason);

        let mut rates = Self::new();
        for (pair, value) in table {
            let (from, to) = pair
                .split_once('/')
                .ok_or_else(|| invalid(format!("pair '{}' is not FROM/TO", pair)))?;
            let from = CurrencyCode::new(from).map_err(|e| invalid(e.to_string()))?;
            let to = CurrencyCode::new(to).map_err(|e| invalid(e.to_string()))?;
            let rate = ExchangeRate::new(*value).map_err(|e| invalid(format!("{}: {}", pair, e)))?;
            rates = rates.with_rate(from, to, rate);
        }
        if let Some(value) = default_rate {
            let rate = ExchangeRate::new(value).map_err(|e| invalid(e.to_string()))?;
            rates = rates.with_default(rate);
        }
        Ok(rates)
    }

    pub fn with_rate(mut self, from: CurrencyCode, to: CurrencyCode, rate: ExchangeRate) -> Self {
        self.rates.insert((from, to), rate);
        self
    }

    pub fn with_default(mut self, rate: ExchangeRate) -> Self {
        self.default_rate = Some(rate);
        self
    }

    pub fn rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<ExchangeRate, ExchangeRateError> {
        self.rates
            .get(&(from.clone(), to.clone()))
            .copied()
            .or(self.default_rate)
            .ok_or_else(|| {
                ExchangeRateError::unavailable(
                    ProviderKind::Fixed,
                    format!("no rate configured for {}/{}", from, to),
                )
            })
    }
}

// ============================================================================
// FreeCurrencyApi
// ============================================================================

#[derive(Debug, Deserialize)]
struct LatestResponse {
    data: HashMap<String, Decimal>,
}

/// Client for `GET {base_url}/v1/latest?apikey=..&base_currency=FROM`.
#[derive(Debug, Clone)]
pub struct FreeCurrencyClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FreeCurrencyClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn latest(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<ExchangeRate, ExchangeRateError> {
        let fail = |reason: String| ExchangeRateError::unavailable(ProviderKind::FreeCurrencyApi, reason);

        let url = format!("{}/v1/latest", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("apikey", self.api_key.as_str()), ("base_currency", from.as_str())])
            .send()
            .await
            .map_err(|e| fail(format!("request failed: {}", e)))?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(fail(format!("HTTP {}", status.as_u16())));
        }

        let body: LatestResponse = response
            .json()
            .await
            .map_err(|e| fail(format!("malformed response: {}", e)))?;

        let raw = body
            .data
            .get(to.as_str())
            .copied()
            .ok_or_else(|| fail(format!("currency {} not found in response data", to)))?;

        ExchangeRate::new(raw).map_err(|e| fail(format!("{} for {}: {}", e, to, raw)))
    }
}
