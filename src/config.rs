use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::Context;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::account::ledger::SufficiencyRule;
use crate::exchange_rate::provider::FREE_CURRENCY_API_URL;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    pub log_level: String,
    pub log_dir: String,
    pub log_file: String,
    pub use_json: bool,
    pub rotation: String,
    pub gateway: GatewayConfig,
    /// PostgreSQL connection URL; the in-memory store is used when absent
    #[serde(default)]
    pub postgres_url: Option<String>,
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub exchange_rate: ExchangeRateConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LedgerConfig {
    /// Attempts after the first on an optimistic-lock conflict
    #[serde(default = "default_conflict_retries")]
    pub max_conflict_retries: u32,
    #[serde(default)]
    pub sufficiency: SufficiencyRule,
}

fn default_conflict_retries() -> u32 {
    3
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            max_conflict_retries: default_conflict_retries(),
            sufficiency: SufficiencyRule::default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ExchangeRateConfig {
    /// Provider key used when a request names none
    #[serde(default = "default_provider")]
    pub default_provider: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Total lookups per transfer, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
    /// `"USD/EUR": 1.25`
    #[serde(default)]
    pub fixed_rates: BTreeMap<String, Decimal>,
    #[serde(default)]
    pub fixed_default_rate: Option<Decimal>,
    #[serde(default)]
    pub free_currency_api: Option<FreeCurrencyApiConfig>,
}

fn default_provider() -> String {
    "noop".to_string()
}

fn default_timeout_ms() -> u64 {
    3000
}

fn default_max_attempts() -> u32 {
    2
}

fn default_backoff_ms() -> u64 {
    100
}

impl Default for ExchangeRateConfig {
    fn default() -> Self {
        Self {
            default_provider: default_provider(),
            timeout_ms: default_timeout_ms(),
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            fixed_rates: BTreeMap::new(),
            fixed_default_rate: None,
            free_currency_api: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FreeCurrencyApiConfig {
    #[serde(default = "default_free_currency_url")]
    pub base_url: String,
    pub api_key: String,
}

fn default_free_currency_url() -> String {
    FREE_CURRENCY_API_URL.to_string()
}

impl AppConfig {
    /// Load `config/{env}.yaml`.
    pub fn load(env: &str) -> anyhow::Result<Self> {
        Self::from_file(format!("config/{}.yaml", env))
    }

    pub fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config yaml: {}", path.display()))
    }

    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}
