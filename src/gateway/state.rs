use std::sync::Arc;

use crate::account::{AccountLedger, AccountService};
use crate::config::AppConfig;
use crate::db::Database;
use crate::exchange_rate::{ExchangeRateError, ExchangeRateRegistry};
use crate::store::LedgerStore;
use crate::transaction::TransactionRecorder;
use crate::transfer::{TransferCoordinator, TransferPolicy};

/// Shared gateway state
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<AccountService>,
    pub recorder: Arc<TransactionRecorder>,
    pub transfers: Arc<TransferCoordinator>,
    /// Present when the ledger lives in PostgreSQL; pinged by `/health`
    pub database: Option<Database>,
}

impl AppState {
    pub fn new(
        accounts: Arc<AccountService>,
        recorder: Arc<TransactionRecorder>,
        transfers: Arc<TransferCoordinator>,
    ) -> Self {
        Self {
            accounts,
            recorder,
            transfers,
            database: None,
        }
    }

    /// Wire the services over `store` as configured. Fails if the default
    /// rate provider is not usable.
    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn LedgerStore>,
    ) -> Result<Self, ExchangeRateError> {
        let rates = Arc::new(ExchangeRateRegistry::from_config(&config.exchange_rate)?);
        let recorder = Arc::new(TransactionRecorder::new(
            store.clone(),
            AccountLedger::new(config.ledger.sufficiency),
            config.ledger.max_conflict_retries,
        ));
        let policy = TransferPolicy::from_config(&config.ledger, &config.exchange_rate);
        let transfers = Arc::new(TransferCoordinator::new(recorder.clone(), rates, policy));
        let accounts = Arc::new(AccountService::new(store));
        Ok(Self::new(accounts, recorder, transfers))
    }

    pub fn with_database(mut self, database: Database) -> Self {
        self.database = Some(database);
        self
    }
}
