//! Ledger persistence
//!
//! [`LedgerStore`] is the seam between the ledger services and storage.
//! Reads return `Ok(None)` for a missing row. Every write that changes an
//! existing row is version-checked: the caller passes the version it read and
//! the store rejects the write with [`StoreError::Conflict`] when the stored
//! version has moved on.
//!
//! Balance mutations only happen through [`LedgerStore::commit`], which applies
//! a whole [`UnitOfWork`] or nothing.

pub mod memory;
pub mod postgres;
pub mod schema;

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;

use crate::account::models::{Account, Client};
use crate::core_types::{AccountId, AccountNumber, ClientId, Version};
use crate::money::Amount;
use crate::query::{
    AccountFilter, ClientFilter, Page, PageRequest, TransactionFilter, TransferFilter,
};
use crate::transaction::types::Transaction;
use crate::transfer::types::Transfer;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// Optimistic-lock check failed or the row vanished
    #[error("Version conflict on {entity} {key}")]
    Conflict { entity: &'static str, key: String },

    /// A generated transaction or transfer reference already exists
    #[error("Duplicate reference: {0}")]
    DuplicateReference(String),

    /// A natural key (email, phone, account number) is taken
    #[error("Value already used: {field}")]
    UniqueViolation { field: &'static str },

    #[error("Database error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            StoreError::Conflict { .. } | StoreError::DuplicateReference(_)
        )
    }
}

/// Base step of the pause before re-running a rejected commit.
pub const CONFLICT_BACKOFF_STEP: Duration = Duration::from_millis(5);

/// Pause before retry `attempt` (1-based) of a rejected commit: a linear
/// step plus up to one step of random jitter, so that writers that collided
/// do not collide again in lockstep.
pub fn conflict_backoff(attempt: u32) -> Duration {
    let step = CONFLICT_BACKOFF_STEP.as_micros() as u64;
    let jitter = rand::thread_rng().gen_range(0..=step);
    Duration::from_micros(step * u64::from(attempt.max(1)) + jitter)
}

/// New balances for one account, applied only if its version still matches.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceUpdate {
    pub account_id: AccountId,
    pub account_number: AccountNumber,
    pub expected_version: Version,
    pub total_balance: Amount,
    pub usable_balance: Amount,
}

/// Everything one ledger operation writes, committed atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnitOfWork {
    pub balance_updates: Vec<BalanceUpdate>,
    pub transactions: Vec<Transaction>,
    pub transfer: Option<Transfer>,
}

#[async_trait]
pub trait LedgerStore: Send + Sync {
    // === Clients ===
    async fn insert_client(&self, client: &Client) -> Result<(), StoreError>;

    /// Version-checked update of name, email, phone and the deleted flag.
    /// Returns the stored client with its new version.
    async fn update_client(&self, client: &Client) -> Result<Client, StoreError>;

    async fn find_client(&self, id: ClientId) -> Result<Option<Client>, StoreError>;

    async fn find_client_by_email(&self, email: &str) -> Result<Option<Client>, StoreError>;

    async fn find_client_by_phone(&self, phone: &str) -> Result<Option<Client>, StoreError>;

    async fn list_clients(
        &self,
        filter: &ClientFilter,
        page: &PageRequest,
    ) -> Result<Page<Client>, StoreError>;

    // === Accounts ===
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError>;

    /// Version-checked update of status and the deleted flag. Balances are
    /// left untouched.
    async fn update_account(&self, account: &Account) -> Result<Account, StoreError>;

    async fn find_account(&self, id: AccountId) -> Result<Option<Account>, StoreError>;

    async fn find_account_by_number(
        &self,
        number: &AccountNumber,
    ) -> Result<Option<Account>, StoreError>;

    async fn list_accounts(
        &self,
        filter: &AccountFilter,
        page: &PageRequest,
    ) -> Result<Page<Account>, StoreError>;

    // === Ledger ===
    async fn find_transaction_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transaction>, StoreError>;

    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
        page: &PageRequest,
    ) -> Result<Page<Transaction>, StoreError>;

    async fn find_transfer_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transfer>, StoreError>;

    async fn list_transfers(
        &self,
        filter: &TransferFilter,
        page: &PageRequest,
    ) -> Result<Page<Transfer>, StoreError>;

    /// Apply balance updates, insert transactions and the optional transfer
    /// as one atomic unit.
    async fn commit(&self, work: UnitOfWork) -> Result<(), StoreError>;
}
