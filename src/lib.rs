//! fund_transfer - ledger-style fund transfer backend
//!
//! Clients own currency accounts. Money moves through immutable debit and
//! credit transactions; a transfer pairs one debit with one credit, converting
//! at a provider's exchange rate, and commits both legs atomically.
//!
//! # Modules
//!
//! - [`money`] - Fixed-scale `Amount` and `ExchangeRate`
//! - [`core_types`] - Ids, account numbers, currency codes, audit and version stamps
//! - [`error`] - `LedgerError` taxonomy
//! - [`account`] - Clients, accounts, balance rules, CRUD service
//! - [`exchange_rate`] - Rate providers and the startup-resolved registry
//! - [`store`] - `LedgerStore` trait with in-memory and PostgreSQL backends
//! - [`transaction`] - Debit/credit entries and the recorder
//! - [`transfer`] - Transfer lifecycle and coordinator
//! - [`query`] - Paging and listing filters
//! - [`gateway`] - axum HTTP API

// Core types - must be first!
pub mod core_types;
pub mod money;

pub mod account;
pub mod config;
pub mod db;
pub mod error;
pub mod exchange_rate;
pub mod gateway;
pub mod logging;
pub mod query;
pub mod store;
pub mod transaction;
pub mod transfer;

// Convenient re-exports at crate root
pub use error::{AccountRole, LedgerError};
pub use money::{Amount, ExchangeRate};
pub use transaction::TransactionRecorder;
pub use transfer::TransferCoordinator;
