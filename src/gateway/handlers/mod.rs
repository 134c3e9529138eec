//! HTTP handlers, one module per resource

pub mod account;
pub mod client;
pub mod health;
pub mod helpers;
pub mod transaction;
pub mod transfer;

pub use account::{create_account, delete_account, get_account, list_accounts, update_account};
pub use client::{create_client, delete_client, get_client, list_clients, update_client};
pub use health::{HealthResponse, health_check};
pub use transaction::{credit, debit, get_transaction, list_transactions};
pub use transfer::{create_transfer, get_transfer, list_transfers};
