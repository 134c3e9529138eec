//! Clients, accounts and the balance rules applied to them

pub mod ledger;
pub mod models;
pub mod service;
pub mod validation;

pub use ledger::{AccountLedger, BalanceChange, SufficiencyRule};
pub use models::{Account, AccountStatus, Client};
pub use service::{AccountService, ClientUpdate, NewAccount, NewClient};
pub use validation::ValidationError;
