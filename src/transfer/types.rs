//! Transfer records and requests

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core_types::{AccountId, AccountNumber, CurrencyCode, TransactionId, TransferId, Version};
use crate::money::{Amount, ExchangeRate};
use crate::transfer::state::TransferStatus;

/// Prefix of generated transfer references.
pub const TRANSFER_REFERENCE_PREFIX: &str = "TR";

/// Persisted transfer, linking exactly one debit and one credit transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transfer {
    pub id: TransferId,
    pub reference: String,
    pub debit_transaction_id: TransactionId,
    pub debit_reference: String,
    pub credit_transaction_id: TransactionId,
    pub credit_reference: String,
    pub from_account_id: AccountId,
    pub from_account_number: AccountNumber,
    pub to_account_id: AccountId,
    pub to_account_number: AccountNumber,
    pub from_currency: CurrencyCode,
    pub to_currency: CurrencyCode,
    /// In `from_currency`
    pub amount_sent: Amount,
    /// In `to_currency`
    pub amount_received: Amount,
    pub exchange_rate: ExchangeRate,
    pub rate_provider: String,
    pub fee: Amount,
    pub status: TransferStatus,
    pub description: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub version: Version,
}

/// Input of `TransferCoordinator::make_transfer`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferCommand {
    pub from_account: AccountNumber,
    pub to_account: AccountNumber,
    pub amount: Amount,
    pub description: Option<String>,
    /// Provider key; `None` selects the configured default.
    pub rate_provider: Option<String>,
}
