//! Ledger Error Types
//!
//! One taxonomy for every operation the service exposes. Business errors
//! carry a stable code and reach the caller unchanged; infrastructure errors
//! are logged and replaced by a generic error at the HTTP boundary.

use std::fmt;

use thiserror::Error;

use crate::account::validation::ValidationError;
use crate::exchange_rate::ExchangeRateError;
use crate::money::MoneyError;
use crate::store::StoreError;

/// Which side of an operation an account was resolved for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountRole {
    Source,
    Destination,
    Account,
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AccountRole::Source => "Source Account",
            AccountRole::Destination => "Destination Account",
            AccountRole::Account => "Account",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    // === Lookup Errors ===
    #[error("{role} Not Found")]
    AccountNotFound {
        role: AccountRole,
        account_number: String,
    },

    #[error("Client Not Found: {0}")]
    ClientNotFound(String),

    #[error("Transaction Not Found: {0}")]
    TransactionNotFound(String),

    #[error("Transfer Not Found: {0}")]
    TransferNotFound(String),

    // === Balance Rule Errors ===
    #[error("Account {account_number} is not active ({state})")]
    AccountInactive {
        account_number: String,
        state: &'static str,
    },

    #[error("Insufficient funds on account {account_number}")]
    InsufficientFunds { account_number: String },

    // === Exchange Rate Errors ===
    #[error("Exchange rate unavailable: {0}")]
    ExchangeRateUnavailable(String),

    #[error("Unsupported exchange rate provider: {0}")]
    UnsupportedProvider(String),

    // === Input Errors ===
    #[error("Validation failed: {}", .0.join("; "))]
    ValidationFailed(Vec<String>),

    #[error("Value already used: {field}")]
    DuplicateValue { field: &'static str },

    // === System Errors ===
    #[error("Concurrent modification of {entity} {key}")]
    ConcurrentModification { entity: &'static str, key: String },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl LedgerError {
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::ValidationFailed(vec![message.into()])
    }

    /// Stable machine-readable code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::AccountNotFound { role, .. } => match role {
                AccountRole::Source => "SOURCE_ACCOUNT_NOT_FOUND",
                AccountRole::Destination => "DESTINATION_ACCOUNT_NOT_FOUND",
                AccountRole::Account => "ACCOUNT_NOT_FOUND",
            },
            LedgerError::ClientNotFound(_) => "CLIENT_NOT_FOUND",
            LedgerError::TransactionNotFound(_) => "TRANSACTION_NOT_FOUND",
            LedgerError::TransferNotFound(_) => "TRANSFER_NOT_FOUND",
            LedgerError::AccountInactive { .. } => "ACCOUNT_INACTIVE",
            LedgerError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            LedgerError::ExchangeRateUnavailable(_) => "EXCHANGE_RATE_UNAVAILABLE",
            LedgerError::UnsupportedProvider(_) => "UNSUPPORTED_PROVIDER",
            LedgerError::ValidationFailed(_) => "VALIDATION_FAILED",
            LedgerError::DuplicateValue { .. } => "VALUE_ALREADY_USED",
            LedgerError::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            LedgerError::Storage(_) => "STORAGE_ERROR",
        }
    }

    /// Get HTTP status code suggestion
    pub fn http_status(&self) -> u16 {
        match self {
            LedgerError::ValidationFailed(_) | LedgerError::UnsupportedProvider(_) => 400,
            LedgerError::AccountNotFound { .. }
            | LedgerError::ClientNotFound(_)
            | LedgerError::TransactionNotFound(_)
            | LedgerError::TransferNotFound(_) => 404,
            LedgerError::DuplicateValue { .. } => 409,
            LedgerError::AccountInactive { .. } | LedgerError::InsufficientFunds { .. } => 422,
            LedgerError::ConcurrentModification { .. } | LedgerError::Storage(_) => 500,
            LedgerError::ExchangeRateUnavailable(_) => 503,
        }
    }

    /// Client-visible business error, as opposed to an infrastructure failure.
    pub fn is_business(&self) -> bool {
        !matches!(
            self,
            LedgerError::ExchangeRateUnavailable(_)
                | LedgerError::ConcurrentModification { .. }
                | LedgerError::Storage(_)
        )
    }

    /// Whether repeating the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            LedgerError::ExchangeRateUnavailable(_) | LedgerError::ConcurrentModification { .. }
        )
    }
}

impl From<MoneyError> for LedgerError {
    fn from(err: MoneyError) -> Self {
        LedgerError::validation(format!("amount: {}", err))
    }
}

impl From<ValidationError> for LedgerError {
    fn from(err: ValidationError) -> Self {
        LedgerError::validation(err.to_string())
    }
}

impl From<ExchangeRateError> for LedgerError {
    fn from(err: ExchangeRateError) -> Self {
        match err {
            ExchangeRateError::UnsupportedProvider(key) => LedgerError::UnsupportedProvider(key),
            other => LedgerError::ExchangeRateUnavailable(other.to_string()),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { entity, key } => {
                LedgerError::ConcurrentModification { entity, key }
            }
            StoreError::DuplicateReference(reference) => LedgerError::ConcurrentModification {
                entity: "reference",
                key: reference,
            },
            StoreError::UniqueViolation { field } => LedgerError::DuplicateValue { field },
            StoreError::Backend(msg) => LedgerError::Storage(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_not_found_distinguishes_role() {
        let src = LedgerError::AccountNotFound {
            role: AccountRole::Source,
            account_number: "ACC1".into(),
        };
        let dst = LedgerError::AccountNotFound {
            role: AccountRole::Destination,
            account_number: "ACC2".into(),
        };
        assert_eq!(src.to_string(), "Source Account Not Found");
        assert_eq!(dst.to_string(), "Destination Account Not Found");
        assert_eq!(src.code(), "SOURCE_ACCOUNT_NOT_FOUND");
        assert_eq!(dst.code(), "DESTINATION_ACCOUNT_NOT_FOUND");
        assert_eq!(src.http_status(), 404);
    }

    #[test]
    fn test_business_vs_infrastructure() {
        let business = [
            LedgerError::InsufficientFunds {
                account_number: "A".into(),
            },
            LedgerError::AccountInactive {
                account_number: "A".into(),
                state: "CLOSED",
            },
            LedgerError::UnsupportedProvider("nope".into()),
            LedgerError::validation("amount must be positive"),
        ];
        for err in &business {
            assert!(err.is_business(), "{:?}", err);
            assert!(!err.is_retryable(), "{:?}", err);
        }

        let infra = [
            LedgerError::ExchangeRateUnavailable("timeout".into()),
            LedgerError::ConcurrentModification {
                entity: "account",
                key: "A".into(),
            },
            LedgerError::Storage("io".into()),
        ];
        for err in &infra {
            assert!(!err.is_business(), "{:?}", err);
            assert!(err.http_status() >= 500);
        }
    }

    #[test]
    fn test_validation_message_joins_violations() {
        let err = LedgerError::ValidationFailed(vec!["a".into(), "b".into()]);
        assert_eq!(err.to_string(), "Validation failed: a; b");
        assert_eq!(err.code(), "VALIDATION_FAILED");
    }

    #[test]
    fn test_from_store_error() {
        let err: LedgerError = StoreError::Conflict {
            entity: "account",
            key: "ACC1".into(),
        }
        .into();
        assert!(matches!(err, LedgerError::ConcurrentModification { .. }));

        let err: LedgerError = StoreError::UniqueViolation { field: "email" }.into();
        assert_eq!(err, LedgerError::DuplicateValue { field: "email" });
    }

    #[test]
    fn test_from_money_error() {
        let err: LedgerError = MoneyError::NotPositive.into();
        assert_eq!(err.http_status(), 400);

        let err: LedgerError = MoneyError::Overflow.into();
        assert_eq!(err.code(), "VALIDATION_FAILED");
        assert!(err.is_business());
    }
}
