//! Transaction ledger entries

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core_types::{AccountId, AccountNumber, CurrencyCode, TransactionId, Version};
use crate::money::Amount;

/// Length of the random part of every generated reference.
pub const REFERENCE_TOKEN_LEN: usize = 8;

const REFERENCE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// `PREFIX-XXXXXXXX` with an uppercase alphanumeric token.
///
/// Not unique by construction; stores reject duplicates and callers retry.
pub fn generate_reference(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let token: String = (0..REFERENCE_TOKEN_LEN)
        .map(|_| REFERENCE_CHARSET[rng.gen_range(0..REFERENCE_CHARSET.len())] as char)
        .collect();
    format!("{}-{}", prefix, token)
}

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i16)]
pub enum TransactionType {
    Debit = 1,
    Credit = 2,
}

impl TransactionType {
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(TransactionType::Debit),
            2 => Some(TransactionType::Credit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Debit => "DEBIT",
            TransactionType::Credit => "CREDIT",
        }
    }

    pub fn reference_prefix(&self) -> &'static str {
        match self {
            TransactionType::Debit => "DE",
            TransactionType::Credit => "CR",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DEBIT" => Ok(TransactionType::Debit),
            "CREDIT" => Ok(TransactionType::Credit),
            other => Err(format!("unknown transaction type: {}", other)),
        }
    }
}

/// Channel a transaction came through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i16)]
pub enum TransactionMethod {
    Desk = 1,
    Atm = 2,
    Fees = 3,
    Transfer = 4,
}

impl TransactionMethod {
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(TransactionMethod::Desk),
            2 => Some(TransactionMethod::Atm),
            3 => Some(TransactionMethod::Fees),
            4 => Some(TransactionMethod::Transfer),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionMethod::Desk => "DESK",
            TransactionMethod::Atm => "ATM",
            TransactionMethod::Fees => "FEES",
            TransactionMethod::Transfer => "TRANSFER",
        }
    }

    /// Three-letter code used on statements.
    pub fn code(&self) -> &'static str {
        match self {
            TransactionMethod::Desk => "DES",
            TransactionMethod::Atm => "ATM",
            TransactionMethod::Fees => "FEE",
            TransactionMethod::Transfer => "TRA",
        }
    }
}

impl fmt::Display for TransactionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionMethod {
    type Err = String;

    /// Accepts either the name (`DESK`) or the code (`DES`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DESK" | "DES" => Ok(TransactionMethod::Desk),
            "ATM" => Ok(TransactionMethod::Atm),
            "FEES" | "FEE" => Ok(TransactionMethod::Fees),
            "TRANSFER" | "TRA" => Ok(TransactionMethod::Transfer),
            other => Err(format!("unknown transaction method: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i16)]
pub enum TransactionStatus {
    Success = 1,
    Failed = 2,
    Pending = 3,
}

impl TransactionStatus {
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(TransactionStatus::Success),
            2 => Some(TransactionStatus::Failed),
            3 => Some(TransactionStatus::Pending),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Success => "SUCCESS",
            TransactionStatus::Failed => "FAILED",
            TransactionStatus::Pending => "PENDING",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SUCCESS" => Ok(TransactionStatus::Success),
            "FAILED" => Ok(TransactionStatus::Failed),
            "PENDING" => Ok(TransactionStatus::Pending),
            other => Err(format!("unknown transaction status: {}", other)),
        }
    }
}

// ============================================================================
// Transaction
// ============================================================================

/// Immutable ledger entry against one account.
///
/// `account_number` and `currency` are denormalised from the account for
/// reads; the amount is always in that currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub reference: String,
    pub account_id: AccountId,
    pub account_number: AccountNumber,
    pub currency: CurrencyCode,
    pub tx_type: TransactionType,
    pub method: TransactionMethod,
    pub status: TransactionStatus,
    pub amount: Amount,
    pub description: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub version: Version,
}
