//! Data models for clients and their accounts

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core_types::{AccountId, AccountNumber, Auditable, ClientId, CurrencyCode, Version};
use crate::money::Amount;

// ============================================================================
// Account Status
// ============================================================================

/// Account status, stored as SMALLINT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(i16)]
pub enum AccountStatus {
    Active = 1,
    Inactive = 2,
    Suspended = 3,
    Closed = 4,
}

impl AccountStatus {
    pub fn id(&self) -> i16 {
        *self as i16
    }

    pub fn from_id(id: i16) -> Option<Self> {
        match id {
            1 => Some(AccountStatus::Active),
            2 => Some(AccountStatus::Inactive),
            3 => Some(AccountStatus::Suspended),
            4 => Some(AccountStatus::Closed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountStatus::Active => "ACTIVE",
            AccountStatus::Inactive => "INACTIVE",
            AccountStatus::Suspended => "SUSPENDED",
            AccountStatus::Closed => "CLOSED",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ACTIVE" => Ok(AccountStatus::Active),
            "INACTIVE" => Ok(AccountStatus::Inactive),
            "SUSPENDED" => Ok(AccountStatus::Suspended),
            "CLOSED" => Ok(AccountStatus::Closed),
            other => Err(format!("unknown account status: {}", other)),
        }
    }
}

// ============================================================================
// Client
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub deleted: bool,
    #[serde(flatten)]
    pub audit: Auditable,
    pub version: Version,
}

impl Client {
    pub fn new(name: String, email: String, phone: String) -> Self {
        Self {
            id: ClientId::new(),
            name,
            email,
            phone,
            deleted: false,
            audit: Auditable::now(),
            version: Version::INITIAL,
        }
    }
}

// ============================================================================
// Account
// ============================================================================

/// Currency-denominated balance owned by one client.
///
/// `total_balance` and `usable_balance` are always in `currency`. The owner
/// and account number never change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub account_number: AccountNumber,
    pub owner_id: ClientId,
    pub currency: CurrencyCode,
    pub status: AccountStatus,
    pub total_balance: Amount,
    pub usable_balance: Amount,
    pub deleted: bool,
    #[serde(flatten)]
    pub audit: Auditable,
    pub version: Version,
}

impl Account {
    /// Open a new account with a zero balance.
    pub fn open(owner_id: ClientId, currency: CurrencyCode, status: AccountStatus) -> Self {
        Self {
            id: AccountId::new(),
            account_number: AccountNumber::generate(),
            owner_id,
            currency,
            status,
            total_balance: Amount::ZERO,
            usable_balance: Amount::ZERO,
            deleted: false,
            audit: Auditable::now(),
            version: Version::INITIAL,
        }
    }
}
