//! Core type definitions shared across the ledger.
//!
//! Entities embed [`Auditable`] and [`Version`] by value instead of
//! inheriting them.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::validation::ValidationError;

/// Entity identifier - ULID based
///
/// Sortable by creation time and generated without a database round-trip,
/// so both store backends share the same id space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(ulid::Ulid);

impl EntityId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new())
    }

    pub fn inner(&self) -> ulid::Ulid {
        self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(ulid::Ulid::from_string(s)?))
    }
}

impl Serialize for EntityId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

pub type ClientId = EntityId;
pub type AccountId = EntityId;
pub type TransactionId = EntityId;
pub type TransferId = EntityId;

// ============================================================================
// AccountNumber
// ============================================================================

/// Public, immutable account number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountNumber(String);

impl AccountNumber {
    /// Generate a fresh account number (`ACC` + 16 ULID characters).
    pub fn generate() -> Self {
        let ulid = ulid::Ulid::new().to_string();
        Self(format!("ACC{}", &ulid[10..]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AccountNumber {
    fn from(s: &str) -> Self {
        Self(s.trim().to_string())
    }
}

impl From<String> for AccountNumber {
    fn from(s: String) -> Self {
        Self(s.trim().to_string())
    }
}

impl fmt::Display for AccountNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// CurrencyCode
// ============================================================================

/// ISO 4217 currency code (three uppercase ASCII letters).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: &str) -> Result<Self, ValidationError> {
        let code = code.trim();
        if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return Err(ValidationError::InvalidFormat {
                field: "currency",
                value: code.to_string(),
                expected: "ISO 4217 code (3 uppercase letters)",
            });
        }
        Ok(Self(code.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(value: CurrencyCode) -> Self {
        value.0
    }
}

impl FromStr for CurrencyCode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Auditable / Version
// ============================================================================

/// Creation and last-update timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auditable {
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Auditable {
    pub fn now() -> Self {
        let now = Utc::now();
        Self {
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Default for Auditable {
    fn default() -> Self {
        Self::now()
    }
}

/// Optimistic-lock counter.
///
/// A write carries the version it read; the store only applies it when the
/// persisted version still matches, then bumps it by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(i64);

impl Version {
    pub const INITIAL: Version = Version(0);

    pub fn new(v: i64) -> Self {
        Self(v)
    }

    #[inline]
    pub fn get(&self) -> i64 {
        self.0
    }

    #[inline]
    pub fn next(&self) -> Version {
        Version(self.0 + 1)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}
