//! Amount input type for request bodies

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::Amount;

/// Monetary amount as sent by API clients.
///
/// Only JSON strings are accepted so no precision is lost in a float. The
/// format is checked during deserialization:
/// - no `.5` or `5.` shorthands
/// - no exponent, no sign
///
/// The value is truncated to three decimals here; values too large to keep
/// three decimals are rejected. Positivity is left to the ledger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AmountInput(Amount);

impl AmountInput {
    pub fn amount(self) -> Amount {
        self.0
    }
}

impl<'de> Deserialize<'de> for AmountInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        use serde::de::Error;

        let s = String::deserialize(deserializer)?;
        let s = s.trim();

        if s.is_empty() {
            return Err(D::Error::custom("amount cannot be empty"));
        }
        if s.starts_with('.') || s.ends_with('.') {
            return Err(D::Error::custom("amount must have digits on both sides of '.'"));
        }
        if s.contains(['e', 'E']) {
            return Err(D::Error::custom("amount must not use scientific notation"));
        }
        if s.starts_with(['+', '-']) {
            return Err(D::Error::custom("amount must be unsigned"));
        }

        let value = Decimal::from_str(s)
            .map_err(|e| D::Error::custom(format!("invalid amount: {}", e)))?;
        Amount::new(value)
            .map(AmountInput)
            .map_err(|e| D::Error::custom(format!("invalid amount: {}", e)))
    }
}

impl Serialize for AmountInput {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}
