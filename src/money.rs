//! Money Module
//!
//! Fixed-precision decimal types shared by every ledger operation.
//!
//! ## Rules
//! 1. Every monetary value carries exactly [`AMOUNT_SCALE`] fractional digits
//! 2. Excess digits are dropped (round toward zero), never rounded up
//! 3. Request amounts must be strictly positive after scaling
//!
//! ## Usage
//! ```rust
//! use fund_transfer::money::{Amount, ExchangeRate};
//!
//! let sent = Amount::parse_positive("100").unwrap();
//! let rate = ExchangeRate::parse("1.25").unwrap();
//! assert_eq!(sent.checked_convert(rate).unwrap().to_string(), "125.000");
//! ```

use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of fractional digits kept on every amount and rate.
pub const AMOUNT_SCALE: u32 = 3;

/// Rounding applied whenever a value has more than [`AMOUNT_SCALE`] digits.
pub const ROUNDING: RoundingStrategy = RoundingStrategy::ToZero;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MoneyError {
    #[error("Amount must be greater than zero")]
    NotPositive,

    #[error("Exchange rate must be greater than zero")]
    InvalidRate,

    #[error("Amount would overflow")]
    Overflow,

    #[error("Invalid format: {0}")]
    InvalidFormat(String),
}

/// Largest magnitude that still carries [`AMOUNT_SCALE`] fractional digits.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(u32::MAX, u32::MAX, u32::MAX, false, AMOUNT_SCALE);

/// Apply the ledger scale and rounding to a raw decimal.
///
/// `rescale` silently keeps fewer digits when the value has no room for
/// three; that is an overflow here.
fn normalize(value: Decimal) -> Result<Decimal, MoneyError> {
    let mut scaled = value.round_dp_with_strategy(AMOUNT_SCALE, ROUNDING);
    scaled.rescale(AMOUNT_SCALE);
    if scaled.scale() == AMOUNT_SCALE {
        Ok(scaled)
    } else {
        Err(MoneyError::Overflow)
    }
}

fn parse_decimal(s: &str) -> Result<Decimal, MoneyError> {
    let s = s.trim();
    if s.is_empty() {
        return Err(MoneyError::InvalidFormat("empty string".into()));
    }
    if s.starts_with('.') || s.ends_with('.') {
        return Err(MoneyError::InvalidFormat(format!(
            "'{}' (use 0.5 not .5, 5.0 not 5.)",
            s
        )));
    }
    Decimal::from_str(s).map_err(|e| MoneyError::InvalidFormat(e.to_string()))
}

// ============================================================================
// Amount
// ============================================================================

/// Monetary amount at ledger scale.
///
/// Balances may legitimately be zero; request amounts go through
/// [`Amount::positive`] or [`Amount::parse_positive`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Scale a raw decimal to ledger precision (truncating). Fails with
    /// `Overflow` above [`MAX_AMOUNT`].
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        normalize(value).map(Self)
    }

    /// Scale and require the result to be strictly positive.
    ///
    /// `0.0009` truncates to `0.000` and is rejected.
    pub fn positive(value: Decimal) -> Result<Self, MoneyError> {
        let amount = Self::new(value)?;
        if amount.is_positive() {
            Ok(amount)
        } else {
            Err(MoneyError::NotPositive)
        }
    }

    pub fn parse(s: &str) -> Result<Self, MoneyError> {
        parse_decimal(s).and_then(Self::new)
    }

    pub fn parse_positive(s: &str) -> Result<Self, MoneyError> {
        parse_decimal(s).and_then(Self::positive)
    }

    #[inline]
    pub fn value(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn checked_add(self, other: Amount) -> Result<Amount, MoneyError> {
        self.0
            .checked_add(other.0)
            .ok_or(MoneyError::Overflow)
            .and_then(Self::new)
    }

    pub fn checked_sub(self, other: Amount) -> Result<Amount, MoneyError> {
        self.0
            .checked_sub(other.0)
            .ok_or(MoneyError::Overflow)
            .and_then(Self::new)
    }

    /// Convert into another currency: `self × rate`, truncated to ledger scale.
    ///
    /// A product too wide for `Decimal` comes back rounded at a smaller
    /// scale; that is reported as `Overflow` rather than truncated.
    pub fn checked_convert(self, rate: ExchangeRate) -> Result<Amount, MoneyError> {
        let product = self.0.checked_mul(rate.0).ok_or(MoneyError::Overflow)?;
        if product.scale() < self.0.scale() + rate.0.scale() {
            return Err(MoneyError::Overflow);
        }
        Self::new(product)
    }
}

impl Default for Amount {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(value: Amount) -> Self {
        value.0
    }
}

impl FromStr for Amount {
    type Err = MoneyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// ExchangeRate
// ============================================================================

/// Conversion multiplier between two currencies, at ledger scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct ExchangeRate(Decimal);

impl ExchangeRate {
    pub const ONE: ExchangeRate = ExchangeRate(Decimal::from_parts(1000, 0, 0, false, AMOUNT_SCALE));

    /// Scale a provider rate; a rate that truncates to zero is rejected.
    pub fn new(value: Decimal) -> Result<Self, MoneyError> {
        let rate = normalize(value)?;
        if rate > Decimal::ZERO {
            Ok(Self(rate))
        } else {
            Err(MoneyError::InvalidRate)
        }
    }

    pub fn parse(s: &str) -> Result<Self, MoneyError> {
        parse_decimal(s).and_then(Self::new)
    }

    #[inline]
    pub fn value(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_identity(&self) -> bool {
        self.0 == Decimal::ONE
    }
}

impl TryFrom<Decimal> for ExchangeRate {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ExchangeRate> for Decimal {
    fn from(value: ExchangeRate) -> Self {
        value.0
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_amount_truncates_toward_zero() {
        assert_eq!(Amount::new(dec("1.2349")).unwrap().to_string(), "1.234");
        assert_eq!(Amount::new(dec("-1.2349")).unwrap().to_string(), "-1.234");
        assert_eq!(Amount::new(dec("7")).unwrap().to_string(), "7.000");
    }

    #[test]
    fn test_positive_rejects_zero_after_scaling() {
        assert_eq!(Amount::positive(dec("0.0009")), Err(MoneyError::NotPositive));
        assert_eq!(Amount::positive(dec("-5")), Err(MoneyError::NotPositive));
        assert_eq!(Amount::positive(Decimal::ZERO), Err(MoneyError::NotPositive));
        assert!(Amount::positive(dec("0.001")).is_ok());
    }

    #[test]
    fn test_parse_rejects_ambiguous_formats() {
        assert!(matches!(Amount::parse(".5"), Err(MoneyError::InvalidFormat(_))));
        assert!(matches!(Amount::parse("5."), Err(MoneyError::InvalidFormat(_))));
        assert!(matches!(Amount::parse(""), Err(MoneyError::InvalidFormat(_))));
        assert!(matches!(Amount::parse("abc"), Err(MoneyError::InvalidFormat(_))));
        assert_eq!(Amount::parse(" 12.5 ").unwrap().to_string(), "12.500");
    }

    #[test]
    fn test_convert_scenario() {
        let sent = Amount::parse_positive("100.000").unwrap();
        let rate = ExchangeRate::parse("1.25").unwrap();
        assert_eq!(sent.checked_convert(rate).unwrap().to_string(), "125.000");
    }

    #[test]
    fn test_convert_truncates_product() {
        // 10.001 * 0.333 = 3.330333
        let sent = Amount::parse_positive("10.001").unwrap();
        let rate = ExchangeRate::parse("0.333").unwrap();
        assert_eq!(sent.checked_convert(rate).unwrap().to_string(), "3.330");
    }

    #[test]
    fn test_scale_is_kept_up_to_max_amount() {
        let max = Amount::new(MAX_AMOUNT).unwrap();
        assert_eq!(max.to_string(), "79228162514264337593543950.335");
        assert_eq!(max.value().scale(), AMOUNT_SCALE);

        // One more integer digit leaves no room for three decimals
        assert_eq!(Amount::new(dec("100000000000000000000000000")), Err(MoneyError::Overflow));
        assert_eq!(Amount::parse("79228162514264337593543951"), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_add_past_max_is_overflow_not_rounding() {
        let big = Amount::parse("70000000000000000000000000.999").unwrap();
        assert_eq!(big.value().scale(), AMOUNT_SCALE);
        assert_eq!(big.checked_add(big), Err(MoneyError::Overflow));

        let max = Amount::new(MAX_AMOUNT).unwrap();
        let tick = Amount::parse("0.001").unwrap();
        assert_eq!(max.checked_add(tick), Err(MoneyError::Overflow));
        assert_eq!(
            max.checked_sub(tick).unwrap().to_string(),
            "79228162514264337593543950.334"
        );
    }

    #[test]
    fn test_convert_past_max_is_overflow() {
        let big = Amount::parse("70000000000000000000000000").unwrap();
        let rate = ExchangeRate::parse("1.5").unwrap();
        assert_eq!(big.checked_convert(rate), Err(MoneyError::Overflow));
    }

    #[test]
    fn test_rate_is_scaled_and_positive() {
        assert_eq!(ExchangeRate::parse("0.92345").unwrap().to_string(), "0.923");
        assert_eq!(ExchangeRate::parse("0.0004"), Err(MoneyError::InvalidRate));
        assert_eq!(ExchangeRate::parse("-1"), Err(MoneyError::InvalidRate));
        assert!(ExchangeRate::ONE.is_identity());
    }

    #[test]
    fn test_add_sub_round_trip() {
        let balance = Amount::parse("1000").unwrap();
        let delta = Amount::parse_positive("99.999").unwrap();
        let after = balance.checked_add(delta).unwrap();
        assert_eq!(after.to_string(), "1099.999");
        assert_eq!(after.checked_sub(delta).unwrap(), balance);
    }

    #[test]
    fn test_serde_as_decimal_string() {
        let amount = Amount::parse("42.1").unwrap();
        let json = serde_json::to_string(&amount).unwrap();
        assert_eq!(json, "\"42.100\"");
        let back: Amount = serde_json::from_str("\"42.1009\"").unwrap();
        assert_eq!(back, amount);
        assert!(serde_json::from_str::<Amount>("\"100000000000000000000000000\"").is_err());
    }
}
