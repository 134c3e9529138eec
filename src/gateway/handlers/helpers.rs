//! Path and query parsing shared by handlers

use std::str::FromStr;

use crate::core_types::{CurrencyCode, EntityId};

use super::super::types::ApiError;

/// Parse a ULID path or query parameter.
pub fn parse_id(field: &str, value: &str) -> Result<EntityId, ApiError> {
    value
        .trim()
        .parse()
        .map_err(|_| ApiError::validation(vec![format!("{}: not a valid id", field)]))
}

/// Parse an enum name such as `ACTIVE` or `DEBIT`.
pub fn parse_enum<T>(field: &str, value: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = String>,
{
    value
        .parse()
        .map_err(|e| ApiError::validation(vec![format!("{}: {}", field, e)]))
}

/// Currency codes are accepted in any case.
pub fn parse_currency(field: &str, value: &str) -> Result<CurrencyCode, ApiError> {
    CurrencyCode::new(&value.trim().to_ascii_uppercase())
        .map_err(|e| ApiError::validation(vec![format!("{}: {}", field, e)]))
}

pub fn parse_opt<T>(
    field: &str,
    value: Option<&str>,
    parse: impl Fn(&str, &str) -> Result<T, ApiError>,
) -> Result<Option<T>, ApiError> {
    value.map(|v| parse(field, v)).transpose()
}
