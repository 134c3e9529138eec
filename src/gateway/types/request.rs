//! Request bodies, query strings and the validating JSON extractor

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, de::DeserializeOwned};
use utoipa::ToSchema;
use validator::{Validate, ValidationErrors};

use super::money::AmountInput;
use super::response::ApiError;
use crate::query::{PageRequest, SortDirection};

// ============================================================================
// ValidatedJson: Axum Framework Integration
// ============================================================================

/// JSON body that has passed its `validator` rules.
///
/// Malformed JSON and rule violations are both rejected with
/// `VALIDATION_FAILED` before the handler runs.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value): Json<T> = Json::from_request(req, state)
            .await
            .map_err(|e| ApiError::validation(vec![e.body_text()]))?;
        value
            .validate()
            .map_err(|e| ApiError::validation(violations(&e)))?;
        Ok(ValidatedJson(value))
    }
}

/// Flatten `validator` errors into `field: message` lines, sorted by field.
pub fn violations(errors: &ValidationErrors) -> Vec<String> {
    let mut out: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(msg) => format!("{}: {}", field, msg),
                None => format!("{}: invalid ({})", field, e.code),
            })
        })
        .collect();
    out.sort();
    out
}

// ============================================================================
// Clients
// ============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateClientRequest {
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    #[schema(example = "Ada Lovelace")]
    pub name: String,
    #[validate(email(message = "must be a valid email address"))]
    #[schema(example = "ada@example.com")]
    pub email: String,
    #[validate(length(min = 6, max = 20, message = "must be 6-20 characters"))]
    #[schema(example = "+44 20 7946 0000")]
    pub phone: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateClientRequest {
    #[validate(length(min = 1, max = 100, message = "must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "must be a valid email address"))]
    pub email: Option<String>,
    #[validate(length(min = 6, max = 20, message = "must be 6-20 characters"))]
    pub phone: Option<String>,
}

// ============================================================================
// Accounts
// ============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateAccountRequest {
    /// Owning client id (ULID)
    #[validate(length(equal = 26, message = "must be a 26 character ULID"))]
    pub owner_id: String,
    #[validate(length(equal = 3, message = "must be a 3 letter ISO 4217 code"))]
    #[schema(example = "USD")]
    pub currency: String,
    /// ACTIVE (default), INACTIVE, SUSPENDED or CLOSED
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateAccountRequest {
    #[validate(length(min = 1, message = "must not be blank"))]
    #[schema(example = "SUSPENDED")]
    pub status: String,
}

// ============================================================================
// Ledger
// ============================================================================

/// Body of `POST /transactions/credit` and `POST /transactions/debit`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EntryRequest {
    #[validate(length(min = 1, max = 32, message = "must be 1-32 characters"))]
    pub account_number: String,
    #[schema(value_type = String, example = "100.000")]
    pub amount: AmountInput,
    /// DESK (default), ATM, FEES or TRANSFER; codes DES/ATM/FEE/TRA also accepted
    pub method: Option<String>,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct TransferRequest {
    #[validate(length(min = 1, max = 32, message = "must be 1-32 characters"))]
    pub from_account: String,
    #[validate(length(min = 1, max = 32, message = "must be 1-32 characters"))]
    pub to_account: String,
    #[schema(value_type = String, example = "100.000")]
    pub amount: AmountInput,
    #[validate(length(max = 255, message = "must be at most 255 characters"))]
    pub description: Option<String>,
    /// Provider key; the configured default when absent
    #[schema(example = "fixed")]
    pub rate_provider: Option<String>,
}

// ============================================================================
// Query strings
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<SortDirection>,
}

impl PageQuery {
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(0),
            self.sort.unwrap_or_default(),
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ClientQuery {
    /// Substring of name, email or phone (case-insensitive)
    pub search: Option<String>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<SortDirection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AccountQuery {
    pub owner_id: Option<String>,
    pub status: Option<String>,
    pub currency: Option<String>,
    #[serde(default)]
    pub include_deleted: bool,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<SortDirection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransactionQuery {
    pub account_number: Option<String>,
    #[serde(rename = "type")]
    pub tx_type: Option<String>,
    pub status: Option<String>,
    pub method: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<SortDirection>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TransferQuery {
    pub from_account: Option<String>,
    pub to_account: Option<String>,
    pub from_currency: Option<String>,
    pub to_currency: Option<String>,
    pub status: Option<String>,
    pub min_amount: Option<Decimal>,
    pub max_amount: Option<Decimal>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub size: Option<u32>,
    pub sort: Option<SortDirection>,
}

/// Builds a [`PageRequest`] from the paging fields every listing query has.
pub fn page_of(page: Option<u32>, size: Option<u32>, sort: Option<SortDirection>) -> PageRequest {
    PageQuery { page, size, sort }.page_request()
}
