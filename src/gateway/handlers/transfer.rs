//! Transfer handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};

use super::super::state::AppState;
use super::super::types::{
    ApiError, ApiResult, ErrorBody, TransferQuery, TransferRequest, ValidatedJson, created, ok, page_of,
};
use super::helpers::{parse_currency, parse_enum, parse_opt};
use crate::core_types::AccountNumber;
use crate::money::Amount;
use crate::query::{Page, TransferFilter};
use crate::transfer::{Transfer, TransferCommand, TransferStatus};

fn bound(field: &str, value: Option<rust_decimal::Decimal>) -> Result<Option<Amount>, ApiError> {
    value
        .map(Amount::new)
        .transpose()
        .map_err(|e| ApiError::validation(vec![format!("{}: {}", field, e)]))
}

/// Transfer between two accounts
///
/// POST /api/v1/transfers
///
/// Debit, credit and the transfer record commit together. On any error
/// neither balance has moved.
#[utoipa::path(
    post,
    path = "/api/v1/transfers",
    request_body = TransferRequest,
    responses(
        (status = 201, description = "Transfer completed", content_type = "application/json"),
        (status = 400, description = "Validation failed or unknown rate provider", body = ErrorBody),
        (status = 404, description = "Source or destination account not found", body = ErrorBody),
        (status = 422, description = "Account inactive or insufficient funds", body = ErrorBody),
        (status = 503, description = "Exchange rate unavailable", body = ErrorBody)
    ),
    tag = "Transfers"
)]
pub async fn create_transfer(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<TransferRequest>,
) -> ApiResult<Transfer> {
    let cmd = TransferCommand {
        from_account: AccountNumber::from(req.from_account),
        to_account: AccountNumber::from(req.to_account),
        amount: req.amount.amount(),
        description: req.description,
        rate_provider: req.rate_provider,
    };
    created(state.transfers.make_transfer(cmd).await?)
}

/// GET /api/v1/transfers/{reference}
#[utoipa::path(
    get,
    path = "/api/v1/transfers/{reference}",
    params(("reference" = String, Path, description = "Transfer reference, e.g. TR-4XQ2B7LM")),
    responses(
        (status = 200, description = "Transfer", content_type = "application/json"),
        (status = 404, description = "Transfer not found", body = ErrorBody)
    ),
    tag = "Transfers"
)]
pub async fn get_transfer(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
) -> ApiResult<Transfer> {
    ok(state.transfers.get_by_reference(&reference).await?)
}

/// GET /api/v1/transfers?from_account=&to_account=&status=&min_amount=...
#[utoipa::path(
    get,
    path = "/api/v1/transfers",
    params(
        ("from_account" = Option<String>, Query, description = "Source account number"),
        ("to_account" = Option<String>, Query, description = "Destination account number"),
        ("from_currency" = Option<String>, Query, description = "Source currency"),
        ("to_currency" = Option<String>, Query, description = "Destination currency"),
        ("status" = Option<String>, Query, description = "Transfer status"),
        ("min_amount" = Option<String>, Query, description = "Minimum amount sent"),
        ("max_amount" = Option<String>, Query, description = "Maximum amount sent"),
        ("from" = Option<String>, Query, description = "RFC 3339 lower bound, inclusive"),
        ("to" = Option<String>, Query, description = "RFC 3339 upper bound, inclusive"),
        ("page" = Option<u32>, Query, description = "Zero-based page"),
        ("size" = Option<u32>, Query, description = "Page size, max 20"),
        ("sort" = Option<String>, Query, description = "asc or desc by timestamp")
    ),
    responses((status = 200, description = "Page of transfers", content_type = "application/json")),
    tag = "Transfers"
)]
pub async fn list_transfers(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TransferQuery>,
) -> ApiResult<Page<Transfer>> {
    let filter = TransferFilter {
        from_account: query.from_account.map(AccountNumber::from),
        to_account: query.to_account.map(AccountNumber::from),
        from_currency: parse_opt("from_currency", query.from_currency.as_deref(), parse_currency)?,
        to_currency: parse_opt("to_currency", query.to_currency.as_deref(), parse_currency)?,
        status: parse_opt("status", query.status.as_deref(), parse_enum::<TransferStatus>)?,
        min_amount: bound("min_amount", query.min_amount)?,
        max_amount: bound("max_amount", query.max_amount)?,
        from: query.from,
        to: query.to,
    };
    let page = page_of(query.page, query.size, query.sort);
    ok(state.transfers.list(&filter, &page).await?)
}
