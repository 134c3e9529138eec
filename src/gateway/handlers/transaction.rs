//! Debit, credit and transaction lookup handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};

use super::super::state::AppState;
use super::super::types::{
    ApiError, ApiResult, EntryRequest, ErrorBody, TransactionQuery, ValidatedJson, created, ok,
    page_of,
};
use super::helpers::{parse_enum, parse_opt};
use crate::core_types::AccountNumber;
use crate::query::{Page, TransactionFilter};
use crate::transaction::{
    EntryCommand, Transaction, TransactionMethod, TransactionStatus, TransactionType,
};

fn entry_command(req: EntryRequest) -> Result<EntryCommand, ApiError> {
    let method = parse_opt("method", req.method.as_deref(), parse_enum::<TransactionMethod>)?
        .unwrap_or(TransactionMethod::Desk);
    Ok(EntryCommand {
        account_number: AccountNumber::from(req.account_number),
        amount: req.amount.amount(),
        method,
        description: req.description,
    })
}

/// Credit an account
///
/// POST /api/v1/transactions/credit
#[utoipa::path(
    post,
    path = "/api/v1/transactions/credit",
    request_body = EntryRequest,
    responses(
        (status = 201, description = "CREDIT transaction recorded", content_type = "application/json"),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Account not found", body = ErrorBody),
        (status = 422, description = "Account inactive", body = ErrorBody)
    ),
    tag = "Transactions"
)]
pub async fn credit(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<EntryRequest>,
) -> ApiResult<Transaction> {
    let cmd = entry_command(req)?;
    created(state.recorder.record_credit(cmd).await?)
}

/// Debit an account
///
/// POST /api/v1/transactions/debit
#[utoipa::path(
    post,
    path = "/api/v1/transactions/debit",
    request_body = EntryRequest,
    responses(
        (status = 201, description = "DEBIT transaction recorded", content_type = "application/json"),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Account not found", body = ErrorBody),
        (status = 422, description = "Account inactive or insufficient funds", body = ErrorBody)
    ),
    tag = "Transactions"
)]
pub async fn debit(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<EntryRequest>,
) -> ApiResult<Transaction> {
    let cmd = entry_command(req)?;
    created(state.recorder.record_debit(cmd).await?)
}

/// GET /api/v1/transactions/{reference}
#[utoipa::path(
    get,
    path = "/api/v1/transactions/{reference}",
    params(("reference" = String, Path, description = "Transaction reference, e.g. DE-7K2M9QXA")),
    responses(
        (status = 200, description = "Transaction", content_type = "application/json"),
        (status = 404, description = "Transaction not found", body = ErrorBody)
    ),
    tag = "Transactions"
)]
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
) -> ApiResult<Transaction> {
    ok(state.recorder.get_by_reference(&reference).await?)
}

/// GET /api/v1/transactions?account_number=&type=&status=&method=&from=&to=
#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    params(
        ("account_number" = Option<String>, Query, description = "Account number"),
        ("type" = Option<String>, Query, description = "DEBIT or CREDIT"),
        ("status" = Option<String>, Query, description = "SUCCESS, FAILED or PENDING"),
        ("method" = Option<String>, Query, description = "DESK, ATM, FEES or TRANSFER"),
        ("from" = Option<String>, Query, description = "RFC 3339 lower bound, inclusive"),
        ("to" = Option<String>, Query, description = "RFC 3339 upper bound, inclusive"),
        ("page" = Option<u32>, Query, description = "Zero-based page"),
        ("size" = Option<u32>, Query, description = "Page size, max 20"),
        ("sort" = Option<String>, Query, description = "asc or desc by timestamp")
    ),
    responses((status = 200, description = "Page of transactions", content_type = "application/json")),
    tag = "Transactions"
)]
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TransactionQuery>,
) -> ApiResult<Page<Transaction>> {
    let filter = TransactionFilter {
        account_number: query.account_number.map(AccountNumber::from),
        tx_type: parse_opt("type", query.tx_type.as_deref(), parse_enum::<TransactionType>)?,
        status: parse_opt("status", query.status.as_deref(), parse_enum::<TransactionStatus>)?,
        method: parse_opt("method", query.method.as_deref(), parse_enum::<TransactionMethod>)?,
        from: query.from,
        to: query.to,
    };
    let page = page_of(query.page, query.size, query.sort);
    ok(state.recorder.list(&filter, &page).await?)
}
