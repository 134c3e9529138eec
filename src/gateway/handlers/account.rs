//! Account handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};

use super::super::state::AppState;
use super::super::types::{
    AccountQuery, ApiResult, CreateAccountRequest, ErrorBody, UpdateAccountRequest, ValidatedJson,
    created, ok, page_of,
};
use super::helpers::{parse_currency, parse_enum, parse_id, parse_opt};
use crate::account::{Account, AccountStatus, NewAccount};
use crate::core_types::AccountNumber;
use crate::query::{AccountFilter, Page};

/// Open an account for a client
///
/// POST /api/v1/accounts
#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 201, description = "Account opened with a zero balance", content_type = "application/json"),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 404, description = "Owner not found", body = ErrorBody)
    ),
    tag = "Accounts"
)]
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateAccountRequest>,
) -> ApiResult<Account> {
    let owner_id = parse_id("owner_id", &req.owner_id)?;
    let status = parse_opt("status", req.status.as_deref(), parse_enum::<AccountStatus>)?;
    let account = state
        .accounts
        .create_account(NewAccount {
            owner_id,
            currency: req.currency,
            status,
        })
        .await?;
    created(account)
}

/// GET /api/v1/accounts?owner_id=&status=&currency=&include_deleted=
#[utoipa::path(
    get,
    path = "/api/v1/accounts",
    params(
        ("owner_id" = Option<String>, Query, description = "Owning client id"),
        ("status" = Option<String>, Query, description = "Account status"),
        ("currency" = Option<String>, Query, description = "ISO 4217 code"),
        ("include_deleted" = Option<bool>, Query, description = "Include soft-deleted accounts"),
        ("page" = Option<u32>, Query, description = "Zero-based page"),
        ("size" = Option<u32>, Query, description = "Page size, max 20"),
        ("sort" = Option<String>, Query, description = "asc or desc by creation time")
    ),
    responses((status = 200, description = "Page of accounts", content_type = "application/json")),
    tag = "Accounts"
)]
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AccountQuery>,
) -> ApiResult<Page<Account>> {
    let filter = AccountFilter {
        owner_id: parse_opt("owner_id", query.owner_id.as_deref(), parse_id)?,
        status: parse_opt("status", query.status.as_deref(), parse_enum::<AccountStatus>)?,
        currency: parse_opt("currency", query.currency.as_deref(), parse_currency)?,
        include_deleted: query.include_deleted,
    };
    let page = page_of(query.page, query.size, query.sort);
    ok(state.accounts.list_accounts(&filter, &page).await?)
}

/// GET /api/v1/accounts/{number}
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{number}",
    params(("number" = String, Path, description = "Account number")),
    responses(
        (status = 200, description = "Account with balances", content_type = "application/json"),
        (status = 404, description = "Account not found", body = ErrorBody)
    ),
    tag = "Accounts"
)]
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    Path(number): Path<String>,
) -> ApiResult<Account> {
    let number = AccountNumber::from(number);
    ok(state.accounts.get_account_by_number(&number).await?)
}

/// Change account status
///
/// PATCH /api/v1/accounts/{number}
#[utoipa::path(
    patch,
    path = "/api/v1/accounts/{number}",
    params(("number" = String, Path, description = "Account number")),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Account updated", content_type = "application/json"),
        (status = 404, description = "Account not found", body = ErrorBody),
        (status = 422, description = "Account is deleted", body = ErrorBody)
    ),
    tag = "Accounts"
)]
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    Path(number): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateAccountRequest>,
) -> ApiResult<Account> {
    let number = AccountNumber::from(number);
    let status: AccountStatus = parse_enum("status", &req.status)?;
    ok(state.accounts.update_account_status(&number, status).await?)
}

/// DELETE /api/v1/accounts/{number}
#[utoipa::path(
    delete,
    path = "/api/v1/accounts/{number}",
    params(("number" = String, Path, description = "Account number")),
    responses(
        (status = 200, description = "Account soft-deleted", content_type = "application/json"),
        (status = 404, description = "Account not found", body = ErrorBody)
    ),
    tag = "Accounts"
)]
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    Path(number): Path<String>,
) -> ApiResult<Account> {
    let number = AccountNumber::from(number);
    ok(state.accounts.delete_account(&number).await?)
}
