//! Client handlers

use std::sync::Arc;

use axum::extract::{Path, Query, State};

use super::super::state::AppState;
use super::super::types::{
    ApiResult, ClientQuery, CreateClientRequest, ErrorBody, UpdateClientRequest, ValidatedJson,
    created, ok, page_of,
};
use super::helpers::parse_id;
use crate::account::{Client, ClientUpdate, NewClient};
use crate::query::{ClientFilter, Page};

/// Register a client
///
/// POST /api/v1/clients
#[utoipa::path(
    post,
    path = "/api/v1/clients",
    request_body = CreateClientRequest,
    responses(
        (status = 201, description = "Client created", content_type = "application/json"),
        (status = 400, description = "Validation failed", body = ErrorBody),
        (status = 409, description = "Email or phone already used", body = ErrorBody)
    ),
    tag = "Clients"
)]
pub async fn create_client(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<CreateClientRequest>,
) -> ApiResult<Client> {
    let client = state
        .accounts
        .create_client(NewClient {
            name: req.name,
            email: req.email,
            phone: req.phone,
        })
        .await?;
    created(client)
}

/// GET /api/v1/clients?search=&page=0&size=10&sort=desc
#[utoipa::path(
    get,
    path = "/api/v1/clients",
    params(
        ("search" = Option<String>, Query, description = "Substring of name, email or phone"),
        ("page" = Option<u32>, Query, description = "Zero-based page"),
        ("size" = Option<u32>, Query, description = "Page size, max 20"),
        ("sort" = Option<String>, Query, description = "asc or desc by creation time")
    ),
    responses((status = 200, description = "Page of clients", content_type = "application/json")),
    tag = "Clients"
)]
pub async fn list_clients(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ClientQuery>,
) -> ApiResult<Page<Client>> {
    let filter = ClientFilter {
        search: query.search,
    };
    let page = page_of(query.page, query.size, query.sort);
    ok(state.accounts.list_clients(&filter, &page).await?)
}

/// GET /api/v1/clients/{id}
#[utoipa::path(
    get,
    path = "/api/v1/clients/{id}",
    params(("id" = String, Path, description = "Client id (ULID)")),
    responses(
        (status = 200, description = "Client", content_type = "application/json"),
        (status = 404, description = "Client not found", body = ErrorBody)
    ),
    tag = "Clients"
)]
pub async fn get_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Client> {
    let id = parse_id("id", &id)?;
    ok(state.accounts.get_client(id).await?)
}

/// PUT /api/v1/clients/{id}
#[utoipa::path(
    put,
    path = "/api/v1/clients/{id}",
    params(("id" = String, Path, description = "Client id (ULID)")),
    request_body = UpdateClientRequest,
    responses(
        (status = 200, description = "Client updated", content_type = "application/json"),
        (status = 404, description = "Client not found", body = ErrorBody),
        (status = 409, description = "Email or phone already used", body = ErrorBody)
    ),
    tag = "Clients"
)]
pub async fn update_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    ValidatedJson(req): ValidatedJson<UpdateClientRequest>,
) -> ApiResult<Client> {
    let id = parse_id("id", &id)?;
    let update = ClientUpdate {
        name: req.name,
        email: req.email,
        phone: req.phone,
    };
    ok(state.accounts.update_client(id, update).await?)
}

/// DELETE /api/v1/clients/{id}
#[utoipa::path(
    delete,
    path = "/api/v1/clients/{id}",
    params(("id" = String, Path, description = "Client id (ULID)")),
    responses(
        (status = 200, description = "Client soft-deleted", content_type = "application/json"),
        (status = 404, description = "Client not found", body = ErrorBody)
    ),
    tag = "Clients"
)]
pub async fn delete_client(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Client> {
    let id = parse_id("id", &id)?;
    ok(state.accounts.delete_client(id).await?)
}
