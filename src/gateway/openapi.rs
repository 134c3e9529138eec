//! OpenAPI / Swagger UI Documentation
//!
//! - Swagger UI: `http://localhost:8080/docs`
//! - OpenAPI JSON: `http://localhost:8080/api-docs/openapi.json`

use utoipa::OpenApi;

use crate::gateway::handlers::HealthResponse;
use crate::gateway::types::{
    CreateAccountRequest, CreateClientRequest, EntryRequest, ErrorBody, TransferRequest,
    UpdateAccountRequest, UpdateClientRequest,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Fund Transfer Ledger API",
        version = "0.1.0",
        description = "Clients, currency accounts, debit/credit entries and atomic cross-currency transfers.",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Development"),
    ),
    paths(
        crate::gateway::handlers::health::health_check,
        crate::gateway::handlers::client::create_client,
        crate::gateway::handlers::client::list_clients,
        crate::gateway::handlers::client::get_client,
        crate::gateway::handlers::client::update_client,
        crate::gateway::handlers::client::delete_client,
        crate::gateway::handlers::account::create_account,
        crate::gateway::handlers::account::list_accounts,
        crate::gateway::handlers::account::get_account,
        crate::gateway::handlers::account::update_account,
        crate::gateway::handlers::account::delete_account,
        crate::gateway::handlers::transaction::credit,
        crate::gateway::handlers::transaction::debit,
        crate::gateway::handlers::transaction::get_transaction,
        crate::gateway::handlers::transaction::list_transactions,
        crate::gateway::handlers::transfer::create_transfer,
        crate::gateway::handlers::transfer::get_transfer,
        crate::gateway::handlers::transfer::list_transfers,
    ),
    components(
        schemas(
            HealthResponse,
            ErrorBody,
            CreateClientRequest,
            UpdateClientRequest,
            CreateAccountRequest,
            UpdateAccountRequest,
            EntryRequest,
            TransferRequest,
        )
    ),
    tags(
        (name = "System", description = "Health"),
        (name = "Clients", description = "Client registration and maintenance"),
        (name = "Accounts", description = "Currency accounts"),
        (name = "Transactions", description = "Debit and credit entries"),
        (name = "Transfers", description = "Account-to-account transfers")
    )
)]
pub struct ApiDoc;
