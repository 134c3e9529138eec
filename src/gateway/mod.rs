//! HTTP gateway
//!
//! All ledger routes live under `/api/v1`. Successful calls answer with
//! [`types::ApiResponse`]; failures with [`types::ErrorBody`].

pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use axum::{
    Router,
    body::Body,
    http::Request,
    middleware::{Next, from_fn},
    response::Response,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::GatewayConfig;
pub use state::AppState;

/// Access log for every request.
async fn access_log(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    info!(
        %method,
        %path,
        status = response.status().as_u16(),
        latency_us = started.elapsed().as_micros() as u64,
        "HTTP request"
    );
    response
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let state = Arc::new(state);

    let api = Router::new()
        .route("/health", get(handlers::health_check))
        // Clients
        .route(
            "/clients",
            post(handlers::create_client).get(handlers::list_clients),
        )
        .route(
            "/clients/{id}",
            get(handlers::get_client)
                .put(handlers::update_client)
                .delete(handlers::delete_client),
        )
        // Accounts
        .route(
            "/accounts",
            post(handlers::create_account).get(handlers::list_accounts),
        )
        .route(
            "/accounts/{number}",
            get(handlers::get_account)
                .patch(handlers::update_account)
                .delete(handlers::delete_account),
        )
        // Ledger entries
        .route("/transactions", get(handlers::list_transactions))
        .route("/transactions/credit", post(handlers::credit))
        .route("/transactions/debit", post(handlers::debit))
        .route("/transactions/{reference}", get(handlers::get_transaction))
        // Transfers
        .route(
            "/transfers",
            post(handlers::create_transfer).get(handlers::list_transfers),
        )
        .route("/transfers/{reference}", get(handlers::get_transfer));

    Router::new()
        .nest("/api/v1", api)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()))
        .layer(from_fn(access_log))
}

/// Serve on an already bound listener until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server error")
}

/// Bind to the configured address and serve until Ctrl-C.
pub async fn run_server(config: &GatewayConfig, state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {} (port already in use?)", addr))?;

    info!(%addr, "Gateway listening");
    info!("API Docs: http://{}/docs", addr);

    serve(listener, state, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        info!("Shutdown signal received");
    })
    .await
}
