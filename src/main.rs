//! fund_transfer - ledger service
//!
//! ```text
//! ┌──────────┐    ┌──────────────┐    ┌─────────────┐    ┌─────────────┐
//! │  Config  │───▶│ LedgerStore  │───▶│  Services   │───▶│   Gateway   │
//! │  (YAML)  │    │ (PG or RAM)  │    │ (ledger+FX) │    │ (axum HTTP) │
//! └──────────┘    └──────────────┘    └─────────────┘    └─────────────┘
//! ```
//!
//! Usage: `fund_transfer [--env dev|prod]`

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use fund_transfer::config::AppConfig;
use fund_transfer::db::Database;
use fund_transfer::gateway::{self, AppState};
use fund_transfer::logging::init_logging;
use fund_transfer::store::{LedgerStore, MemoryStore, PgStore};

fn get_env() -> String {
    let args: Vec<String> = std::env::args().collect();
    for i in 0..args.len() {
        if (args[i] == "--env" || args[i] == "-e") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }
    "dev".to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = get_env();
    let config = AppConfig::load(&env)?;
    let _log_guard = init_logging(&config);
    info!(%env, "Starting fund_transfer");

    let (store, database): (Arc<dyn LedgerStore>, Option<Database>) = match config.postgres_url {
        Some(ref url) => {
            let db = Database::connect(url)
                .await
                .context("Failed to connect to PostgreSQL")?;
            db.migrate().await.context("Failed to apply ledger schema")?;
            (Arc::new(PgStore::new(&db)), Some(db))
        }
        None => {
            info!("No postgres_url configured, using in-memory ledger");
            (Arc::new(MemoryStore::new()), None)
        }
    };

    let mut state =
        AppState::from_config(&config, store).context("Invalid exchange_rate configuration")?;
    if let Some(db) = database {
        state = state.with_database(db);
    }
    info!(
        provider = %config.exchange_rate.default_provider,
        sufficiency = ?config.ledger.sufficiency,
        "Ledger services ready"
    );

    gateway::run_server(&config.gateway, state).await
}
