//! Global tracing subscriber: a rolling log file plus colored stdout
//! (text mode), or the file alone as JSON lines.

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use crate::config::AppConfig;

/// Noisy dependencies are capped at `warn` unless `RUST_LOG` says otherwise.
const QUIET_DEPS: &str = "sqlx=warn,hyper=warn,reqwest=warn";

fn rotation(name: &str) -> Rotation {
    match name.trim().to_ascii_lowercase().as_str() {
        "minutely" => Rotation::MINUTELY,
        "hourly" => Rotation::HOURLY,
        "daily" => Rotation::DAILY,
        _ => Rotation::NEVER,
    }
}

fn filter_directives(config: &AppConfig) -> String {
    format!("{},{}", config.log_level, QUIET_DEPS)
}

/// Install the global subscriber. Keep the returned guard alive for the
/// lifetime of the process or buffered file output is lost.
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let appender = RollingFileAppender::new(
        rotation(&config.rotation),
        &config.log_dir,
        &config.log_file,
    );
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(config)));
    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_target(true)
                    .with_writer(writer)
                    .with_ansi(false),
            )
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(false).with_writer(writer).with_ansi(false))
            .with(fmt::layer().with_target(false).with_ansi(true))
            .init();
    }

    guard
}
