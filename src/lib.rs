pub mod types;
pub mod error;
pub mod config;
pub mod stats;
pub mod tiebreak;
pub mod standings;
pub mod seeding;
pub mod templates;
pub mod bracket;
pub mod progression;
pub mod store;
pub mod service;
pub mod report;

pub use config::AppConfig;
pub use error::{Error, ErrorKind, Result};
pub use seeding::{EliminationType, PlayoffFormat, PlayoffPlan, SeedingPattern};
pub use standings::OverallPolicy;
pub use store::{Division, GameResult, TournamentStore};
pub use types::*;

use std::fs;

use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber: `RUST_LOG` if set, else the configured
/// filter, written through a daily rolling file under the log directory.
/// Keep the returned guard alive for as long as logs should be flushed.
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let logs_dir = config.log_dir();
    fs::create_dir_all(&logs_dir).ok();
    let file_appender = tracing_appender::rolling::daily(&logs_dir, "pool-play.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let installed = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .with_writer(non_blocking)
        .with_ansi(false)
        .try_init();
    if installed.is_err() {
        warn!("tracing subscriber already installed; keeping the existing one");
    }
    info!(
        "pool play engine logging to {} (playoff format {}, {} seeding)",
        logs_dir.display(),
        config.playoff_format(),
        config.seeding_pattern()
    );
    guard
}

/// Loads `.env`, then the tournament config, then starts logging.
pub fn bootstrap() -> Result<(AppConfig, WorkerGuard)> {
    config::load_env_file();
    let config = config::load_config()?;
    let guard = init_logging(&config);
    Ok((config, guard))
}
