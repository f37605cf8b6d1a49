//! CLI commands for the value bet scanner.

pub mod init_db;
pub mod run;
pub mod scan_once;

pub use init_db::{run_init_db, InitDbArgs};
pub use run::{run_scanner, RunArgs};
pub use scan_once::{run_scan_once, ScanOnceArgs};

use anyhow::{Context, Result};
use std::sync::Arc;
use valuebet_core::{AppConfig, ConfigLoader, ScannerConfig};
use valuebet_data::DatabaseClient;
use valuebet_scanner::{SourcePair, ValueBetScanner};

/// Loads layered configuration from `dir`, optionally with a profile.
pub(crate) fn load_config(dir: &str, profile: Option<&str>) -> Result<AppConfig> {
    ConfigLoader::load_from(dir, profile)
        .with_context(|| format!("Failed to load configuration from {dir}"))
}

pub(crate) async fn connect(config: &AppConfig) -> Result<DatabaseClient> {
    DatabaseClient::new(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to connect to database")
}

/// Wires the configured source pairs and value bet collection to the database.
pub(crate) fn build_scanner(db: &DatabaseClient, config: &ScannerConfig) -> ValueBetScanner {
    let pairs = config
        .pairs
        .iter()
        .map(|pair| {
            SourcePair::new(
                Arc::new(db.event_source(&pair.reference)),
                Arc::new(db.event_source(&pair.other)),
            )
        })
        .collect();
    let store = Arc::new(db.value_bets(&config.value_bet_collection));

    ValueBetScanner::new(config.clone(), pairs, store)
}
