//! Init-db CLI command.

use anyhow::Result;
use clap::Args;

/// Arguments for the init-db command.
#[derive(Args, Debug, Clone)]
pub struct InitDbArgs {
    /// Directory holding Config.toml
    #[arg(long, default_value = valuebet_core::DEFAULT_CONFIG_DIR)]
    pub config_dir: String,
}

/// Creates the source and value bet tables if they are missing.
///
/// # Errors
/// Returns an error if configuration loading, connecting or a DDL statement fails.
pub async fn run_init_db(args: InitDbArgs) -> Result<()> {
    let config = super::load_config(&args.config_dir, None)?;
    let db = super::connect(&config).await?;
    db.ensure_schema().await?;

    tracing::info!("Database initialized");
    Ok(())
}
