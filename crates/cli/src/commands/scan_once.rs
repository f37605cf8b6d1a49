//! Scan-once CLI command.
//!
//! Runs a single pass, sweep included, and prints its summary. Useful for
//! checking a profile before leaving the scanner running.

use anyhow::Result;
use clap::Args;

/// Arguments for the scan-once command.
#[derive(Args, Debug, Clone)]
pub struct ScanOnceArgs {
    /// Configuration profile to layer on top of Config.toml (e.g. "line", "live")
    #[arg(long, env = "VALUEBET_PROFILE")]
    pub profile: Option<String>,

    /// Directory holding Config.toml
    #[arg(long, default_value = valuebet_core::DEFAULT_CONFIG_DIR)]
    pub config_dir: String,
}

/// Runs the scan-once command.
///
/// # Errors
/// Returns an error if configuration, the database connection or the sweep fails.
pub async fn run_scan_once(args: ScanOnceArgs) -> Result<()> {
    let config = super::load_config(&args.config_dir, args.profile.as_deref())?;
    let db = super::connect(&config).await?;
    let scanner = super::build_scanner(&db, &config.scanner);

    let summary = scanner.run_pass().await?;
    println!("{summary}");
    Ok(())
}
