//! Run CLI command.
//!
//! Long-running scan loop. Each iteration picks up the latest configuration
//! from the file watcher, runs one pass and pauses before the next one.
//! Pass failures are logged and the loop carries on; SIGINT or SIGTERM
//! stops it, cancelling a pass in flight.

use anyhow::Result;
use clap::Args;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info, warn};
use valuebet_core::ConfigWatcher;

/// Arguments for the run command.
#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    /// Configuration profile to layer on top of Config.toml (e.g. "line", "live")
    #[arg(long, env = "VALUEBET_PROFILE")]
    pub profile: Option<String>,

    /// Directory holding Config.toml
    #[arg(long, default_value = valuebet_core::DEFAULT_CONFIG_DIR)]
    pub config_dir: String,

    /// Optional log file path (appends instead of logging to stderr)
    #[arg(long)]
    pub log_file: Option<String>,
}

async fn shutdown_signal() {
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!(error = %e, "Cannot listen for SIGTERM, only Ctrl+C will stop the scanner");
            let _ = tokio::signal::ctrl_c().await;
            info!("Received SIGINT (Ctrl+C), shutting down");
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received SIGINT (Ctrl+C), shutting down");
        }
    }
}

/// Runs the scanner until a shutdown signal arrives.
///
/// # Errors
/// Returns an error if the initial configuration cannot be loaded or the
/// database is unreachable at startup.
pub async fn run_scanner(args: RunArgs) -> Result<()> {
    let config = super::load_config(&args.config_dir, args.profile.as_deref())?;

    info!(
        profile = args.profile.as_deref().unwrap_or("default"),
        mode = %config.scanner.mode,
        pairs = config.scanner.pairs.len(),
        competitions = config.scanner.competitions.len(),
        "Starting value bet scanner"
    );

    // the pool is built once; database settings need a restart
    let db = super::connect(&config).await?;

    let (watcher, mut config_rx) = ConfigWatcher::new(config, &args.config_dir, args.profile.clone());
    let watcher_handle = tokio::spawn(async move {
        if let Err(e) = watcher.watch().await {
            warn!(error = %e, "Config watcher stopped");
        }
    });

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    let mut pass: u64 = 0;
    loop {
        let config = config_rx.borrow_and_update().clone();
        let scanner = super::build_scanner(&db, &config.scanner);
        pass += 1;

        tokio::select! {
            () = &mut shutdown => break,
            result = scanner.run_pass() => match result {
                Ok(summary) => info!(pass, %summary, "Pass finished"),
                Err(e) => error!(pass, error = ?e, "Pass failed"),
            },
        }

        tokio::select! {
            () = &mut shutdown => break,
            () = tokio::time::sleep(Duration::from_millis(config.scanner.pass_interval_ms)) => {}
        }
    }

    watcher_handle.abort();
    info!(passes = pass, "Value bet scanner stopped");
    Ok(())
}
