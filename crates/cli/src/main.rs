use clap::{Parser, Subcommand};
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};

mod commands;

use commands::{InitDbArgs, RunArgs, ScanOnceArgs};

#[derive(Parser)]
#[command(name = "valuebet")]
#[command(about = "Value bet scanner across bookmaker odds feeds", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan continuously until interrupted
    Run(RunArgs),
    /// Run a single scan pass and print its summary
    ScanOnce(ScanOnceArgs),
    /// Create database tables
    InitDb(InitDbArgs),
}

/// Log files kept on disk, the active one included.
const LOG_FILES_KEPT: usize = 2;

fn env_filter() -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"))
}

/// Daily rotating appender for `path`, keeping the current file and one
/// previous day.
fn log_file_appender(path: &Path) -> anyhow::Result<RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let prefix = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| anyhow::anyhow!("log file path has no file name: {}", path.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(prefix)
        .max_log_files(LOG_FILES_KEPT)
        .build(dir)?;
    Ok(appender)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // dropping the guard flushes buffered lines, so it lives until main returns
    let _log_guard = match &cli.command {
        Commands::Run(RunArgs {
            log_file: Some(path),
            ..
        }) => {
            let (writer, guard) = tracing_appender::non_blocking(log_file_appender(Path::new(path))?);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_ansi(false)
                .with_writer(writer)
                .init();
            Some(guard)
        }
        _ => {
            tracing_subscriber::fmt().with_env_filter(env_filter()).init();
            None
        }
    };

    match cli.command {
        Commands::Run(args) => commands::run_scanner(args).await?,
        Commands::ScanOnce(args) => commands::run_scan_once(args).await?,
        Commands::InitDb(args) => commands::run_init_db(args).await?,
    }

    Ok(())
}
