//! Shared configuration for the value bet scanner.
//!
//! Configuration is layered with figment: `config/Config.toml`, an optional
//! profile file (`line`, `live`), `APP_` environment variables, then
//! `config/Config.json`.

pub mod config;
pub mod config_loader;
pub mod config_watcher;

pub use config::{
    AppConfig, DatabaseConfig, FreshnessConfig, ScanMode, ScannerConfig, SourcePairConfig,
    ThresholdConfig,
};
pub use config_loader::{ConfigLoader, DEFAULT_CONFIG_DIR};
pub use config_watcher::ConfigWatcher;
