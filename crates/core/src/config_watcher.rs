use crate::config::AppConfig;
use crate::config_loader::ConfigLoader;
use anyhow::Result;
use notify::{Event, RecursiveMode, Watcher};
use std::path::PathBuf;
use tokio::sync::{mpsc, watch};

/// Reloads configuration when the base file changes on disk.
///
/// Consumers hold the receiver and read the latest value when they need it;
/// the scan loop does so once per pass.
pub struct ConfigWatcher {
    tx: watch::Sender<AppConfig>,
    dir: PathBuf,
    profile: Option<String>,
}

impl ConfigWatcher {
    /// Creates a new configuration watcher with an initial configuration.
    ///
    /// Returns a tuple of the watcher and a receiver for configuration updates.
    #[must_use]
    pub fn new(
        initial_config: AppConfig,
        dir: impl Into<PathBuf>,
        profile: Option<String>,
    ) -> (Self, watch::Receiver<AppConfig>) {
        let (tx, rx) = watch::channel(initial_config);
        (
            Self {
                tx,
                dir: dir.into(),
                profile,
            },
            rx,
        )
    }

    /// Watches the configuration directory for changes and broadcasts updates.
    ///
    /// Runs until the returned future is dropped or the task driving it is
    /// aborted, which also releases the underlying file watcher.
    ///
    /// # Errors
    ///
    /// Returns an error if file watching cannot be initiated.
    pub async fn watch(&self) -> Result<()> {
        let (notify_tx, mut notify_rx) = mpsc::unbounded_channel();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            if let Ok(event) = res {
                let _ = notify_tx.send(event);
            }
        })?;
        watcher.watch(&self.dir, RecursiveMode::NonRecursive)?;

        while let Some(event) = notify_rx.recv().await {
            if !event.kind.is_modify() {
                continue;
            }

            tracing::info!("Config file changed, reloading...");
            match ConfigLoader::load_from(&self.dir, self.profile.as_deref()) {
                Ok(new_config) => {
                    let _ = self.tx.send(new_config);
                    tracing::info!("Config reloaded successfully");
                }
                Err(e) => {
                    tracing::error!("Failed to reload config, keeping previous: {}", e);
                }
            }
        }

        Ok(())
    }
}
