use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_DIR: &str = "config";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration from an explicit directory.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_from(dir: impl AsRef<Path>, profile: Option<&str>) -> Result<AppConfig> {
        let config: AppConfig = Self::figment(dir.as_ref(), profile).extract()?;
        Ok(config)
    }

    fn base_file(dir: impl AsRef<Path>) -> PathBuf {
        dir.as_ref().join("Config.toml")
    }

    fn figment(dir: &Path, profile: Option<&str>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(Self::base_file(dir)));

        if let Some(profile) = profile {
            figment = figment.merge(Toml::file(dir.join(format!("Config.{profile}.toml"))));
        }

        figment
            .merge(Env::prefixed("APP_").split("__"))
            .join(Json::file(dir.join("Config.json")))
    }
}
