use super::Config;
use crate::errors::ConfigError;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info};

/// Environment variable overriding the configuration file location
pub const CONFIG_PATH_ENV: &str = "WATCHER_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config/main.toml";

pub struct ConfigManager {
    config_path: PathBuf,
    current_config: Arc<Config>,
}

impl ConfigManager {
    /// Load from `WATCHER_CONFIG` or `config/main.toml`
    pub async fn from_env() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV)
            .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::new(path).await
    }

    pub async fn new(config_path: impl Into<PathBuf>) -> Result<Self> {
        let config_path = config_path.into();
        let config = Self::load_configuration(&config_path).await?;
        Ok(Self {
            config_path,
            current_config: Arc::new(config),
        })
    }

    pub fn get_current_config(&self) -> Arc<Config> {
        self.current_config.clone()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    async fn load_configuration(config_path: &Path) -> Result<Config, ConfigError> {
        debug!("Loading watcher config: {}", config_path.display());

        let content = fs::read_to_string(config_path)
            .await
            .map_err(|e| ConfigError::LoadFailed {
                path: config_path.display().to_string(),
                reason: e.to_string(),
            })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            reason: format!("{}: {}", config_path.display(), e),
        })?;

        config.validate()?;

        info!(
            "Loaded config: {} workers, tick {}s, max check age {}s, reference {}",
            config.worker_threads,
            config.tick_interval_seconds,
            config.max_check_age_seconds,
            config.reference.host
        );

        Ok(config)
    }
}
