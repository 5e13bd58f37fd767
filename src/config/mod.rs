//! Configuration management for rocq-setup

pub mod schema;

pub use schema::Config;

use crate::error::{SetupError, SetupResult};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rocq-setup")
            .join("config.toml")
    }

    /// Get the state directory path
    ///
    /// On GitHub runners this is under `RUNNER_TEMP`, which lives exactly as
    /// long as the job and is shared by the main and post stages.
    pub fn state_dir() -> PathBuf {
        std::env::var_os("RUNNER_TEMP")
            .map(PathBuf::from)
            .or_else(dirs::state_dir)
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rocq-setup")
    }

    /// Get the default run state file path
    pub fn state_file() -> PathBuf {
        Self::state_dir().join("state.json")
    }

    /// Load configuration, using defaults if the file does not exist
    pub async fn load(&self) -> SetupResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> SetupResult<Config> {
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| SetupError::io(format!("reading config from {}", path.display()), e))?;

        let config: Config = toml::from_str(&content).map_err(|e| SetupError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::validate(&config).map_err(|reason| SetupError::ConfigInvalid {
            path: path.to_path_buf(),
            reason,
        })?;

        Ok(config)
    }

    fn validate(config: &Config) -> Result<(), String> {
        semver::Version::parse(&config.toolchain.opam_version).map_err(|e| {
            format!(
                "toolchain.opam_version {:?} is not a release version: {}",
                config.toolchain.opam_version, e
            )
        })?;

        if config.toolchain.switch.trim().is_empty() {
            return Err("toolchain.switch must not be empty".to_string());
        }

        match config.general.log_format.as_str() {
            "text" | "json" => Ok(()),
            other => Err(format!(
                "general.log_format must be \"text\" or \"json\", got {:?}",
                other
            )),
        }
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> SetupResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            SetupError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> SetupResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| SetupError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn load_default_when_missing() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nonexistent.toml");
        let manager = ConfigManager::with_path(path);

        let config = manager.load().await.unwrap();
        assert_eq!(config.toolchain.switch, "default");
    }

    #[tokio::test]
    async fn save_and_load_roundtrip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("config.toml");
        let manager = ConfigManager::with_path(path);

        let mut config = Config::default();
        config.toolchain.switch = "rocq".to_string();

        manager.save(&config).await.unwrap();
        let loaded = manager.load().await.unwrap();

        assert_eq!(loaded.toolchain.switch, "rocq");
    }

    #[tokio::test]
    async fn rejects_bad_opam_version() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[toolchain]\nopam_version = \"two\"\n").unwrap();

        let err = ConfigManager::with_path(path).load().await.unwrap_err();
        assert!(matches!(err, SetupError::ConfigInvalid { .. }));
        assert!(err.to_string().contains("opam_version"));
    }

    #[tokio::test]
    async fn rejects_unknown_log_format() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[general]\nlog_format = \"xml\"\n").unwrap();

        let err = ConfigManager::with_path(path).load().await.unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }
}
