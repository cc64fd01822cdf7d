use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::clipboard::{CommandLimits, RetrievalSettings};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// General configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Directory clipboard images are written to (default: <temp dir>/clipgrab)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Maximum image size in bytes read from a clipboard tool
    #[serde(default = "default_max_image_size")]
    pub max_image_size_bytes: u64,

    /// Timeout for the "is this tool installed" check
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,

    /// Timeout for listing clipboard types and fetching image bytes
    #[serde(default = "default_command_timeout_ms")]
    pub command_timeout_ms: u64,

    /// Optional deadline for walking the whole backend chain
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_timeout_ms: Option<u64>,

    /// Saved images older than this are removed by `clipgrab cleanup`
    #[serde(default = "default_stale_after_secs")]
    pub stale_after_secs: u64,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            output_dir: None,
            max_image_size_bytes: default_max_image_size(),
            probe_timeout_ms: default_probe_timeout_ms(),
            command_timeout_ms: default_command_timeout_ms(),
            chain_timeout_ms: None,
            stale_after_secs: default_stale_after_secs(),
        }
    }
}

impl GeneralConfig {
    /// Settings consumed by the clipboard driver
    pub fn retrieval_settings(&self) -> RetrievalSettings {
        let max_image_bytes = usize::try_from(self.max_image_size_bytes).unwrap_or(usize::MAX);
        RetrievalSettings {
            output_dir: self.output_dir.clone(),
            limits: CommandLimits::new(
                Duration::from_millis(self.probe_timeout_ms),
                Duration::from_millis(self.command_timeout_ms),
                max_image_bytes,
            ),
            chain_timeout: self.chain_timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn stale_after(&self) -> Duration {
        Duration::from_secs(self.stale_after_secs)
    }
}

/// Log output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write logs to this file (rotated daily) instead of stderr
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,

    /// error, warn, info, debug or trace
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            file: None,
            level: default_log_level(),
        }
    }
}

// Default value functions for serde
fn default_max_image_size() -> u64 {
    52_428_800 // 50MB
}

fn default_probe_timeout_ms() -> u64 {
    2_000
}

fn default_command_timeout_ms() -> u64 {
    10_000
}

fn default_stale_after_secs() -> u64 {
    3_600
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Trait for configuration storage
pub trait ConfigStorage: Send + Sync {
    /// Load configuration from file
    fn load(&self) -> Result<Config>;

    /// Get the config file path
    fn path(&self) -> &PathBuf;

    /// Create default configuration file if it doesn't exist
    fn create_default(&self) -> Result<()>;
}

/// TOML-based implementation of ConfigStorage
pub struct TomlConfigStorage {
    path: PathBuf,
}

impl TomlConfigStorage {
    /// Create a new TomlConfigStorage with the given path
    pub fn new(path: PathBuf) -> Self {
        TomlConfigStorage { path }
    }

    /// Read the config file without side effects
    /// Returns Ok(None) when no file exists yet
    pub fn load_existing(&self) -> Result<Option<Config>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read config from {:?}", self.path))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {:?}", self.path))?;

        log::debug!(
            "Config: max_image_size_bytes={}, command_timeout_ms={}, chain_timeout_ms={:?}",
            config.general.max_image_size_bytes,
            config.general.command_timeout_ms,
            config.general.chain_timeout_ms
        );

        Ok(Some(config))
    }
}

impl ConfigStorage for TomlConfigStorage {
    fn load(&self) -> Result<Config> {
        // If file doesn't exist, create default and return it
        match self.load_existing()? {
            Some(config) => Ok(config),
            None => {
                log::info!(
                    "Config file not found at {:?}, creating default configuration",
                    self.path
                );
                self.create_default()?;
                Ok(Config::default())
            }
        }
    }

    fn path(&self) -> &PathBuf {
        &self.path
    }

    fn create_default(&self) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {:?}", parent))?;
        }

        // Use the example config compiled into the binary
        let example_config = include_str!("../../clipgrab.toml.example");

        fs::write(&self.path, example_config)
            .with_context(|| format!("Failed to create default config at {:?}", self.path))?;

        log::info!("Created default configuration at {:?}", self.path);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_defaults() {
        let config = GeneralConfig::default();
        assert_eq!(config.max_image_size_bytes, 52_428_800);
        assert_eq!(config.probe_timeout_ms, 2_000);
        assert_eq!(config.command_timeout_ms, 10_000);
        assert_eq!(config.chain_timeout_ms, None);
        assert_eq!(config.stale_after(), Duration::from_secs(3600));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml_str = r#"
        [general]
        output_dir = "/tmp/shots"
        chain_timeout_ms = 1500

        [logging]
        level = "debug"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.output_dir, Some(PathBuf::from("/tmp/shots")));
        assert_eq!(config.general.command_timeout_ms, 10_000);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.file.is_none());

        let settings = config.general.retrieval_settings();
        assert_eq!(settings.chain_timeout, Some(Duration::from_millis(1500)));
        assert_eq!(settings.limits.fetch.max_output_bytes, 52_428_800);
        assert_eq!(settings.limits.fetch.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_bundled_example_parses() {
        let config: Config = toml::from_str(include_str!("../../clipgrab.toml.example")).unwrap();
        assert_eq!(config.general.max_image_size_bytes, 52_428_800);
    }

    #[test]
    fn test_load_existing_has_no_side_effects() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("clipgrab/clipgrab.toml");
        let storage = TomlConfigStorage::new(path.clone());

        assert!(storage.load_existing().unwrap().is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_load_existing_reports_bad_toml() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("clipgrab.toml");
        fs::write(&path, "[general\nmax_image_size_bytes = ").unwrap();

        let err = TomlConfigStorage::new(path).load_existing().unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_load_creates_default_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("clipgrab/clipgrab.toml");
        let storage = TomlConfigStorage::new(path.clone());

        let config = storage.load().unwrap();
        assert!(path.exists());
        assert_eq!(config.general.probe_timeout_ms, 2_000);

        // Second load reads the file that was just written
        let reloaded = storage.load().unwrap();
        assert_eq!(reloaded.general.command_timeout_ms, 10_000);
    }
}
