//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/fuqdocs/config.toml)
//! 3. Environment variables (FUQDOCS_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable prefix
const ENV_PREFIX: &str = "FUQDOCS";

/// Default autosave interval used by long-running front ends
pub const DEFAULT_AUTOSAVE_MS: u64 = 5000;

/// Default interval between polls for changes made by other instances
pub const DEFAULT_POLL_MS: u64 = 500;

/// Default number of change log entries kept in the storage file
pub const DEFAULT_CHANGE_RETENTION: u64 = 1000;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory for data storage
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Log file path; logs go to stderr when unset
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Autosave interval in milliseconds
    #[serde(default = "default_autosave_ms")]
    pub autosave_interval_ms: u64,

    /// How often to poll for changes from other instances, in milliseconds
    #[serde(default = "default_poll_ms")]
    pub poll_interval_ms: u64,

    /// Change log entries kept when the storage file is opened
    #[serde(default = "default_change_retention")]
    pub change_retention: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_file: None,
            log_level: default_log_level(),
            autosave_interval_ms: DEFAULT_AUTOSAVE_MS,
            poll_interval_ms: DEFAULT_POLL_MS,
            change_retention: DEFAULT_CHANGE_RETENTION,
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration, preferring a path given on the command line
    pub fn load_with_cli_override(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Self::load(),
        }
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.ensure_data_dir()?;
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        // FUQDOCS_DATA_DIR
        if let Ok(val) = std::env::var(format!("{}_DATA_DIR", ENV_PREFIX)) {
            self.data_dir = PathBuf::from(val);
        }

        // FUQDOCS_LOG_LEVEL
        if let Ok(val) = std::env::var(format!("{}_LOG_LEVEL", ENV_PREFIX)) {
            if !val.is_empty() {
                self.log_level = val;
            }
        }

        // FUQDOCS_AUTOSAVE_MS
        if let Ok(val) = std::env::var(format!("{}_AUTOSAVE_MS", ENV_PREFIX)) {
            match val.parse() {
                Ok(ms) => self.autosave_interval_ms = ms,
                Err(_) => tracing::warn!("Ignoring invalid {}_AUTOSAVE_MS: {}", ENV_PREFIX, val),
            }
        }
    }

    /// Ensure data directory exists
    fn ensure_data_dir(&self) -> Result<()> {
        if !self.data_dir.exists() {
            std::fs::create_dir_all(&self.data_dir)
                .with_context(|| format!("Failed to create data directory: {:?}", self.data_dir))?;
        }
        Ok(())
    }

    /// Save configuration to the default config file
    pub fn save(&self) -> Result<()> {
        self.save_to_path(&Self::config_file_path())
    }

    /// Save configuration to a specific path
    pub fn save_to_path(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with FUQDOCS_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("fuqdocs")
            .join("config.toml")
    }

    /// Get the path to the storage database
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join("storage.sqlite3")
    }
}

/// Get the default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("fuqdocs")
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_autosave_ms() -> u64 {
    DEFAULT_AUTOSAVE_MS
}

fn default_poll_ms() -> u64 {
    DEFAULT_POLL_MS
}

fn default_change_retention() -> u64 {
    DEFAULT_CHANGE_RETENTION
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Mutex to serialize tests that touch environment variables
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// Guard that locks env access and saves/restores env vars
    struct EnvGuard<'a> {
        _lock: std::sync::MutexGuard<'a, ()>,
        saved: Vec<(String, Option<String>)>,
    }

    impl<'a> EnvGuard<'a> {
        fn new(vars: &[&str]) -> Self {
            let lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
            let saved = vars
                .iter()
                .map(|&name| (name.to_string(), env::var(name).ok()))
                .collect();
            for name in vars {
                env::remove_var(name);
            }
            Self { _lock: lock, saved }
        }
    }

    impl Drop for EnvGuard<'_> {
        fn drop(&mut self) {
            for (name, value) in &self.saved {
                match value {
                    Some(v) => env::set_var(name, v),
                    None => env::remove_var(name),
                }
            }
        }
    }

    const ENV_VARS: &[&str] = &[
        "FUQDOCS_DATA_DIR",
        "FUQDOCS_LOG_LEVEL",
        "FUQDOCS_AUTOSAVE_MS",
    ];

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.autosave_interval_ms, 5000);
        assert_eq!(config.poll_interval_ms, 500);
        assert_eq!(config.log_level, "warn");
        assert!(config.log_file.is_none());
        assert!(config.data_dir.ends_with("fuqdocs"));
    }

    #[test]
    fn test_storage_path() {
        let config = Config::default();
        assert!(config.storage_path().ends_with("storage.sqlite3"));
    }

    #[test]
    fn test_env_override_data_dir() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("FUQDOCS_DATA_DIR", "/tmp/fuqdocs-test");
        config.apply_env_overrides();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/fuqdocs-test"));
    }

    #[test]
    fn test_env_override_autosave() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("FUQDOCS_AUTOSAVE_MS", "250");
        config.apply_env_overrides();
        assert_eq!(config.autosave_interval_ms, 250);

        // Invalid values leave the setting alone
        env::set_var("FUQDOCS_AUTOSAVE_MS", "soon");
        config.apply_env_overrides();
        assert_eq!(config.autosave_interval_ms, 250);
    }

    #[test]
    fn test_env_override_log_level() {
        let _guard = EnvGuard::new(ENV_VARS);

        let mut config = Config::default();
        env::set_var("FUQDOCS_LOG_LEVEL", "debug");
        config.apply_env_overrides();
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_load_from_str_partial() {
        let _guard = EnvGuard::new(ENV_VARS);

        let config = Config::load_from_str(
            r#"
            data_dir = "/custom/data"
            poll_interval_ms = 100
            "#,
        )
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/custom/data"));
        assert_eq!(config.poll_interval_ms, 100);
        assert_eq!(config.autosave_interval_ms, DEFAULT_AUTOSAVE_MS);
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("conf").join("config.toml");

        let config = Config {
            data_dir: temp_dir.path().join("data"),
            log_file: Some(temp_dir.path().join("fuqdocs.log")),
            log_level: "info".to_string(),
            autosave_interval_ms: 1000,
            poll_interval_ms: 50,
            change_retention: 10,
        };
        config.save_to_path(&path).unwrap();

        let loaded = Config::load_from_path(&path).unwrap();
        assert_eq!(loaded, config);
        assert!(config.data_dir.exists());
    }

    #[test]
    fn test_load_from_path_missing_file() {
        let _guard = EnvGuard::new(ENV_VARS);
        let temp_dir = TempDir::new().unwrap();
        env::set_var("FUQDOCS_DATA_DIR", temp_dir.path());

        let config = Config::load_from_path(Path::new("/nonexistent/config.toml")).unwrap();
        assert_eq!(config.data_dir, temp_dir.path());
        assert_eq!(config.autosave_interval_ms, DEFAULT_AUTOSAVE_MS);
    }
}
