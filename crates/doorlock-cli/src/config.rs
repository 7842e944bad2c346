//! `doorlock.toml` configuration.
//!
//! Everything lives under a `[doorlock]` section. Missing keys take their
//! defaults, and a missing file means a default configuration.
//!
//! ```toml
//! [doorlock.general]
//! log_level = "debug"
//!
//! [doorlock.lockout]
//! enabled = true
//! threshold = 5
//!
//! [doorlock.remote]
//! enabled = true
//! server_addr = "10.0.0.5:1883"
//! ```

use doorlock_controller::{ControllerConfig, LockoutPolicy};
use doorlock_core::constants::{
    CLEAR_ALL_PAUSE_MS, DEFAULT_IDLE_TIMEOUT_MS, DEFAULT_LOCKOUT_DURATION_SECS,
    DEFAULT_LOCKOUT_THRESHOLD, DEFAULT_OPEN_HOLD_MS, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_RECONNECT_INTERVAL_MS, DEFAULT_SCROLL_INTERVAL_MS, DEFAULT_SUPERVISOR_PORT,
    REMOTE_CHANGE_PAUSE_MS, RESULT_PAUSE_MS, STORAGE_NAMESPACE, TIMEOUT_PAUSE_MS,
};
use doorlock_network::SupervisorLinkConfig;
use doorlock_storage::DatabaseConfig;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use thiserror::Error;

/// Section key in `doorlock.toml`.
pub const SECTION_KEY: &str = "doorlock";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    ReadError(PathBuf, String),

    #[error("Failed to parse config file {0}: {1}")]
    ParseError(PathBuf, String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Current directory first, then the system-wide file.
fn config_search_paths() -> Vec<PathBuf> {
    vec![
        PathBuf::from("doorlock.toml"),
        PathBuf::from("/etc/doorlock/doorlock.toml"),
    ]
}

/// Deserialize section `key` of a TOML file.
///
/// `Ok(None)` when the file has no such section.
fn load_section_from_file<T: DeserializeOwned>(
    path: &Path,
    key: &str,
) -> Result<Option<T>, ConfigError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ReadError(path.to_path_buf(), e.to_string()))?;

    let mut table: toml::Table = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(path.to_path_buf(), e.to_string()))?;

    let Some(section) = table.remove(key) else {
        return Ok(None);
    };

    section
        .try_into()
        .map(Some)
        .map_err(|e: toml::de::Error| ConfigError::ParseError(path.to_path_buf(), e.to_string()))
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DoorlockConfig {
    pub general: GeneralConfig,
    pub timing: TimingConfig,
    pub lockout: LockoutConfig,
    pub storage: StorageConfig,
    pub remote: RemoteConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// `tracing` filter directive; `RUST_LOG` takes precedence.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub poll_interval_ms: u64,
    pub scroll_interval_ms: u64,
    pub idle_timeout_ms: u64,
    pub open_hold_ms: u64,
    pub result_pause_ms: u64,
    pub remote_change_pause_ms: u64,
    pub timeout_pause_ms: u64,
    pub clear_all_pause_ms: u64,
    /// How long the simulated sensor waits for a finger.
    pub capture_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            scroll_interval_ms: DEFAULT_SCROLL_INTERVAL_MS,
            idle_timeout_ms: DEFAULT_IDLE_TIMEOUT_MS,
            open_hold_ms: DEFAULT_OPEN_HOLD_MS,
            result_pause_ms: RESULT_PAUSE_MS,
            remote_change_pause_ms: REMOTE_CHANGE_PAUSE_MS,
            timeout_pause_ms: TIMEOUT_PAUSE_MS,
            clear_all_pause_ms: CLEAR_ALL_PAUSE_MS,
            capture_timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockoutConfig {
    pub enabled: bool,
    pub threshold: u32,
    pub duration_secs: u64,
}

impl Default for LockoutConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            threshold: DEFAULT_LOCKOUT_THRESHOLD,
            duration_secs: DEFAULT_LOCKOUT_DURATION_SECS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: String,
    /// Namespace of the password record.
    pub namespace: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "doorlock.db".to_string(),
            namespace: STORAGE_NAMESPACE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub enabled: bool,
    pub server_addr: String,
    pub io_timeout_ms: u64,
    pub retry_interval_ms: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            server_addr: format!("127.0.0.1:{DEFAULT_SUPERVISOR_PORT}"),
            io_timeout_ms: 3_000,
            retry_interval_ms: DEFAULT_RECONNECT_INTERVAL_MS,
        }
    }
}

impl DoorlockConfig {
    /// Load from `path`, or from the first default location that has a
    /// `[doorlock]` section.
    ///
    /// Returns the configuration and the file it came from; `None` means
    /// defaults were used. An explicit `path` must exist and contain the
    /// section.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a file cannot be read or parsed, or if the
    /// result fails [`DoorlockConfig::validate`].
    pub fn load(path: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        let (config, source) = match path {
            Some(path) => (Self::load_from_file(path)?, Some(path.to_path_buf())),
            None => Self::load_from_default_paths()?,
        };
        config.validate()?;
        Ok((config, source))
    }

    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, is not valid TOML,
    /// or has no `[doorlock]` section.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        load_section_from_file::<Self>(path, SECTION_KEY)?.ok_or_else(|| {
            ConfigError::ParseError(
                path.to_path_buf(),
                format!("missing [{SECTION_KEY}] section"),
            )
        })
    }

    fn load_from_default_paths() -> Result<(Self, Option<PathBuf>), ConfigError> {
        for path in config_search_paths() {
            if path.exists()
                && let Some(config) = load_section_from_file::<Self>(&path, SECTION_KEY)?
            {
                return Ok((config, Some(path)));
            }
        }
        Ok((Self::default(), None))
    }

    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let timing = &self.timing;
        for (key, value) in [
            ("timing.poll_interval_ms", timing.poll_interval_ms),
            ("timing.scroll_interval_ms", timing.scroll_interval_ms),
            ("timing.idle_timeout_ms", timing.idle_timeout_ms),
            ("timing.capture_timeout_ms", timing.capture_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid(format!("{key} must be greater than 0")));
            }
        }

        if self.lockout.enabled {
            if self.lockout.threshold == 0 {
                return Err(ConfigError::Invalid(
                    "lockout.threshold must be greater than 0".into(),
                ));
            }
            if self.lockout.duration_secs == 0 {
                return Err(ConfigError::Invalid(
                    "lockout.duration_secs must be greater than 0".into(),
                ));
            }
        }

        if self.storage.database_path.trim().is_empty() {
            return Err(ConfigError::Invalid("storage.database_path is empty".into()));
        }
        if self.storage.namespace.trim().is_empty() {
            return Err(ConfigError::Invalid("storage.namespace is empty".into()));
        }

        if self.remote.enabled {
            if self.remote.server_addr.trim().is_empty() {
                return Err(ConfigError::Invalid("remote.server_addr is empty".into()));
            }
            if self.remote.retry_interval_ms == 0 || self.remote.io_timeout_ms == 0 {
                return Err(ConfigError::Invalid(
                    "remote timeouts must be greater than 0".into(),
                ));
            }
        }

        Ok(())
    }

    pub fn controller_config(&self) -> ControllerConfig {
        let timing = &self.timing;
        ControllerConfig {
            poll_interval: Duration::from_millis(timing.poll_interval_ms),
            scroll_interval: Duration::from_millis(timing.scroll_interval_ms),
            idle_timeout: Duration::from_millis(timing.idle_timeout_ms),
            result_pause: Duration::from_millis(timing.result_pause_ms),
            remote_change_pause: Duration::from_millis(timing.remote_change_pause_ms),
            timeout_pause: Duration::from_millis(timing.timeout_pause_ms),
            clear_all_pause: Duration::from_millis(timing.clear_all_pause_ms),
            lockout: LockoutPolicy {
                enabled: self.lockout.enabled,
                threshold: self.lockout.threshold,
                duration: Duration::from_secs(self.lockout.duration_secs),
            },
        }
    }

    pub fn database_config(&self) -> DatabaseConfig {
        DatabaseConfig::new(&self.storage.database_path)
    }

    pub fn link_config(&self) -> SupervisorLinkConfig {
        SupervisorLinkConfig::new(&self.remote.server_addr)
            .io_timeout(Duration::from_millis(self.remote.io_timeout_ms))
            .retry_interval(Duration::from_millis(self.remote.retry_interval_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults() {
        let config = DoorlockConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.lockout.enabled);
        assert!(!config.remote.enabled);
        assert_eq!(config.storage.namespace, "locksys");

        let controller = config.controller_config();
        assert_eq!(controller, ControllerConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let file = write_config(
            r#"
            [doorlock.lockout]
            enabled = true
            threshold = 5

            [doorlock.remote]
            enabled = true
            server_addr = "10.0.0.5:1883"
            "#,
        );

        let (config, source) = DoorlockConfig::load(Some(file.path())).unwrap();
        assert_eq!(source.as_deref(), Some(file.path()));
        assert!(config.lockout.enabled);
        assert_eq!(config.lockout.threshold, 5);
        assert_eq!(config.lockout.duration_secs, 30);
        assert_eq!(config.timing.idle_timeout_ms, 10_000);

        let link = config.link_config();
        assert_eq!(link.server_addr, "10.0.0.5:1883");
        assert_eq!(link.retry_interval, Duration::from_secs(5));
    }

    #[test]
    fn test_missing_section() {
        let file = write_config("[other]\nkey = 1\n");
        let err = DoorlockConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(..)));
        assert!(err.to_string().contains("missing [doorlock] section"));
    }

    #[test]
    fn test_missing_file() {
        let err = DoorlockConfig::load(Some(Path::new("/nonexistent/doorlock.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::ReadError(..)));
    }

    #[test]
    fn test_malformed_toml() {
        let file = write_config("[doorlock\n");
        let err = DoorlockConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(..)));
    }

    #[test]
    fn test_wrong_type() {
        let file = write_config("[doorlock.timing]\npoll_interval_ms = \"fast\"\n");
        assert!(DoorlockConfig::load_from_file(file.path()).is_err());
    }

    #[rstest]
    #[case("[doorlock.timing]\npoll_interval_ms = 0\n", "poll_interval_ms")]
    #[case("[doorlock.timing]\nidle_timeout_ms = 0\n", "idle_timeout_ms")]
    #[case("[doorlock.lockout]\nenabled = true\nthreshold = 0\n", "threshold")]
    #[case("[doorlock.lockout]\nenabled = true\nduration_secs = 0\n", "duration_secs")]
    #[case("[doorlock.storage]\nnamespace = \"\"\n", "namespace")]
    #[case("[doorlock.remote]\nenabled = true\nserver_addr = \" \"\n", "server_addr")]
    fn test_validation_errors(#[case] content: &str, #[case] key: &str) {
        let file = write_config(content);
        let err = DoorlockConfig::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
        assert!(err.to_string().contains(key), "{err} should name {key}");
    }

    #[test]
    fn test_disabled_lockout_ignores_zero_threshold() {
        let mut config = DoorlockConfig::default();
        config.lockout.threshold = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_controller_config_mapping() {
        let mut config = DoorlockConfig::default();
        config.timing.scroll_interval_ms = 1_500;
        config.lockout = LockoutConfig {
            enabled: true,
            threshold: 4,
            duration_secs: 60,
        };

        let controller = config.controller_config();
        assert_eq!(controller.scroll_interval, Duration::from_millis(1_500));
        assert_eq!(
            controller.lockout,
            LockoutPolicy::enabled(4, Duration::from_secs(60))
        );
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = DoorlockConfig::default();
        let text = toml::to_string(&config).unwrap();
        let parsed: DoorlockConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }
}
