//! Between configuration system
//!
//! This crate provides centralized configuration for the between transition
//! controller, loading defaults from `between.toml` with environment variable
//! overrides on top.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILE: &str = "between.toml";

/// Errors raised while loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct BetweenConfig {
    /// Controller-wide transition defaults
    pub transition: TransitionDefaults,
    /// Log output settings
    pub logging: LoggingConfig,
}

/// Transition defaults applied to every command unless overridden per call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransitionDefaults {
    /// CSS timing function text (`ease`, `linear`, `cubic-bezier(...)`, ...)
    pub easing: String,
    /// Transition duration in milliseconds
    pub duration_ms: u32,
    /// Force the captured destination opacity to 1 and hide the live
    /// destination while the clone is in flight
    pub override_incoming_opacity: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive handed to the logger (e.g. `between_flip=debug`)
    pub filter: Option<String>,
}

impl Default for TransitionDefaults {
    fn default() -> Self {
        Self {
            easing: "ease".to_string(),
            duration_ms: 300,
            override_incoming_opacity: true,
        }
    }
}

fn env_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

impl BetweenConfig {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    /// * `path` - Path to the between.toml configuration file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration from the default location (between.toml in the current directory)
    /// or return default configuration if file doesn't exist or is malformed
    pub fn load_or_default() -> Self {
        match Self::load_from_file(CONFIG_FILE) {
            Ok(config) => config,
            Err(ConfigError::Read(_)) => Self::default(),
            Err(err) => {
                tracing::warn!("ignoring {}: {}", CONFIG_FILE, err);
                Self::default()
            }
        }
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        if let Ok(easing) = std::env::var("BETWEEN_EASING") {
            self.transition.easing = easing;
        }
        if let Ok(val) = std::env::var("BETWEEN_DURATION_MS") {
            match val.parse::<u32>() {
                Ok(ms) => self.transition.duration_ms = ms,
                Err(_) => tracing::warn!("BETWEEN_DURATION_MS is not a number: {}", val),
            }
        }
        if let Ok(val) = std::env::var("BETWEEN_OVERRIDE_INCOMING_OPACITY") {
            self.transition.override_incoming_opacity = env_flag(&val);
        }
        if let Ok(filter) = std::env::var("BETWEEN_LOG") {
            self.logging.filter = Some(filter);
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from between.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = BetweenConfig::default();
        assert_eq!(config.transition.easing, "ease");
        assert_eq!(config.transition.duration_ms, 300);
        assert!(config.transition.override_incoming_opacity);
        assert!(config.logging.filter.is_none());
    }

    #[test]
    fn test_toml_serialization() {
        let config = BetweenConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: BetweenConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[transition]\nduration_ms = 120").unwrap();

        let config = BetweenConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.transition.duration_ms, 120);
        assert_eq!(config.transition.easing, "ease");
        assert!(config.transition.override_incoming_opacity);
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[transition\nduration_ms = ").unwrap();

        let err = BetweenConfig::load_from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = BetweenConfig::load_from_file("/nonexistent/between.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read(_)));
    }

    #[test]
    fn test_merge_with_env() {
        unsafe {
            std::env::set_var("BETWEEN_EASING", "linear");
            std::env::set_var("BETWEEN_DURATION_MS", "450");
            std::env::set_var("BETWEEN_OVERRIDE_INCOMING_OPACITY", "false");
            std::env::set_var("BETWEEN_LOG", "between_flip=trace");
        }

        let mut config = BetweenConfig::default();
        config.merge_with_env();

        assert_eq!(config.transition.easing, "linear");
        assert_eq!(config.transition.duration_ms, 450);
        assert!(!config.transition.override_incoming_opacity);
        assert_eq!(config.logging.filter.as_deref(), Some("between_flip=trace"));

        unsafe {
            std::env::remove_var("BETWEEN_EASING");
            std::env::remove_var("BETWEEN_DURATION_MS");
            std::env::remove_var("BETWEEN_OVERRIDE_INCOMING_OPACITY");
            std::env::remove_var("BETWEEN_LOG");
        }
    }
}
