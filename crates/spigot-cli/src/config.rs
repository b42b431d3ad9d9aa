//! CLI configuration management.
//!
//! Values come from, in increasing precedence: built-in defaults, the JSON
//! config file, environment variables (including a `.env` file), and
//! finally command-line flags, which `main` applies on top.

use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "SPIGOT_CONFIG";

/// Application-wide configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Default output base for positional digits.
    pub base: u32,

    /// Default digit limit; `None` streams until the expansion ends.
    pub digits: Option<u64>,

    /// Stop base output as soon as every remaining digit is known to be 0.
    pub early_terminate: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base: 10,
            digits: None,
            early_terminate: true,
        }
    }
}

impl Config {
    /// Load configuration from the config file and environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present (silently ignore if missing)
        let _ = dotenvy::dotenv();

        let mut config = match Self::config_file_path() {
            Some(path) if path.exists() => {
                let contents = std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read config from {}", path.display()))?;
                serde_json::from_str(&contents).with_context(|| {
                    format!("Failed to parse config file {}", path.display())
                })?
            }
            _ => Self::default(),
        };

        // Environment takes precedence over the file
        if let Ok(base) = std::env::var("SPIGOT_BASE") {
            match parse_base(&base) {
                Ok(b) => config.base = b,
                Err(e) => warn!(value = %base, error = %e, "ignoring SPIGOT_BASE"),
            }
        }
        if let Ok(digits) = std::env::var("SPIGOT_DIGITS") {
            match parse_digits(&digits) {
                Ok(d) => config.digits = d,
                Err(e) => warn!(value = %digits, error = %e, "ignoring SPIGOT_DIGITS"),
            }
        }
        if let Ok(flag) = std::env::var("SPIGOT_EARLY_TERMINATE") {
            match parse_flag(&flag) {
                Ok(f) => config.early_terminate = f,
                Err(e) => warn!(value = %flag, error = %e, "ignoring SPIGOT_EARLY_TERMINATE"),
            }
        }

        Ok(config)
    }

    /// Save current configuration to the config file.
    pub fn save(&self) -> Result<()> {
        if let Some(config_path) = Self::config_file_path() {
            if let Some(parent) = config_path.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create config directory: {}", parent.display())
                })?;
            }
            let contents = serde_json::to_string_pretty(self)?;
            std::fs::write(&config_path, contents)
                .with_context(|| format!("Failed to write config to {}", config_path.display()))?;
        }
        Ok(())
    }

    /// Get the path to the config file.
    pub fn config_file_path() -> Option<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        ProjectDirs::from("dev", "spigot", "spigot")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }
}

/// Parse an output base, 2 through 36.
pub fn parse_base(value: &str) -> Result<u32> {
    let base: u32 = value
        .trim()
        .parse()
        .with_context(|| format!("'{}' is not a number", value))?;
    if !(2..=36).contains(&base) {
        anyhow::bail!("base {} must be between 2 and 36", base);
    }
    Ok(base)
}

/// Parse a digit limit; `none` or `unlimited` clears it.
pub fn parse_digits(value: &str) -> Result<Option<u64>> {
    match value.trim() {
        "none" | "unlimited" | "" => Ok(None),
        v => Ok(Some(
            v.parse()
                .with_context(|| format!("'{}' is not a digit count", value))?,
        )),
    }
}

/// Parse a boolean setting.
pub fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => anyhow::bail!("'{}' is not a boolean (use true or false)", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base, 10);
        assert_eq!(config.digits, None);
        assert!(config.early_terminate);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = serde_json::from_str(r#"{ "digits": 50 }"#).unwrap();
        assert_eq!(config.digits, Some(50));
        assert_eq!(config.base, 10);
    }

    #[test]
    fn test_value_parsers() {
        assert_eq!(parse_base("16").unwrap(), 16);
        assert!(parse_base("1").is_err());
        assert!(parse_base("ten").is_err());
        assert_eq!(parse_digits("100").unwrap(), Some(100));
        assert_eq!(parse_digits("none").unwrap(), None);
        assert!(parse_digits("-3").is_err());
        assert!(parse_flag("Yes").unwrap());
        assert!(!parse_flag("off").unwrap());
        assert!(parse_flag("maybe").is_err());
    }
}
