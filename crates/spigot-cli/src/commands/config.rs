//! Config command implementation.
//!
//! Manages CLI configuration.

use std::io::{self, Write};

use anyhow::Result;

use crate::config::{parse_base, parse_digits, parse_flag, Config};

const VALID_KEYS: &str = "base, digits, early-terminate";

fn digits_display(digits: Option<u64>) -> String {
    digits
        .map(|d| d.to_string())
        .unwrap_or_else(|| "(unlimited)".to_string())
}

/// Show current configuration.
pub fn show(config: &Config) -> Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "Spigot Configuration")?;
    writeln!(out, "{:-<40}", "")?;

    writeln!(out, "Output Base:         {}", config.base)?;
    writeln!(out, "Digit Limit:         {}", digits_display(config.digits))?;
    writeln!(out, "Early Terminate:     {}", config.early_terminate)?;

    if let Some(config_path) = Config::config_file_path() {
        writeln!(out, "\nConfig file: {}", config_path.display())?;
    }

    Ok(())
}

/// Set a configuration value.
pub fn set(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let mut out = io::stdout().lock();
    match key {
        "base" | "output-base" => {
            config.base = parse_base(value)?;
            writeln!(out, "Set base to: {}", config.base)?;
        }
        "digits" | "limit" => {
            config.digits = parse_digits(value)?;
            writeln!(out, "Set digits to: {}", digits_display(config.digits))?;
        }
        "early-terminate" | "early_terminate" => {
            config.early_terminate = parse_flag(value)?;
            writeln!(out, "Set early-terminate to: {}", config.early_terminate)?;
        }
        _ => {
            anyhow::bail!("Unknown config key: {}. Valid keys: {}", key, VALID_KEYS);
        }
    }

    config.save()?;
    Ok(())
}

/// Get a configuration value.
pub fn get(config: &Config, key: &str) -> Result<()> {
    let value = match key {
        "base" | "output-base" => config.base.to_string(),
        "digits" | "limit" => digits_display(config.digits),
        "early-terminate" | "early_terminate" => config.early_terminate.to_string(),
        _ => {
            anyhow::bail!("Unknown config key: {}. Valid keys: {}", key, VALID_KEYS);
        }
    };

    writeln!(io::stdout().lock(), "{}", value)?;
    Ok(())
}

/// Reset configuration to defaults.
pub fn reset() -> Result<()> {
    let mut out = io::stdout().lock();
    let config = Config::default();
    config.save()?;
    writeln!(out, "Configuration reset to defaults")?;
    Ok(())
}

/// Print the config file location.
pub fn path() -> Result<()> {
    let mut out = io::stdout().lock();
    match Config::config_file_path() {
        Some(path) => writeln!(out, "{}", path.display())?,
        None => writeln!(out, "(no config file path available)")?,
    }
    Ok(())
}
