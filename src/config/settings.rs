//! Engine settings loading from TOML and the environment.
//!
//! The reconciliation engine takes its knobs as an explicit
//! [`ReconcileConfig`] value rather than reading ambient globals; this module
//! turns an optional `tallybook.toml` file and `TALLYBOOK_*` environment
//! variables into one.

use crate::core::{reconcile::ReconcileConfig, status::OverpaymentPolicy};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Root structure of the `tallybook.toml` settings file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Reconciliation engine configuration
    pub reconcile: ReconcileConfig,
}

/// Loads settings from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read settings file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse settings file: {e}"),
    })
}

/// Loads settings from the default location (./tallybook.toml), falling back
/// to defaults when the file does not exist.
pub fn load_default_settings() -> Result<Settings> {
    let path = Path::new("tallybook.toml");
    if path.exists() {
        load_settings(path)
    } else {
        Ok(Settings::default())
    }
}

/// Applies `TALLYBOOK_*` environment overrides on top of a config.
pub fn apply_env_overrides(config: &mut ReconcileConfig) -> Result<()> {
    if let Ok(value) = std::env::var("TALLYBOOK_OVERPAYMENT_POLICY") {
        config.overpayment_policy = value.parse::<OverpaymentPolicy>()?;
    }

    if let Ok(value) = std::env::var("TALLYBOOK_MAX_RETRY_ATTEMPTS") {
        config.retry.max_attempts = value.parse().map_err(|e| Error::Config {
            message: format!("Invalid TALLYBOOK_MAX_RETRY_ATTEMPTS: {e}"),
        })?;
    }

    if let Ok(value) = std::env::var("TALLYBOOK_RETRY_BASE_DELAY_MS") {
        config.retry.base_delay_ms = value.parse().map_err(|e| Error::Config {
            message: format!("Invalid TALLYBOOK_RETRY_BASE_DELAY_MS: {e}"),
        })?;
    }

    Ok(())
}

/// Loads the default settings file and environment overrides into a
/// ready-to-use engine config.
pub fn load_from_env() -> Result<ReconcileConfig> {
    let mut config = load_default_settings()?.reconcile;
    apply_env_overrides(&mut config)?;
    Ok(config)
}
