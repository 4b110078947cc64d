//! Adapter configuration: recognized host options and TOML loading.
//!
//! Hosts either hand the adapter a typed [`AdapterConfig`], parse one
//! from a string option map ([`AdapterConfig::from_options`]), or load
//! one from a TOML file ([`load_config`]).

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::AdapterError;

/// Recognized option key holding the authentication credential.
pub const OPTION_TOKEN: &str = "token";

/// Recognized option key enabling verbose protocol logging.
pub const OPTION_DEBUG: &str = "debug";

/// Host-facing option map (string key/value pairs).
pub type Options = HashMap<String, String>;

/// Adapter configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AdapterConfig {
    /// Authentication credential for the remote service.
    pub token: String,

    /// Enable verbose protocol-level logging in the wire client.
    #[serde(default)]
    pub debug: bool,

    /// Seconds between wholesale identity-cache rebuilds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

/// Default identity-cache refresh interval: 60 seconds.
fn default_refresh_interval() -> u64 {
    60
}

impl AdapterConfig {
    /// Config with the given token and default settings.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            debug: false,
            refresh_interval_secs: default_refresh_interval(),
        }
    }

    /// Parse the recognized options (`token`, `debug`) from a host
    /// option map. Unrecognized keys are ignored with a debug log, so
    /// hosts may share one option bag across adapters.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::MissingToken`] when `token` is absent or
    /// empty, [`AdapterError::InvalidOption`] when `debug` is not a
    /// recognizable boolean.
    pub fn from_options(options: &Options) -> Result<Self, AdapterError> {
        let token = options.get(OPTION_TOKEN).cloned().unwrap_or_default();
        if token.is_empty() {
            return Err(AdapterError::MissingToken);
        }

        let debug = match options.get(OPTION_DEBUG) {
            None => false,
            Some(value) => parse_bool(value).ok_or_else(|| AdapterError::InvalidOption {
                key: OPTION_DEBUG.to_owned(),
                value: value.clone(),
            })?,
        };

        for key in options.keys() {
            if key != OPTION_TOKEN && key != OPTION_DEBUG {
                debug!(option = %key, "ignoring unrecognized adapter option");
            }
        }

        Ok(Self {
            token,
            debug,
            refresh_interval_secs: default_refresh_interval(),
        })
    }
}

/// Accepted boolean spellings for option values.
fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Load an [`AdapterConfig`] from a TOML file.
///
/// # Errors
///
/// Returns [`AdapterError::ConfigRead`] / [`AdapterError::ConfigParse`]
/// on I/O or syntax failure, and [`AdapterError::MissingToken`] when
/// the file omits the credential.
pub fn load_config(path: &Path) -> Result<AdapterConfig, AdapterError> {
    let contents = std::fs::read_to_string(path).map_err(|e| AdapterError::ConfigRead {
        path: path.display().to_string(),
        source: e,
    })?;
    let config: AdapterConfig =
        toml::from_str(&contents).map_err(|e| AdapterError::ConfigParse {
            path: path.display().to_string(),
            source: e,
        })?;
    if config.token.is_empty() {
        return Err(AdapterError::MissingToken);
    }
    Ok(config)
}
