//! Independent configuration sources.
//!
//! Each reader yields its own [`FlatConfig`] and can be used and tested in
//! isolation. Only the config file reader performs I/O.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use tracing::{debug, info};

use super::error::{ConfigError, ConfigResult};
use super::schema::keys;
use super::value::{ConfigValue, FlatConfig};

/// The origin of a configuration value, in precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
    /// Built-in development defaults.
    Defaults,
    /// The JSON config file.
    ConfigFile,
    /// Process environment variables.
    Environment,
    /// Command line arguments, declared and undeclared.
    Cli,
    /// Values passed programmatically by the service.
    Override,
}

impl Source {
    /// Returns the source name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Defaults => "defaults",
            Self::ConfigFile => "config-file",
            Self::Environment => "environment",
            Self::Cli => "cli",
            Self::Override => "override",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Default NATS URL used in development mode.
pub const DEFAULT_NATS_URL: &str = "nats://localhost:4222";

/// Default data directory used in development mode.
pub const DEFAULT_DATA_DIR: &str = "./data";

/// Returns the development mode defaults for the current process.
pub fn dev_defaults() -> FlatConfig {
    dev_defaults_for(std::process::id())
}

/// Returns the development mode defaults for the given process id.
pub fn dev_defaults_for(pid: u32) -> FlatConfig {
    FlatConfig::new()
        .with(keys::NATS_URL, DEFAULT_NATS_URL)
        .with(keys::SERVICE_NAME, format!("dev-{pid}"))
        .with(keys::DATA_DIR, DEFAULT_DATA_DIR)
}

/// Reads a JSON config file, optionally narrowed to one of its objects.
///
/// The document must be a JSON object. With `key` set, the value under that
/// key must exist and be an object itself; it then becomes the effective root.
pub fn read_config_file(path: &Path, key: Option<&str>) -> ConfigResult<FlatConfig> {
    let content = fs::read_to_string(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => ConfigError::ConfigFileNotFound(path.to_path_buf()),
        _ => ConfigError::ReadError {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let document: serde_json::Value =
        serde_json::from_str(&content).map_err(|e| ConfigError::parse(path, e.to_string()))?;

    let serde_json::Value::Object(mut root) = document else {
        return Err(ConfigError::parse(path, "document root is not an object"));
    };

    let section = match key {
        None => root,
        Some(key) => match root.remove(key) {
            None => return Err(ConfigError::key_not_found(key, path)),
            Some(serde_json::Value::Object(section)) => section,
            Some(_) => {
                return Err(ConfigError::parse(
                    path,
                    format!("value under key '{key}' is not an object"),
                ));
            }
        },
    };

    info!(path = %path.display(), key = ?key, "Loaded configuration file");

    Ok(section
        .into_iter()
        .map(|(k, v)| (k, ConfigValue::from(v)))
        .collect())
}

/// A snapshot of process environment variables.
///
/// Captured once at startup so that the rest of the pipeline never reads the
/// process environment directly. Tests build snapshots with
/// [`Environment::from_iter`] instead of mutating real process state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Captures the current process environment.
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    pub fn capture() -> Self {
        let vars: BTreeMap<String, String> = std::env::vars_os()
            .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
            .collect();
        debug!(count = vars.len(), "Captured environment snapshot");
        Self { vars }
    }

    /// Creates an empty snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the value of a variable.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    /// Converts the snapshot into a flat mapping of string values.
    pub fn to_flat(&self) -> FlatConfig {
        self.vars
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Environment {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
