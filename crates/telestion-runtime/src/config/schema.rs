//! Configuration schema definitions.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::PathBuf;

use super::error::ConfigResult;
use super::validation::bind;
use super::value::{ConfigValue, FlatConfig};

/// Keys of the declared configuration fields.
pub mod keys {
    /// Development mode toggle.
    pub const DEV: &str = "dev";
    /// URL of the NATS server.
    pub const NATS_URL: &str = "NATS_URL";
    /// NATS user name.
    pub const NATS_USER: &str = "NATS_USER";
    /// NATS password.
    pub const NATS_PASSWORD: &str = "NATS_PASSWORD";
    /// Path of the JSON config file.
    pub const CONFIG_FILE: &str = "CONFIG_FILE";
    /// Key of the config file object that configures this service.
    pub const CONFIG_KEY: &str = "CONFIG_KEY";
    /// Name of the service.
    pub const SERVICE_NAME: &str = "SERVICE_NAME";
    /// Directory for persistent service data.
    pub const DATA_DIR: &str = "DATA_DIR";

    /// Every declared key, in declaration order.
    pub const ALL: [&str; 8] = [
        DEV,
        NATS_URL,
        NATS_USER,
        NATS_PASSWORD,
        CONFIG_FILE,
        CONFIG_KEY,
        SERVICE_NAME,
        DATA_DIR,
    ];
}

/// The bound service configuration.
///
/// Declared fields are typed; every other key from any source is kept in
/// [`Self::extensions`] so services can read their own settings next to the
/// standard ones. Instances are immutable: use [`Self::with_overrides`] to
/// derive a modified copy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelestionConfig {
    /// Development mode. Enables built-in defaults for missing fields.
    pub dev: bool,

    /// URL of the NATS server the service connects to.
    #[serde(rename = "NATS_URL")]
    pub nats_url: String,

    /// User name for NATS authentication.
    #[serde(rename = "NATS_USER", skip_serializing_if = "Option::is_none")]
    pub nats_user: Option<String>,

    /// Password for NATS authentication.
    #[serde(rename = "NATS_PASSWORD", skip_serializing_if = "Option::is_none")]
    pub nats_password: Option<String>,

    /// Config file that was read during assembly, if any.
    #[serde(rename = "CONFIG_FILE", skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,

    /// Key of the config file object that configures this service.
    #[serde(rename = "CONFIG_KEY", skip_serializing_if = "Option::is_none")]
    pub config_key: Option<String>,

    /// Name of the service.
    #[serde(rename = "SERVICE_NAME")]
    pub service_name: String,

    /// Directory where the service stores persistent data.
    #[serde(rename = "DATA_DIR")]
    pub data_dir: PathBuf,

    /// Every key that is not a declared field.
    #[serde(flatten)]
    pub extensions: FlatConfig,
}

impl TelestionConfig {
    /// Binds a merged mapping to the typed configuration.
    pub fn from_flat(flat: FlatConfig) -> ConfigResult<Self> {
        bind(flat)
    }

    /// Converts the configuration back into a flat mapping.
    pub fn to_flat(&self) -> FlatConfig {
        let mut flat = self.extensions.clone();
        flat.insert(keys::DEV, self.dev);
        flat.insert(keys::NATS_URL, self.nats_url.as_str());
        flat.insert(keys::SERVICE_NAME, self.service_name.as_str());
        flat.insert(keys::DATA_DIR, self.data_dir.to_string_lossy().into_owned());

        let optional = [
            (keys::NATS_USER, self.nats_user.clone()),
            (keys::NATS_PASSWORD, self.nats_password.clone()),
            (
                keys::CONFIG_FILE,
                self.config_file
                    .as_ref()
                    .map(|p| p.to_string_lossy().into_owned()),
            ),
            (keys::CONFIG_KEY, self.config_key.clone()),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                flat.insert(key, value);
            }
        }

        flat
    }

    /// Returns a new configuration with `overrides` applied on top.
    ///
    /// The result is validated again, so overriding a declared field with a
    /// value of the wrong type fails just like it would during assembly.
    pub fn with_overrides(&self, overrides: FlatConfig) -> ConfigResult<Self> {
        let mut flat = self.to_flat();
        flat.merge(overrides);
        bind(flat)
    }

    /// Returns the raw value of an extension key.
    pub fn extension(&self, key: &str) -> Option<&ConfigValue> {
        self.extensions.get(key)
    }

    /// Deserializes a single extension value.
    ///
    /// Returns `None` if the key is absent.
    pub fn extension_as<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Option<Result<T, serde_json::Error>> {
        self.extension(key)
            .map(|value| serde_json::from_value(value.to_json()))
    }

    /// Deserializes the whole extension bag into a service-specific type.
    ///
    /// ```rust,ignore
    /// #[derive(Deserialize)]
    /// struct MyServiceConfig {
    ///     #[serde(rename = "MONGO_URL")]
    ///     mongo_url: String,
    /// }
    ///
    /// let custom: MyServiceConfig = config.extensions_as()?;
    /// ```
    pub fn extensions_as<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.extensions.to_json())
    }
}
