//! Binding of a merged mapping to [`TelestionConfig`].

use std::path::PathBuf;

use super::error::{ConfigError, ConfigResult, FieldIssue};
use super::schema::{TelestionConfig, keys};
use super::value::{ConfigValue, FlatConfig};

/// Binds a merged mapping to the typed configuration.
///
/// Declared fields are removed from the mapping and coerced to their types;
/// whatever remains becomes the extension bag. All missing and mistyped fields
/// are reported together in a single [`ConfigError::SchemaValidation`].
pub fn bind(mut flat: FlatConfig) -> ConfigResult<TelestionConfig> {
    let mut issues = Vec::new();

    let dev = take_bool(&mut flat, keys::DEV, &mut issues).unwrap_or(false);
    let nats_url = required(
        take_string(&mut flat, keys::NATS_URL, &mut issues),
        keys::NATS_URL,
        &mut issues,
    );
    let nats_user = take_string(&mut flat, keys::NATS_USER, &mut issues);
    let nats_password = take_string(&mut flat, keys::NATS_PASSWORD, &mut issues);
    let config_file = take_string(&mut flat, keys::CONFIG_FILE, &mut issues).map(PathBuf::from);
    let config_key = take_string(&mut flat, keys::CONFIG_KEY, &mut issues);
    let service_name = required(
        take_string(&mut flat, keys::SERVICE_NAME, &mut issues),
        keys::SERVICE_NAME,
        &mut issues,
    );
    let data_dir = required(
        take_string(&mut flat, keys::DATA_DIR, &mut issues),
        keys::DATA_DIR,
        &mut issues,
    );

    match (nats_url, service_name, data_dir) {
        (Some(nats_url), Some(service_name), Some(data_dir)) if issues.is_empty() => {
            Ok(TelestionConfig {
                dev,
                nats_url,
                nats_user,
                nats_password,
                config_file,
                config_key,
                service_name,
                data_dir: PathBuf::from(data_dir),
                extensions: flat,
            })
        }
        _ => Err(ConfigError::SchemaValidation { issues }),
    }
}

/// Records a missing field unless the lookup already reported a type error.
fn required(value: Option<String>, key: &str, issues: &mut Vec<FieldIssue>) -> Option<String> {
    if value.is_none() && !issues.iter().any(|i| i.field == key) {
        issues.push(FieldIssue::missing(key));
    }
    value
}

fn take_string(flat: &mut FlatConfig, key: &str, issues: &mut Vec<FieldIssue>) -> Option<String> {
    match flat.remove(key)? {
        ConfigValue::String(s) => Some(s),
        ConfigValue::Json(serde_json::Value::Number(n)) => Some(n.to_string()),
        ConfigValue::Bool(b) => Some(b.to_string()),
        other => {
            issues.push(FieldIssue::wrong_type(key, "string", other.kind()));
            None
        }
    }
}

fn take_bool(flat: &mut FlatConfig, key: &str, issues: &mut Vec<FieldIssue>) -> Option<bool> {
    let value = flat.remove(key)?;
    let parsed = value
        .as_bool()
        .or_else(|| value.as_str().and_then(parse_bool));
    if parsed.is_none() {
        issues.push(FieldIssue::wrong_type(key, "boolean", value.kind()));
    }
    parsed
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
