//! Configuration assembly pipeline.
//!
//! # Configuration Priority (lowest to highest)
//!
//! 1. Development defaults, only with `--dev`
//! 2. Config file, only if `CONFIG_FILE` is set on the command line or in the
//!    environment (optionally narrowed to the object under `CONFIG_KEY`)
//! 3. Environment variables
//! 4. Command line arguments, declared and undeclared
//! 5. Programmatic overrides
//!
//! Later sources replace earlier ones key by key. Values are never merged
//! deeply and lists are never concatenated across sources.
//!
//! Locating the config file is a separate, read-only step: the command line
//! wins over the environment for `CONFIG_FILE` and `CONFIG_KEY`, and values
//! of these keys inside the file itself are ignored for that purpose.
//!
//! # Example
//!
//! ```rust,ignore
//! use telestion_runtime::config::{ConfigLoader, FlatConfig};
//!
//! // Process arguments and environment
//! let config = ConfigLoader::new().load()?;
//!
//! // Injected sources, e.g. in tests
//! let config = ConfigLoader::new()
//!     .args(["--dev", "--foo", "bar"])
//!     .environment([("NATS_URL", "nats://nats:4222")].into_iter().collect())
//!     .overrides(FlatConfig::new().with("SERVICE_NAME", "fixed"))
//!     .load()?;
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use super::cli::{read_cli, utf8_args};
use super::error::ConfigResult;
use super::schema::{TelestionConfig, keys};
use super::sources::{Environment, Source, dev_defaults, read_config_file};
use super::validation::bind;
use super::value::{ConfigValue, FlatConfig};

/// The merged mapping together with the source of every key.
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    flat: FlatConfig,
    origins: BTreeMap<String, Source>,
}

impl Assembly {
    fn new() -> Self {
        Self {
            flat: FlatConfig::new(),
            origins: BTreeMap::new(),
        }
    }

    /// Applies one source on top of the current state.
    fn apply(&mut self, source: Source, layer: FlatConfig) {
        debug!(source = %source, keys = layer.len(), "Applying configuration source");
        for key in layer.keys() {
            self.origins.insert(key.clone(), source);
        }
        self.flat.merge(layer);
    }

    /// The merged flat mapping.
    pub fn flat(&self) -> &FlatConfig {
        &self.flat
    }

    /// Returns the source that supplied the final value of `key`.
    pub fn origin(&self, key: &str) -> Option<Source> {
        self.origins.get(key).copied()
    }

    /// Consumes the assembly and returns the merged mapping.
    pub fn into_flat(self) -> FlatConfig {
        self.flat
    }

    /// Binds the merged mapping to the typed configuration.
    pub fn bind(self) -> ConfigResult<TelestionConfig> {
        bind(self.flat)
    }
}

/// Configuration loader that folds every source into one mapping.
///
/// Each call to [`Self::assemble`] or [`Self::load`] reads its sources afresh
/// and yields an independent result; identical sources give identical
/// mappings.
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Command line tokens without the program name.
    args: Option<Vec<String>>,
    /// Environment snapshot.
    environment: Option<Environment>,
    /// Programmatic overrides.
    overrides: Option<FlatConfig>,
}

impl ConfigLoader {
    /// Creates a loader that reads the process arguments and environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses the given command line tokens instead of the process arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Uses the given environment snapshot instead of capturing one.
    pub fn environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Applies `overrides` after every other source.
    pub fn overrides(mut self, overrides: FlatConfig) -> Self {
        self.overrides = Some(overrides);
        self
    }

    /// Loads and binds the configuration.
    pub fn load(&self) -> ConfigResult<TelestionConfig> {
        let config = self.assemble()?.bind()?;

        debug!(
            service_name = %config.service_name,
            dev = config.dev,
            extensions = config.extensions.len(),
            "Configuration loaded successfully"
        );

        Ok(config)
    }

    /// Folds all sources into one flat mapping without binding it.
    pub fn assemble(&self) -> ConfigResult<Assembly> {
        let cli = self.read_command_line()?;
        let environment = match &self.environment {
            Some(environment) => environment.clone(),
            None => Environment::capture(),
        };

        let mut assembly = Assembly::new();

        if dev_mode(&cli) {
            info!("Running in development mode. Using default values for missing parameters.");
            assembly.apply(Source::Defaults, dev_defaults());
        }

        if let Some(path) = locate(&cli, &environment, keys::CONFIG_FILE) {
            let key = locate(&cli, &environment, keys::CONFIG_KEY);
            let file = read_config_file(Path::new(&path), key.as_deref())?;
            assembly.apply(Source::ConfigFile, file);
        }

        assembly.apply(Source::Environment, environment.to_flat());
        assembly.apply(Source::Cli, cli);

        if let Some(overrides) = &self.overrides {
            assembly.apply(Source::Override, overrides.clone());
        }

        Ok(assembly)
    }

    /// Returns `true` if the command line enables development mode.
    ///
    /// A command line that cannot be read counts as not enabling it.
    pub fn requests_dev(&self) -> bool {
        self.read_command_line()
            .map(|cli| dev_mode(&cli))
            .unwrap_or(false)
    }

    fn read_command_line(&self) -> ConfigResult<FlatConfig> {
        match &self.args {
            Some(args) => read_cli(args.iter().cloned()),
            None => read_cli(utf8_args(std::env::args_os().skip(1))?),
        }
    }
}

fn dev_mode(cli: &FlatConfig) -> bool {
    cli.get(keys::DEV)
        .and_then(ConfigValue::as_bool)
        .unwrap_or(false)
}

/// Resolves a config file locator, preferring the command line.
fn locate(cli: &FlatConfig, environment: &Environment, key: &str) -> Option<String> {
    cli.get_str(key)
        .or_else(|| environment.get(key))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Loads the configuration from the process arguments and environment.
pub fn load_config() -> ConfigResult<TelestionConfig> {
    ConfigLoader::new().load()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::error::ConfigError;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn env(vars: &[(&str, &str)]) -> Environment {
        vars.iter().copied().collect()
    }

    fn minimal_env() -> Environment {
        env(&[
            ("NATS_URL", "nats://env:4222"),
            ("SERVICE_NAME", "env-service"),
            ("DATA_DIR", "/env/data"),
        ])
    }

    #[test]
    fn test_environment_only() {
        let config = ConfigLoader::new()
            .args(Vec::<String>::new())
            .environment(minimal_env())
            .load()
            .unwrap();

        assert_eq!(config.nats_url, "nats://env:4222");
        assert!(!config.dev);
    }

    #[test]
    fn test_missing_required_fields_fail() {
        let err = ConfigLoader::new()
            .args(Vec::<String>::new())
            .environment(Environment::empty())
            .load()
            .unwrap_err();

        assert!(matches!(err, ConfigError::SchemaValidation { ref issues } if issues.len() == 3));
    }

    #[test]
    fn test_dev_defaults_only_with_dev_flag() {
        let without = ConfigLoader::new()
            .args(["--foo", "bar"])
            .environment(Environment::empty())
            .assemble()
            .unwrap();
        assert!(without.flat().get("NATS_URL").is_none());

        let with = ConfigLoader::new()
            .args(["--dev"])
            .environment(Environment::empty())
            .load()
            .unwrap();
        assert!(with.dev);
        assert_eq!(with.nats_url, "nats://localhost:4222");
        assert_eq!(with.service_name, format!("dev-{}", std::process::id()));
        assert_eq!(with.data_dir, PathBuf::from("./data"));
    }

    #[test]
    fn test_dev_defaults_are_overwritten() {
        let assembly = ConfigLoader::new()
            .args(["--dev", "--SERVICE_NAME", "cli-service"])
            .environment(env(&[("NATS_URL", "nats://env:4222")]))
            .assemble()
            .unwrap();

        assert_eq!(assembly.flat().get_str("NATS_URL"), Some("nats://env:4222"));
        assert_eq!(assembly.origin("NATS_URL"), Some(Source::Environment));
        assert_eq!(assembly.flat().get_str("SERVICE_NAME"), Some("cli-service"));
        assert_eq!(assembly.origin("SERVICE_NAME"), Some(Source::Cli));
        assert_eq!(assembly.origin("DATA_DIR"), Some(Source::Defaults));
    }

    #[test]
    fn test_all_five_sources_override_wins() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("config.json");
        fs::write(
            &path,
            r#"{"svc": {"NATS_URL": "nats://file:4222", "FROM_FILE": "yes"}}"#,
        )
        .expect("write");

        let environment = env(&[
            ("NATS_URL", "nats://env:4222"),
            ("CONFIG_FILE", path.to_str().expect("utf8 path")),
            ("CONFIG_KEY", "svc"),
        ]);

        let assembly = ConfigLoader::new()
            .args(["--dev", "--NATS_URL", "nats://cli:4222"])
            .environment(environment)
            .overrides(FlatConfig::new().with("NATS_URL", "nats://override:4222"))
            .assemble()
            .unwrap();

        assert_eq!(
            assembly.flat().get_str("NATS_URL"),
            Some("nats://override:4222")
        );
        assert_eq!(assembly.origin("NATS_URL"), Some(Source::Override));
        assert_eq!(assembly.flat().get_str("FROM_FILE"), Some("yes"));
        assert_eq!(assembly.origin("FROM_FILE"), Some(Source::ConfigFile));
        assert_eq!(assembly.origin("SERVICE_NAME"), Some(Source::Defaults));

        let config = assembly.bind().unwrap();
        assert_eq!(config.nats_url, "nats://override:4222");
        assert_eq!(config.config_key.as_deref(), Some("svc"));
    }

    #[test]
    fn test_file_overridden_by_environment() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{"NATS_URL": "nats://file:4222", "SERVICE_NAME": "file"}"#)
            .expect("write");

        let config = ConfigLoader::new()
            .args(["--CONFIG_FILE", path.to_str().expect("utf8 path")])
            .environment(env(&[("NATS_URL", "nats://env:4222"), ("DATA_DIR", "/d")]))
            .load()
            .unwrap();

        assert_eq!(config.nats_url, "nats://env:4222");
        assert_eq!(config.service_name, "file");
        assert_eq!(config.config_file, Some(path));
    }

    #[test]
    fn test_cli_config_file_wins_over_environment_for_locating() {
        let tmp = TempDir::new().expect("tmp");
        let cli_path = tmp.path().join("cli.json");
        fs::write(&cli_path, r#"{"PICKED": "cli"}"#).expect("write");
        let env_path = tmp.path().join("env.json");
        fs::write(&env_path, r#"{"PICKED": "env"}"#).expect("write");

        let assembly = ConfigLoader::new()
            .args(["--CONFIG_FILE", cli_path.to_str().expect("utf8 path")])
            .environment(env(&[(
                "CONFIG_FILE",
                env_path.to_str().expect("utf8 path"),
            )]))
            .assemble()
            .unwrap();

        assert_eq!(assembly.flat().get_str("PICKED"), Some("cli"));
        // Locating is separate from the fold, the CLI also owns the key itself.
        assert_eq!(assembly.origin("CONFIG_FILE"), Some(Source::Cli));
    }

    #[test]
    fn test_missing_config_file_is_fatal() {
        let err = ConfigLoader::new()
            .args(["--dev"])
            .environment(env(&[("CONFIG_FILE", "/definitely/not/here.json")]))
            .load()
            .unwrap_err();

        assert!(matches!(err, ConfigError::ConfigFileNotFound(_)));
    }

    #[test]
    fn test_missing_config_key_is_fatal() {
        let tmp = TempDir::new().expect("tmp");
        let path = tmp.path().join("config.json");
        fs::write(&path, r#"{"a": {}}"#).expect("write");

        let err = ConfigLoader::new()
            .args([
                "--dev",
                "--CONFIG_FILE",
                path.to_str().expect("utf8 path"),
                "--CONFIG_KEY",
                "b",
            ])
            .environment(Environment::empty())
            .load()
            .unwrap_err();

        assert!(matches!(err, ConfigError::ConfigKeyNotFound { .. }));
    }

    #[test]
    fn test_malformed_arguments_are_fatal() {
        let err = ConfigLoader::new()
            .args(["stray", "--dev"])
            .environment(minimal_env())
            .load()
            .unwrap_err();

        assert!(matches!(err, ConfigError::MalformedArguments { .. }));
    }

    #[test]
    fn test_unknown_arguments_reach_extensions() {
        let config = ConfigLoader::new()
            .args(["--foo", "bar", "--foo", "baz", "--flag", "--level=3"])
            .environment(minimal_env())
            .load()
            .unwrap();

        assert_eq!(
            config.extension("foo"),
            Some(&ConfigValue::List(vec!["bar".into(), "baz".into()]))
        );
        assert_eq!(config.extension("flag"), Some(&ConfigValue::Bool(true)));
        assert_eq!(config.extension("level"), Some(&ConfigValue::from("3")));
    }

    #[test]
    fn test_requests_dev_follows_parsed_command_line() {
        let dev = |args: &[&str]| ConfigLoader::new().args(args.iter().copied()).requests_dev();

        assert!(dev(&["--dev"]));
        assert!(dev(&["-dev"]));
        assert!(dev(&["--dev", "--dev"]));
        assert!(!dev(&["--SERVICE_NAME", "svc"]));
        assert!(!dev(&["--developer"]));
        assert!(!dev(&["stray", "--dev"]));
    }

    #[test]
    fn test_single_dash_dev_applies_defaults() {
        let assembly = ConfigLoader::new()
            .args(["-dev"])
            .environment(Environment::empty())
            .assemble()
            .unwrap();

        assert_eq!(assembly.origin("NATS_URL"), Some(Source::Defaults));
    }

    #[test]
    fn test_assembly_is_idempotent() {
        let loader = ConfigLoader::new()
            .args(["--dev", "--foo", "bar", "--foo", "baz"])
            .environment(minimal_env());

        let first = loader.assemble().unwrap();
        let second = loader.assemble().unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(first.flat()).unwrap(),
            serde_json::to_string(second.flat()).unwrap()
        );
    }
}
