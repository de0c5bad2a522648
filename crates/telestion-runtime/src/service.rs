//! Service startup.
//!
//! Starting a service assembles its configuration once and decides whether a
//! NATS connection should be opened. The connection itself is made by the
//! caller's NATS client using the returned [`NatsEndpoint`].
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use telestion_runtime::service::{Options, start_service_or_exit, wait_for_interrupt};
//!
//! #[tokio::main]
//! async fn main() {
//!     let service = start_service_or_exit(Options::new());
//!
//!     if let Some(endpoint) = &service.nats {
//!         // hand `endpoint.url` to the NATS client
//!     }
//!
//!     wait_for_interrupt().await;
//! }
//! ```

use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::config::{ConfigError, ConfigLoader, Environment, FlatConfig, TelestionConfig};
use crate::error::{RuntimeError, RuntimeResult};

/// Options that modify how [`start_service`] behaves.
#[derive(Debug, Clone)]
pub struct Options {
    /// Whether the service should connect to NATS.
    pub nats: bool,
    /// Configuration values that take precedence over every other source.
    pub overwrite_args: Option<FlatConfig>,
    /// Command line tokens to use instead of the process arguments.
    pub args: Option<Vec<String>>,
    /// Environment snapshot to use instead of the process environment.
    pub environment: Option<Environment>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            nats: true,
            overwrite_args: None,
            args: None,
            environment: None,
        }
    }
}

impl Options {
    /// Creates options that connect to NATS and use the process arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Disables the NATS connection.
    pub fn without_nats(mut self) -> Self {
        self.nats = false;
        self
    }

    /// Adds configuration values with the highest precedence.
    pub fn with_overwrite_args(mut self, args: FlatConfig) -> Self {
        self.overwrite_args = Some(args);
        self
    }

    /// Uses the given command line tokens instead of the process arguments.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    /// Uses the given environment snapshot instead of the process environment.
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Returns `true` if the command line asks for development mode.
    fn requests_dev(&self) -> bool {
        self.loader().requests_dev()
    }

    fn loader(&self) -> ConfigLoader {
        let mut loader = ConfigLoader::new();
        if let Some(args) = &self.args {
            loader = loader.args(args.iter().cloned());
        }
        if let Some(environment) = &self.environment {
            loader = loader.environment(environment.clone());
        }
        if let Some(overrides) = &self.overwrite_args {
            loader = loader.overrides(overrides.clone());
        }
        loader
    }
}

/// Connection parameters for the NATS client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NatsEndpoint {
    /// Server URL, with credentials embedded when both are configured.
    pub url: String,
    /// User name for authentication.
    pub user: Option<String>,
    /// Password for authentication.
    pub password: Option<String>,
}

impl NatsEndpoint {
    /// Builds the endpoint for a configuration.
    pub fn from_config(config: &TelestionConfig) -> Self {
        Self {
            url: prepare_nats_url(config),
            user: config.nats_user.clone(),
            password: config.nats_password.clone(),
        }
    }
}

/// A started Telestion service.
#[derive(Debug, Clone)]
pub struct Service {
    /// Endpoint to connect to, `None` if NATS is disabled.
    pub nats: Option<NatsEndpoint>,
    /// Absolute path to the data directory.
    pub data_dir: PathBuf,
    /// Name of the service.
    pub service_name: String,
    /// The assembled configuration.
    pub config: TelestionConfig,
}

impl Service {
    /// Returns `true` if the service should connect to NATS.
    pub fn should_connect(&self) -> bool {
        self.nats.is_some()
    }
}

/// Starts a service from the process arguments and environment.
pub fn start_service(options: Options) -> RuntimeResult<Service> {
    let config = options.loader().load()?;
    service_from_config(config, options.nats)
}

/// Creates a service from an already assembled configuration.
pub fn service_from_config(config: TelestionConfig, nats: bool) -> RuntimeResult<Service> {
    let data_dir = std::path::absolute(&config.data_dir).map_err(|source| RuntimeError::DataDir {
        path: config.data_dir.clone(),
        source,
    })?;

    let nats = nats.then(|| NatsEndpoint::from_config(&config));

    info!(
        service_name = %config.service_name,
        data_dir = %data_dir.display(),
        nats = nats.is_some(),
        "Service started"
    );

    Ok(Service {
        nats,
        data_dir,
        service_name: config.service_name.clone(),
        config,
    })
}

/// Starts a service or terminates the process with a diagnostic.
///
/// Help and version requests print their output and exit with status 0.
/// Every other startup error exits with status 1.
pub fn start_service_or_exit(options: Options) -> Service {
    let dev = options.requests_dev();
    match start_service(options) {
        Ok(service) => service,
        Err(e) => exit_with(&e, dev),
    }
}

fn exit_with(e: &RuntimeError, dev: bool) -> ! {
    if let RuntimeError::Config(ConfigError::Cli(cli)) = e {
        cli.exit();
    }

    error!(error = %e, "Failed to start service");
    eprintln!("Error: {e}");
    if !dev && matches!(e, RuntimeError::Config(ConfigError::SchemaValidation { .. })) {
        eprintln!(
            "Run with \"--dev\" to use default values for missing parameters during development."
        );
    }
    std::process::exit(1);
}

/// Builds the URL the NATS client connects to.
///
/// Credentials are embedded only if both user and password are configured.
pub fn prepare_nats_url(config: &TelestionConfig) -> String {
    let (Some(user), Some(password)) = (&config.nats_user, &config.nats_password) else {
        return config.nats_url.clone();
    };

    let host = config
        .nats_url
        .split_once("://")
        .map_or(config.nats_url.as_str(), |(_, rest)| rest);

    format!("nats://{user}:{password}@{host}")
}

/// Signal that ended [`wait_for_interrupt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    /// Ctrl+C.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

/// Waits until the process receives Ctrl+C or SIGTERM.
#[cfg(unix)]
pub async fn wait_for_interrupt() -> Shutdown {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!(error = %e, "Failed to register SIGTERM handler, waiting for Ctrl+C only");
            return wait_for_ctrl_c().await;
        }
    };

    tokio::select! {
        shutdown = wait_for_ctrl_c() => shutdown,
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down");
            Shutdown::Terminate
        }
    }
}

/// Waits until the process receives Ctrl+C.
#[cfg(not(unix))]
pub async fn wait_for_interrupt() -> Shutdown {
    wait_for_ctrl_c().await
}

async fn wait_for_ctrl_c() -> Shutdown {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down");
    Shutdown::Interrupt
}
