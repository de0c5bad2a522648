//! Telestion Runtime - Configuration and startup for Telestion backend services.
//!
//! This crate provides:
//! - Layered configuration assembly (`ConfigLoader`, `TelestionConfig`)
//! - A permissive command line tokenizer for free-form service parameters
//! - Service startup (`start_service`) with NATS endpoint preparation
//! - JSON message helpers and the health check wire format
//! - Logging configuration
//!
//! # Configuration Sources
//!
//! Configuration is merged from lowest to highest precedence:
//!
//! 1. Development defaults (only with `--dev`)
//! 2. The JSON config file named by `CONFIG_FILE`, optionally narrowed by `CONFIG_KEY`
//! 3. Environment variables
//! 4. Command line arguments
//! 5. Programmatic overrides
//!
//! ```ignore
//! use telestion_runtime::{Options, start_service_or_exit, wait_for_interrupt};
//!
//! #[tokio::main]
//! async fn main() {
//!     telestion_runtime::logging::init_for_args(std::env::args_os());
//!
//!     let service = start_service_or_exit(Options::new());
//!     let threshold = service.config.extension("THRESHOLD");
//!
//!     wait_for_interrupt().await;
//! }
//! ```

pub mod codec;
pub mod config;
pub mod error;
pub mod logging;
pub mod service;

// Re-exports
pub use codec::{HEALTH_SUBJECT, HealthReport, json_decode, json_encode};
pub use config::{
    ConfigError, ConfigLoader, ConfigResult, ConfigValue, FlatConfig, TelestionConfig,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LogFormat, LogOutput, LoggingBuilder};
pub use service::{
    NatsEndpoint, Options, Service, Shutdown, prepare_nats_url, start_service,
    start_service_or_exit, wait_for_interrupt,
};

// Re-export tracing for use by other crates
pub use tracing;

/// Prelude module for convenient imports.
///
/// This provides all the commonly used logging macros:
/// - `trace!`, `debug!`, `info!`, `warn!`, `error!`
/// - `instrument` attribute
/// - `Level` for span creation
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, trace, warn};
}
