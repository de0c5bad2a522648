//! # Telestion
//!
//! Write backend services for the Telestion ground station framework in Rust.
//!
//! ## Overview
//!
//! A Telestion service is a small process that talks to other services over
//! NATS. Every service starts the same way: it assembles its configuration
//! from several sources, resolves its data directory and prepares the NATS
//! connection parameters.
//!
//! ```text
//! ┌──────────────┐     ┌───────────────┐     ┌──────────────────┐
//! │ defaults     │     │               │     │ TelestionConfig  │
//! │ config file  │────▶│ ConfigLoader  │────▶│ Service          │──▶ NATS client
//! │ env / cli    │     │               │     │ NatsEndpoint     │
//! └──────────────┘     └───────────────┘     └──────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use telestion::prelude::*;
//!
//! #[tokio::main]
//! async fn main() {
//!     telestion::runtime::logging::init_for_args(std::env::args_os());
//!
//!     let service = start_service_or_exit(Options::new());
//!     info!(name = %service.service_name, "ready");
//!
//!     wait_for_interrupt().await;
//! }
//! ```
//!
//! ## Features
//!
//! - `json-log`: Enable JSON formatted log output

pub use telestion_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use telestion::prelude::*;
/// ```
pub mod prelude {
    // Startup
    pub use telestion_runtime::{
        Options, Service, start_service, start_service_or_exit, wait_for_interrupt,
    };

    // Configuration
    pub use telestion_runtime::config::{ConfigLoader, ConfigValue, FlatConfig, TelestionConfig};

    // Messages
    pub use telestion_runtime::{HEALTH_SUBJECT, HealthReport, json_decode, json_encode};

    // Errors
    pub use telestion_runtime::{ConfigError, RuntimeError, RuntimeResult};

    // Logging
    pub use telestion_runtime::LoggingBuilder;
    pub use telestion_runtime::prelude::*;
}
