//! Configuration module for Telestion services.
//!
//! This module assembles one typed service configuration from development
//! defaults, an optional JSON config file, the process environment, the
//! command line and programmatic overrides.
//!
//! ```text
//! defaults ─┐
//! file ─────┤
//! env ──────┼─▶ FlatConfig ─▶ bind ─▶ TelestionConfig { fields.., extensions }
//! cli ──────┤
//! override ─┘
//! ```

pub mod args;
pub mod cli;
pub mod error;
pub mod loader;
pub mod schema;
pub mod sources;
pub mod validation;
pub mod value;

pub use args::tokenize;
pub use cli::{KnownArgs, read_cli};
pub use error::{ConfigError, ConfigResult, FieldIssue, FieldProblem};
pub use loader::{Assembly, ConfigLoader, load_config};
pub use schema::{TelestionConfig, keys};
pub use sources::{Environment, Source, dev_defaults, read_config_file};
pub use validation::bind;
pub use value::{ConfigValue, FlatConfig};
