//! Configuration error types.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while assembling and binding the configuration.
///
/// None of these are recoverable at the point they occur: the loader never
/// retries a source or substitutes defaults for a failed field.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A value token appeared on the command line without a preceding flag,
    /// or a flag had an empty name.
    #[error("Malformed command line arguments: {message}")]
    MalformedArguments { message: String },

    /// The configuration file referenced by `CONFIG_FILE` does not exist.
    #[error("Configuration file not found: {0}")]
    ConfigFileNotFound(PathBuf),

    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not a valid JSON object document.
    #[error("Failed to parse configuration file {path}: {reason}")]
    ConfigParse { path: PathBuf, reason: String },

    /// The narrowing key given by `CONFIG_KEY` is absent from the file.
    #[error("Configuration key '{key}' not found in {path}")]
    ConfigKeyNotFound { key: String, path: PathBuf },

    /// The merged mapping could not be bound to the typed configuration.
    #[error("Invalid configuration: {}", FieldIssues(.issues))]
    SchemaValidation { issues: Vec<FieldIssue> },

    /// Known flag parsing failed, or help/version output was requested.
    #[error(transparent)]
    Cli(#[from] clap::Error),
}

impl ConfigError {
    /// Creates a malformed arguments error with the given message.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedArguments {
            message: message.into(),
        }
    }

    /// Creates a parse error for the given file.
    pub fn parse(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ConfigParse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a missing narrowing key error.
    pub fn key_not_found(key: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::ConfigKeyNotFound {
            key: key.into(),
            path: path.into(),
        }
    }

    /// Returns `true` for help and version requests, which are not failures.
    pub fn is_informational(&self) -> bool {
        matches!(
            self,
            Self::Cli(e) if matches!(
                e.kind(),
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion
            )
        )
    }
}

/// A single problem found while binding a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    /// The configuration key of the field.
    pub field: String,
    /// What went wrong.
    pub problem: FieldProblem,
}

/// The kind of a [`FieldIssue`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldProblem {
    /// A required field is absent from every source.
    Missing,
    /// The field is present but cannot be coerced to the expected type.
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
}

impl FieldIssue {
    /// Creates a missing field issue.
    pub fn missing(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            problem: FieldProblem::Missing,
        }
    }

    /// Creates a type mismatch issue.
    pub fn wrong_type(field: impl Into<String>, expected: &'static str, found: &'static str) -> Self {
        Self {
            field: field.into(),
            problem: FieldProblem::WrongType { expected, found },
        }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            FieldProblem::Missing => write!(f, "missing required field {}", self.field),
            FieldProblem::WrongType { expected, found } => {
                write!(f, "field {} expected {expected}, found {found}", self.field)
            }
        }
    }
}

struct FieldIssues<'a>(&'a [FieldIssue]);

impl fmt::Display for FieldIssues<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_validation_lists_every_issue() {
        let err = ConfigError::SchemaValidation {
            issues: vec![
                FieldIssue::missing("NATS_URL"),
                FieldIssue::wrong_type("dev", "boolean", "list"),
            ],
        };

        assert_eq!(
            err.to_string(),
            "Invalid configuration: missing required field NATS_URL; \
             field dev expected boolean, found list"
        );
    }

    #[test]
    fn test_malformed_is_not_informational() {
        assert!(!ConfigError::malformed("bar").is_informational());
    }
}
