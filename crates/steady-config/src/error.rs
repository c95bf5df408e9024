//! Error types for configuration loading and feature resolution.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("project root not found: {0}")]
    RootNotFound(PathBuf),

    #[error("invalid config value for `{field}`: {hint}")]
    InvalidValue { field: String, hint: String },

    /// Two experimental flags that cannot be combined. Fatal at startup.
    #[error("{flag} requires {requires} to be enabled")]
    Conflict {
        flag: &'static str,
        requires: &'static str,
    },

    #[error("failed to extract configuration: {0}")]
    Extract(#[from] Box<figment::Error>),

    /// The working directory needed to absolutize a relative root.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        ConfigError::Extract(Box::new(err))
    }
}
