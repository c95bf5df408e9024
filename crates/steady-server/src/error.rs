//! Error types for the server layer.
//!
//! - [`BundlerError`] is what a [`crate::BundlerCore`] reports.
//! - [`HmrError`] is a failed update attempt for one client group. It is
//!   always turned into an error message for that group, never propagated
//!   further.
//! - [`ServerError`] covers startup and direct API calls.

use std::path::PathBuf;

use steady_config::ConfigError;
use steady_graph::{GraphError, RevisionId};
use thiserror::Error;

use crate::hmr::ClientId;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Failures reported by the wrapped bundler.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BundlerError {
    /// A module failed to transform, e.g. a syntax error.
    #[error("{path}: {message}")]
    Transform { path: String, message: String },

    /// An import specifier did not resolve to a file.
    #[error("Unable to resolve module {specifier} from {from}")]
    Resolution { from: String, specifier: String },

    /// Anything else the bundler failed at.
    #[error("{0}")]
    Internal(String),
}

/// A single failed HMR update attempt.
#[derive(Debug, Error)]
pub enum HmrError {
    /// The revision the group is keyed under no longer exists upstream.
    #[error("The revision `{0}` was not found.")]
    RevisionNotFound(RevisionId),

    /// No client group is keyed under this revision.
    #[error("No client group is registered for revision `{0}`.")]
    ClientGroupNotFound(RevisionId),

    /// The client disconnected before registering an entry point.
    #[error("Client `{0}` is not connected.")]
    ClientNotFound(ClientId),

    #[error(transparent)]
    Bundler(#[from] BundlerError),

    /// The update payload could not be encoded as JSON.
    #[error("failed to serialize update: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for HmrError {
    fn from(err: serde_json::Error) -> Self {
        HmrError::Serialization(err.to_string())
    }
}

/// Top-level server error type.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Bundler error: {0}")]
    Bundler(#[from] BundlerError),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),
}
