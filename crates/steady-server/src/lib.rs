//! # steady-server
//!
//! Deterministic layer on top of a bundler dev server. The bundler itself
//! sits behind [`BundlerCore`]; this crate adds
//!
//! - transform option normalization ahead of every transform,
//! - stable module IDs shared by bundles and HMR updates,
//! - ID-ordered module serialization,
//! - an HMR coordinator that keys client groups by revision.
//!
//! ## Logging
//!
//! The crate only emits `tracing` events. Enable the `logging` feature for
//! [`logging::init_logging`].

pub mod bundler;
pub mod error;
pub mod format;
pub mod hmr;
pub mod reporter;
pub mod server;
pub mod watcher;

#[cfg(feature = "logging")]
pub mod logging;

pub use bundler::{BundlerCore, GraphUpdate, TransformOutput};
pub use error::{BundlerError, HmrError, Result, ServerError};
pub use format::{ErrorDescription, FormattedError, format_bundling_error};
pub use hmr::{
    ChangeEvent, ClientGroup, ClientId, GraphOptions, HmrCoordinator, HmrModule, HmrUpdate,
    Message, PerfLogger, TracingPerfLogger, UpdateBody, UpdateOptions,
};
pub use reporter::{Reporter, ReporterEvent, TracingReporter};
pub use server::{DeterministicServer, TransformedFile};
pub use watcher::{FileChange, FileWatcher};

pub use steady_config as config;
pub use steady_graph as graph;
