//! The seam between this crate and the bundler it wraps.
//!
//! The bundler owns dependency resolution, the graph and the transform
//! pipeline. This crate only needs the three operations below; everything
//! deterministic about module IDs and update messages happens on our side
//! of the trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use steady_graph::{Delta, Dependency, Revision, RevisionId, TransformOptions};

use crate::error::BundlerError;

/// Result of recomputing a graph.
#[derive(Debug, Clone)]
pub struct GraphUpdate {
    /// The new revision. May be an existing one when nothing changed.
    pub revision: Revision,
    /// Changes from the revision passed to `update_graph`.
    pub delta: Delta,
}

/// Output of a single file transform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformOutput {
    pub code: String,
    pub dependencies: Vec<Dependency>,
}

#[async_trait]
pub trait BundlerCore: Send + Sync + 'static {
    /// Look up a revision. `Ok(None)` means it was evicted or never existed.
    async fn get_revision(&self, id: &RevisionId) -> Result<Option<Revision>, BundlerError>;

    /// Recompute the graph of `revision` against the current file system.
    ///
    /// `reset` asks for a delta containing every module.
    async fn update_graph(&self, revision: Revision, reset: bool)
    -> Result<GraphUpdate, BundlerError>;

    /// Transform one file. Options arrive already normalized.
    async fn transform_file(
        &self,
        path: &str,
        options: &TransformOptions,
    ) -> Result<TransformOutput, BundlerError>;
}
