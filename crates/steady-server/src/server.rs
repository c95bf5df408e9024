//! The deterministic dev server facade.

use std::sync::Arc;
use std::time::Duration;

use steady_config::ResolvedConfig;
use steady_graph::{
    CacheKey, Graph, Module, ModuleId, ModuleIdContext, ModuleIdRegistry, RevisionId,
    TransformOptions, normalize, normalized_cache_key, sorted_modules,
};
use tokio::task::JoinHandle;

use crate::bundler::{BundlerCore, TransformOutput};
use crate::error::Result;
use crate::hmr::{ChangeEvent, GraphOptions, HmrCoordinator, Message, UpdateOptions};
use crate::reporter::{Reporter, TracingReporter};
use crate::watcher::{FileWatcher, run_change_loop};

/// A transformed file together with the cache key it was stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformedFile {
    pub cache_key: CacheKey,
    pub output: TransformOutput,
}

/// Wraps a [`BundlerCore`] and owns every piece of state that makes its
/// output reproducible: the module ID registry, normalized transform
/// options and the HMR client groups.
pub struct DeterministicServer<B: BundlerCore> {
    bundler: Arc<B>,
    registry: Arc<ModuleIdRegistry>,
    config: ResolvedConfig,
    coordinator: Arc<HmrCoordinator<B>>,
}

impl<B: BundlerCore> DeterministicServer<B> {
    pub fn new(bundler: B, config: ResolvedConfig) -> Self {
        Self::with_reporter(bundler, config, Arc::new(TracingReporter))
    }

    pub fn with_reporter(bundler: B, config: ResolvedConfig, reporter: Arc<dyn Reporter>) -> Self {
        let bundler = Arc::new(bundler);
        let registry = Arc::new(ModuleIdRegistry::new());
        let coordinator = Arc::new(
            HmrCoordinator::new(
                Arc::clone(&bundler),
                Arc::clone(&registry),
                reporter,
                config.project_root.clone(),
                config.server_root.clone(),
            )
            .with_default_graph_options(GraphOptions { lazy: config.lazy }),
        );

        tracing::info!(
            project_root = %config.project_root.display(),
            server_root = %config.server_root.display(),
            watch = config.watch,
            "deterministic server ready"
        );

        Self {
            bundler,
            registry,
            config,
            coordinator,
        }
    }

    /// Transform one file with its options normalized first, so files that
    /// ignore a per-file option share one cache entry.
    pub async fn transform_file(
        &self,
        path: &str,
        options: &TransformOptions,
    ) -> Result<TransformedFile> {
        let normalized = normalize(path, options);
        let cache_key = normalized_cache_key(path, &normalized)?;
        tracing::trace!(path, key = %cache_key, "transform");

        let output = self.bundler.transform_file(path, &normalized).await?;
        Ok(TransformedFile { cache_key, output })
    }

    /// Modules of `graph` in ascending ID order.
    pub fn sorted_modules(&self, graph: &Graph) -> Vec<Arc<Module>> {
        sorted_modules(graph, &self.registry)
    }

    /// ID of `path` in `context`, assigning one on first sight.
    pub fn create_module_id(&self, path: &str, context: &ModuleIdContext) -> ModuleId {
        self.registry.assign_id(path, context)
    }

    /// See [`HmrCoordinator::prepare_update`].
    pub async fn prepare_update(
        &self,
        revision_id: &RevisionId,
        options: UpdateOptions,
        change_event: Option<&ChangeEvent>,
    ) -> Message {
        self.coordinator
            .prepare_update(revision_id, options, change_event)
            .await
    }

    /// Start the file watcher and the change loop when watching is enabled.
    ///
    /// Returns `None` when watching is disabled (CI or export). The watcher
    /// stops when the returned value is dropped.
    pub fn watch(&self) -> Result<Option<(FileWatcher, JoinHandle<()>)>> {
        if !self.config.watch {
            return Ok(None);
        }

        let (watcher, changes) = FileWatcher::new(
            self.config.project_root.clone(),
            self.config.ignore.clone(),
            self.config.debounce_ms,
        )?;
        let handle = tokio::spawn(run_change_loop(
            Arc::clone(&self.coordinator),
            changes,
            Duration::from_millis(self.config.debounce_ms),
        ));
        Ok(Some((watcher, handle)))
    }

    pub fn coordinator(&self) -> &Arc<HmrCoordinator<B>> {
        &self.coordinator
    }

    pub fn registry(&self) -> &Arc<ModuleIdRegistry> {
        &self.registry
    }

    pub fn bundler(&self) -> &Arc<B> {
        &self.bundler
    }

    pub fn config(&self) -> &ResolvedConfig {
        &self.config
    }
}
