//! In-memory bundler core and helpers shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use steady_config::{ResolvedConfig, ServerConfig};
use steady_graph::{Delta, Graph, Revision, RevisionId, TransformOptions};
use steady_server::{
    BundlerCore, BundlerError, GraphUpdate, Reporter, ReporterEvent, TransformOutput,
};

#[derive(Default)]
struct State {
    revisions: HashMap<RevisionId, Revision>,
    next_revision: u64,
    staged: Option<Graph>,
    /// Revision the next `update_graph` call resolves to instead of a new one.
    staged_revision: Option<RevisionId>,
    fail_next: Option<BundlerError>,
    transforms: Vec<(String, TransformOptions)>,
}

/// Bundler core backed by explicitly staged graphs.
///
/// `update_graph` diffs the revision's graph against the staged graph (or
/// against itself when nothing is staged) and stores the result as a new
/// revision with the next numeric ID.
#[derive(Default)]
pub struct MemoryBundler {
    state: Mutex<State>,
    yield_on_update: AtomicBool,
}

impl MemoryBundler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_revision(&self, graph: Graph) -> RevisionId {
        let mut state = self.state.lock();
        store(&mut state, graph)
    }

    /// Graph returned by the next `update_graph` call.
    pub fn stage(&self, graph: Graph) {
        self.state.lock().staged = Some(graph);
    }

    /// Make the next `update_graph` call land on an existing revision.
    pub fn stage_revision(&self, id: RevisionId) {
        self.state.lock().staged_revision = Some(id);
    }

    /// Suspend once inside every `update_graph` call so concurrent updates
    /// interleave.
    pub fn yield_on_update(&self) {
        self.yield_on_update.store(true, Ordering::SeqCst);
    }

    pub fn fail_next(&self, error: BundlerError) {
        self.state.lock().fail_next = Some(error);
    }

    pub fn evict(&self, id: &RevisionId) {
        self.state.lock().revisions.remove(id);
    }

    pub fn transform_calls(&self) -> Vec<(String, TransformOptions)> {
        self.state.lock().transforms.clone()
    }
}

fn store(state: &mut State, graph: Graph) -> RevisionId {
    state.next_revision += 1;
    let revision = Revision::new(RevisionId::new(state.next_revision.to_string()), graph);
    let id = revision.id.clone();
    state.revisions.insert(id.clone(), revision);
    id
}

#[async_trait]
impl BundlerCore for MemoryBundler {
    async fn get_revision(&self, id: &RevisionId) -> Result<Option<Revision>, BundlerError> {
        Ok(self.state.lock().revisions.get(id).cloned())
    }

    async fn update_graph(
        &self,
        revision: Revision,
        reset: bool,
    ) -> Result<GraphUpdate, BundlerError> {
        if self.yield_on_update.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }

        let mut state = self.state.lock();
        if let Some(error) = state.fail_next.take() {
            return Err(error);
        }

        if let Some(id) = state.staged_revision.take() {
            let target = state
                .revisions
                .get(&id)
                .cloned()
                .ok_or_else(|| BundlerError::Internal(format!("unknown revision {id}")))?;
            let delta = Delta::between(&revision.graph, &target.graph);
            return Ok(GraphUpdate {
                revision: target,
                delta,
            });
        }

        let next = state
            .staged
            .take()
            .unwrap_or_else(|| (*revision.graph).clone());
        let delta = if reset {
            Delta::between(&Graph::default(), &next)
        } else {
            Delta::between(&revision.graph, &next)
        };

        let id = store(&mut state, next);
        let revision = state.revisions[&id].clone();
        Ok(GraphUpdate { revision, delta })
    }

    async fn transform_file(
        &self,
        path: &str,
        options: &TransformOptions,
    ) -> Result<TransformOutput, BundlerError> {
        self.state
            .lock()
            .transforms
            .push((path.to_string(), options.clone()));
        Ok(TransformOutput {
            code: format!("// transformed {path}"),
            dependencies: Vec::new(),
        })
    }
}

/// Reporter that keeps every event.
#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<ReporterEvent>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<ReporterEvent> {
        self.events.lock().clone()
    }

    pub fn bundling_errors(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, ReporterEvent::BundlingError(_)))
            .count()
    }
}

impl Reporter for RecordingReporter {
    fn update(&self, event: &ReporterEvent) {
        self.events.lock().push(event.clone());
    }
}

pub fn config() -> ResolvedConfig {
    let config = ServerConfig {
        project_root: PathBuf::from("/app"),
        ci: true,
        ..ServerConfig::default()
    };
    config.resolve().expect("default config resolves")
}

/// Resolved config with `[hmr] lazy = true`.
pub fn lazy_config() -> ResolvedConfig {
    let mut config = ServerConfig {
        project_root: PathBuf::from("/app"),
        ci: true,
        ..ServerConfig::default()
    };
    config.hmr.lazy = true;
    config.resolve().expect("lazy config resolves")
}

pub fn reporter() -> Arc<RecordingReporter> {
    Arc::new(RecordingReporter::default())
}

pub const CLIENT_URL: &str = "http://localhost:8081/index.bundle?platform=ios&dev=true";
