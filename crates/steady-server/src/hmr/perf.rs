use std::sync::Arc;
use std::time::Instant;

/// Timing points recorded while handling one file change.
pub trait PerfLogger: Send + Sync {
    fn point(&self, name: &str);
}

/// Logs each point with the time since the change was observed.
#[derive(Debug)]
pub struct TracingPerfLogger {
    started: Instant,
}

impl TracingPerfLogger {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }
}

impl Default for TracingPerfLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl PerfLogger for TracingPerfLogger {
    fn point(&self, name: &str) {
        tracing::debug!(
            point = name,
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "hmr perf"
        );
    }
}

/// A file system change, as delivered to the coordinator.
#[derive(Clone, Default)]
pub struct ChangeEvent {
    /// Absolute paths, in first-seen order.
    pub changed_paths: Vec<String>,
    /// Receives perf points for non-initial updates.
    pub logger: Option<Arc<dyn PerfLogger>>,
}

impl ChangeEvent {
    pub fn new(changed_paths: Vec<String>) -> Self {
        Self {
            changed_paths,
            logger: None,
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn PerfLogger>) -> Self {
        self.logger = Some(logger);
        self
    }
}

impl std::fmt::Debug for ChangeEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeEvent")
            .field("changed_paths", &self.changed_paths)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}
