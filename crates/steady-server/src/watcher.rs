//! File system watcher feeding the HMR coordinator.
//!
//! Raw notify events pass through [`IgnoreRules`] and a per-path
//! [`Debouncer`] before reaching the change loop, which batches whatever
//! arrives close together into one [`ChangeEvent`].

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;

use crate::bundler::BundlerCore;
use crate::error::{Result, ServerError};
use crate::hmr::{ChangeEvent, HmrCoordinator, TracingPerfLogger};

/// A change to one file under the watched root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    /// Contents or metadata changed.
    Modified(PathBuf),
    /// The file appeared.
    Created(PathBuf),
    /// The file was deleted or moved away.
    Removed(PathBuf),
}

impl FileChange {
    fn from_kind(kind: &EventKind, path: PathBuf) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(FileChange::Created(path)),
            EventKind::Modify(_) => Some(FileChange::Modified(path)),
            EventKind::Remove(_) => Some(FileChange::Removed(path)),
            _ => None,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            FileChange::Modified(p) | FileChange::Created(p) | FileChange::Removed(p) => p,
        }
    }
}

/// Which paths under a root are not worth a rebuild.
///
/// A pattern is either `*.ext`, matched against the end of the file name,
/// or a name matched against whole path components. Hidden components and
/// paths outside the root are always ignored.
#[derive(Debug, Clone)]
pub struct IgnoreRules {
    root: PathBuf,
    suffixes: Vec<String>,
    names: Vec<String>,
}

impl IgnoreRules {
    pub fn new(root: PathBuf, patterns: &[String]) -> Self {
        let mut suffixes = Vec::new();
        let mut names = Vec::new();
        for pattern in patterns {
            match pattern.strip_prefix('*') {
                Some(suffix) => suffixes.push(suffix.to_string()),
                None => names.push(pattern.trim_matches('/').to_string()),
            }
        }
        Self {
            root,
            suffixes,
            names,
        }
    }

    pub fn is_ignored(&self, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(&self.root) else {
            return true;
        };

        let file_name = relative
            .file_name()
            .map(|name| name.to_string_lossy())
            .unwrap_or_default();
        if self
            .suffixes
            .iter()
            .any(|suffix| file_name.ends_with(suffix.as_str()))
        {
            return true;
        }

        relative.components().any(|component| {
            let Component::Normal(name) = component else {
                return false;
            };
            let name = name.to_string_lossy();
            name.starts_with('.') || self.names.iter().any(|ignored| *ignored == name)
        })
    }
}

/// Drops repeat events for a path seen within the window.
///
/// Each path is tracked on its own, so interleaved saves of two files are
/// both delivered. Entries older than the window are pruned as new events
/// arrive.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    seen: FxHashMap<PathBuf, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: FxHashMap::default(),
        }
    }

    /// Whether an event for `path` at `now` should be delivered.
    pub fn admit(&mut self, path: &Path, now: Instant) -> bool {
        let window = self.window;
        self.seen
            .retain(|_, last| now.saturating_duration_since(*last) < window);

        if self.seen.contains_key(path) {
            return false;
        }
        self.seen.insert(path.to_path_buf(), now);
        true
    }

    pub fn tracked(&self) -> usize {
        self.seen.len()
    }
}

/// Recursive watcher over the project root. Stops when dropped.
pub struct FileWatcher {
    _watcher: RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    /// Start watching `root`, sending changes that survive `ignore` and a
    /// `debounce_ms` per-path debounce.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::FileNotFound`] when `root` does not exist and
    /// [`ServerError::Watch`] when the platform watcher cannot be started.
    pub fn new(
        root: PathBuf,
        ignore: Vec<String>,
        debounce_ms: u64,
    ) -> Result<(Self, mpsc::Receiver<FileChange>)> {
        if !root.exists() {
            return Err(ServerError::FileNotFound(root));
        }

        let (tx, rx) = mpsc::channel(100);
        let rules = IgnoreRules::new(root.clone(), &ignore);
        let mut debouncer = Debouncer::new(Duration::from_millis(debounce_ms));

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let event = match res {
                Ok(event) => event,
                Err(err) => {
                    tracing::warn!(error = %err, "file watcher error");
                    return;
                }
            };

            let now = Instant::now();
            for path in event.paths {
                if rules.is_ignored(&path) || !debouncer.admit(&path, now) {
                    continue;
                }
                let Some(change) = FileChange::from_kind(&event.kind, path) else {
                    continue;
                };
                if tx.blocking_send(change).is_err() {
                    tracing::trace!("change loop gone, dropping file event");
                    return;
                }
            }
        })?;

        watcher.watch(&root, RecursiveMode::Recursive)?;
        tracing::debug!(root = %root.display(), debounce_ms, "watching for changes");

        Ok((
            Self {
                _watcher: watcher,
                root,
            },
            rx,
        ))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Collect changes that arrive within `window` of each other into one
/// batch of distinct paths. Returns `None` once the channel is closed and
/// drained.
pub async fn next_batch(
    changes: &mut mpsc::Receiver<FileChange>,
    window: Duration,
) -> Option<Vec<String>> {
    let first = changes.recv().await?;
    let mut paths = vec![first.path().to_string_lossy().into_owned()];

    while let Ok(Some(change)) = tokio::time::timeout(window, changes.recv()).await {
        let path = change.path().to_string_lossy().into_owned();
        if !paths.contains(&path) {
            paths.push(path);
        }
    }
    Some(paths)
}

/// Deliver every batch of changes to the coordinator until the channel
/// closes.
pub async fn run_change_loop<B: BundlerCore>(
    coordinator: Arc<HmrCoordinator<B>>,
    mut changes: mpsc::Receiver<FileChange>,
    window: Duration,
) {
    while let Some(paths) = next_batch(&mut changes, window).await {
        let event = ChangeEvent::new(paths).with_logger(Arc::new(TracingPerfLogger::new()));
        coordinator.on_change(&event).await;
    }
    tracing::debug!("change loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules(patterns: &[&str]) -> IgnoreRules {
        let patterns: Vec<String> = patterns.iter().map(|p| p.to_string()).collect();
        IgnoreRules::new(PathBuf::from("/app"), &patterns)
    }

    #[test]
    fn interleaved_paths_are_debounced_separately() {
        let mut debouncer = Debouncer::new(Duration::from_millis(100));
        let start = Instant::now();
        let a = Path::new("/app/a.js");
        let b = Path::new("/app/b.js");

        assert!(debouncer.admit(a, start));
        assert!(debouncer.admit(b, start + Duration::from_millis(10)));
        assert!(!debouncer.admit(a, start + Duration::from_millis(20)));
        assert!(!debouncer.admit(b, start + Duration::from_millis(30)));
        assert!(debouncer.admit(a, start + Duration::from_millis(150)));
    }

    #[test]
    fn expired_paths_are_pruned() {
        let mut debouncer = Debouncer::new(Duration::from_millis(50));
        let start = Instant::now();
        for i in 0..10 {
            assert!(debouncer.admit(&PathBuf::from(format!("/app/{i}.js")), start));
        }
        assert_eq!(debouncer.tracked(), 10);

        assert!(debouncer.admit(Path::new("/app/late.js"), start + Duration::from_millis(60)));
        assert_eq!(debouncer.tracked(), 1);
    }

    #[test]
    fn names_match_whole_components() {
        let rules = rules(&["dist", "node_modules/"]);

        assert!(rules.is_ignored(Path::new("/app/dist/index.js")));
        assert!(rules.is_ignored(Path::new("/app/packages/ui/node_modules/react/index.js")));
        assert!(!rules.is_ignored(Path::new("/app/distribution.js")));
        assert!(!rules.is_ignored(Path::new("/app/src/dist-utils/a.js")));
    }

    #[test]
    fn suffixes_match_file_names() {
        let rules = rules(&["*.log"]);

        assert!(rules.is_ignored(Path::new("/app/logs/metro.log")));
        assert!(!rules.is_ignored(Path::new("/app/app.log/index.tsx")));
    }

    #[test]
    fn hidden_and_foreign_paths_are_ignored() {
        let rules = rules(&[]);

        assert!(rules.is_ignored(Path::new("/app/.expo/state.json")));
        assert!(rules.is_ignored(Path::new("/app/src/.index.js.swp")));
        assert!(rules.is_ignored(Path::new("/elsewhere/index.js")));
        assert!(!rules.is_ignored(Path::new("/app/src/index.js")));
    }

    #[test]
    fn only_file_event_kinds_become_changes() {
        use notify::event::{AccessKind, CreateKind, RemoveKind};

        let path = PathBuf::from("/app/a.js");
        assert_eq!(
            FileChange::from_kind(&EventKind::Create(CreateKind::File), path.clone()),
            Some(FileChange::Created(path.clone()))
        );
        assert_eq!(
            FileChange::from_kind(&EventKind::Remove(RemoveKind::File), path.clone()),
            Some(FileChange::Removed(path.clone()))
        );
        assert_eq!(
            FileChange::from_kind(&EventKind::Access(AccessKind::Read), path),
            None
        );
    }

    #[test]
    fn missing_root_is_rejected() {
        let result = FileWatcher::new(PathBuf::from("/definitely/not/a/project"), vec![], 50);
        assert!(matches!(result, Err(ServerError::FileNotFound(_))));
    }

    #[tokio::test]
    async fn batches_keep_first_arrival_order() {
        let (tx, mut rx) = mpsc::channel(8);
        tx.send(FileChange::Modified("/app/b.js".into())).await.unwrap();
        tx.send(FileChange::Removed("/app/a.js".into())).await.unwrap();
        tx.send(FileChange::Modified("/app/b.js".into())).await.unwrap();
        drop(tx);

        let batch = next_batch(&mut rx, Duration::from_millis(10)).await.unwrap();
        assert_eq!(batch, ["/app/b.js", "/app/a.js"]);
        assert!(next_batch(&mut rx, Duration::from_millis(10)).await.is_none());
    }
}
