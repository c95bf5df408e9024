//! Deterministic, context-scoped numeric module IDs.

use std::fmt;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::options::TransformOptions;

/// Numeric module identifier emitted into bundles and HMR updates.
///
/// Only uniqueness and stability within one server lifetime are
/// guaranteed; the magnitude carries no meaning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(u32);

impl ModuleId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Scope in which module IDs are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleIdContext {
    pub platform: Option<String>,
    pub environment: Option<String>,
}

impl ModuleIdContext {
    pub fn new(platform: Option<&str>, environment: Option<&str>) -> Self {
        Self {
            platform: platform.map(str::to_owned),
            environment: environment.map(str::to_owned),
        }
    }

    /// Context of a graph built with `options`.
    pub fn from_transform_options(options: &TransformOptions) -> Self {
        Self::new(options.platform.as_deref(), options.environment())
    }
}

impl fmt::Display for ModuleIdContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}",
            self.platform.as_deref().unwrap_or("*"),
            self.environment.as_deref().unwrap_or("*")
        )
    }
}

#[derive(Debug, Default)]
struct ContextIds {
    ids: FxHashMap<String, ModuleId>,
    next: u32,
}

impl ContextIds {
    fn assign(&mut self, path: &str) -> ModuleId {
        if let Some(id) = self.ids.get(path) {
            return *id;
        }
        let id = ModuleId(self.next);
        self.next += 1;
        self.ids.insert(path.to_owned(), id);
        id
    }
}

/// Append-only map from `(context, path)` to [`ModuleId`].
///
/// One registry belongs to one server instance and lives as long as it
/// does. The lock is only held for synchronous lookups and inserts, never
/// across an await point.
#[derive(Debug, Default)]
pub struct ModuleIdRegistry {
    contexts: Mutex<FxHashMap<ModuleIdContext, ContextIds>>,
}

impl ModuleIdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the ID for `path` in `context`, allocating the next unused one
    /// on first sight.
    ///
    /// # Example
    ///
    /// ```
    /// use steady_graph::{ModuleId, ModuleIdContext, ModuleIdRegistry};
    ///
    /// let registry = ModuleIdRegistry::new();
    /// let ios = ModuleIdContext::new(Some("ios"), None);
    ///
    /// assert_eq!(registry.assign_id("/a.js", &ios), ModuleId::new(0));
    /// assert_eq!(registry.assign_id("/b.js", &ios), ModuleId::new(1));
    /// assert_eq!(registry.assign_id("/a.js", &ios), ModuleId::new(0));
    /// ```
    pub fn assign_id(&self, path: &str, context: &ModuleIdContext) -> ModuleId {
        let mut contexts = self.contexts.lock();
        match contexts.get_mut(context) {
            Some(ids) => ids.assign(path),
            None => contexts.entry(context.clone()).or_default().assign(path),
        }
    }

    /// Assign IDs for many paths under a single lock acquisition, in order.
    pub fn assign_ids<'a, I>(&self, paths: I, context: &ModuleIdContext) -> Vec<ModuleId>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut contexts = self.contexts.lock();
        let ids = contexts.entry(context.clone()).or_default();
        paths.into_iter().map(|path| ids.assign(path)).collect()
    }

    /// Look up an ID without allocating one.
    pub fn get(&self, path: &str, context: &ModuleIdContext) -> Option<ModuleId> {
        self.contexts
            .lock()
            .get(context)
            .and_then(|ids| ids.ids.get(path).copied())
    }

    /// Number of IDs allocated in `context`.
    pub fn len(&self, context: &ModuleIdContext) -> usize {
        self.contexts
            .lock()
            .get(context)
            .map_or(0, |ids| ids.ids.len())
    }

    pub fn is_empty(&self, context: &ModuleIdContext) -> bool {
        self.len(context) == 0
    }

    /// Number of contexts that have allocated at least one ID.
    pub fn context_count(&self) -> usize {
        self.contexts.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ios() -> ModuleIdContext {
        ModuleIdContext::new(Some("ios"), None)
    }

    fn android() -> ModuleIdContext {
        ModuleIdContext::new(Some("android"), None)
    }

    #[test]
    fn contexts_are_independent_namespaces() {
        let registry = ModuleIdRegistry::new();

        assert_eq!(registry.assign_id("/a.js", &ios()), ModuleId::new(0));
        assert_eq!(registry.assign_id("/b.js", &ios()), ModuleId::new(1));
        assert_eq!(registry.assign_id("/a.js", &android()), ModuleId::new(0));
        assert_eq!(registry.assign_id("/b.js", &android()), ModuleId::new(1));
        assert_eq!(registry.context_count(), 2);
    }

    #[test]
    fn environment_is_part_of_the_context() {
        let registry = ModuleIdRegistry::new();
        let client = ModuleIdContext::new(Some("web"), Some("client"));
        let server = ModuleIdContext::new(Some("web"), Some("react-server"));

        registry.assign_id("/other.js", &client);
        assert_eq!(registry.assign_id("/a.js", &client), ModuleId::new(1));
        assert_eq!(registry.assign_id("/a.js", &server), ModuleId::new(0));
    }

    #[test]
    fn ids_are_stable_across_interleaved_assignments() {
        let registry = ModuleIdRegistry::new();
        let first = registry.assign_id("/a.js", &ios());
        registry.assign_id("/b.js", &ios());
        registry.assign_id("/a.js", &android());
        registry.assign_id("/c.js", &ios());
        assert_eq!(registry.assign_id("/a.js", &ios()), first);
    }

    #[test]
    fn get_does_not_allocate() {
        let registry = ModuleIdRegistry::new();
        assert!(registry.get("/a.js", &ios()).is_none());
        assert!(registry.is_empty(&ios()));

        registry.assign_id("/a.js", &ios());
        assert_eq!(registry.get("/a.js", &ios()), Some(ModuleId::new(0)));
        assert_eq!(registry.len(&ios()), 1);
    }

    #[test]
    fn assign_ids_matches_sequential_assignment() {
        let registry = ModuleIdRegistry::new();
        registry.assign_id("/b.js", &ios());

        let ids = registry.assign_ids(["/a.js", "/b.js", "/c.js", "/a.js"], &ios());
        assert_eq!(
            ids,
            [1, 0, 2, 1].map(ModuleId::new).to_vec()
        );
    }

    #[test]
    fn context_from_transform_options() {
        let options = TransformOptions::for_platform("ios").with_environment("node");
        let context = ModuleIdContext::from_transform_options(&options);
        assert_eq!(context, ModuleIdContext::new(Some("ios"), Some("node")));
        assert_eq!(context.to_string(), "ios/node");
        assert_eq!(ModuleIdContext::default().to_string(), "*/*");
    }
}
