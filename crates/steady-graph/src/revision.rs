use std::fmt;
use std::sync::Arc;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

use crate::module::{Graph, Module};

/// Opaque revision identifier issued by the bundler core.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RevisionId(String);

impl RevisionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RevisionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// A versioned graph snapshot.
#[derive(Debug, Clone)]
pub struct Revision {
    pub id: RevisionId,
    pub graph: Arc<Graph>,
}

impl Revision {
    pub fn new(id: impl Into<RevisionId>, graph: Graph) -> Self {
        Self {
            id: id.into(),
            graph: Arc::new(graph),
        }
    }
}

/// Changes between two revisions.
#[derive(Debug, Clone, Default)]
pub struct Delta {
    pub added: IndexMap<String, Arc<Module>>,
    pub modified: IndexMap<String, Arc<Module>>,
    pub deleted: IndexSet<String>,
    /// True when the client must discard its state and load everything.
    pub reset: bool,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }

    /// Compute the delta that turns `previous` into `next`.
    ///
    /// Modules present in both graphs count as modified when they differ.
    pub fn between(previous: &Graph, next: &Graph) -> Self {
        let mut delta = Delta::default();

        for (path, module) in &next.dependencies {
            match previous.dependencies.get(path) {
                None => {
                    delta.added.insert(path.clone(), Arc::clone(module));
                }
                Some(old) if old != module => {
                    delta.modified.insert(path.clone(), Arc::clone(module));
                }
                Some(_) => {}
            }
        }

        for path in previous.dependencies.keys() {
            if !next.dependencies.contains_key(path) {
                delta.deleted.insert(path.clone());
            }
        }

        delta
    }
}
