//! # steady-graph
//!
//! Module graph model and the deterministic pieces layered on top of a
//! bundler's graph:
//!
//! - [`normalize`]: strips per-file transform options that a file never
//!   reads, so the transform cache is not fragmented.
//! - [`transform_cache_key`]: BLAKE3 key over a path and its normalized
//!   options.
//! - [`ModuleIdRegistry`]: stable numeric module IDs scoped to a
//!   `(platform, environment)` [`ModuleIdContext`].
//! - [`sorted_modules`]: a graph's modules in ID order, for reproducible
//!   bundles and source maps.
//!
//! ```
//! use steady_graph::{Graph, Module, ModuleIdRegistry, TransformOptions, sorted_modules};
//!
//! let registry = ModuleIdRegistry::new();
//! let graph = Graph::new(TransformOptions::for_platform("ios"))
//!     .with_module(Module::builder("/app/index.js").dependency("./a", "/app/a.js").build())
//!     .with_module(Module::builder("/app/a.js").build());
//!
//! let order: Vec<_> = sorted_modules(&graph, &registry)
//!     .iter()
//!     .map(|m| m.path.clone())
//!     .collect();
//! assert_eq!(order, ["/app/index.js", "/app/a.js"]);
//! ```

pub mod cache_key;
pub mod error;
pub mod module;
pub mod module_id;
pub mod normalize;
pub mod options;
pub mod revision;
pub mod sorted;

pub use cache_key::{CacheKey, normalized_cache_key, transform_cache_key};
pub use error::{GraphError, Result};
pub use module::{Dependency, Graph, Module, ModuleBuilder};
pub use module_id::{ModuleId, ModuleIdContext, ModuleIdRegistry};
pub use normalize::{DEFAULT_DOM, DEFAULT_ROUTER_ROOT, canonical_separators, normalize, normalize_in_place};
pub use options::{CustomTransformOptions, TransformOptions};
pub use revision::{Delta, Revision, RevisionId};
pub use sorted::{sorted_modules, sorted_modules_with_ids};
