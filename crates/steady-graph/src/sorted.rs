use std::sync::Arc;

use crate::module::{Graph, Module};
use crate::module_id::{ModuleId, ModuleIdContext, ModuleIdRegistry};

/// Modules of `graph` in ascending module ID order.
///
/// Every module gets an ID first, so modules seen for the first time are
/// numbered in graph order. The result is what bundles and source maps
/// must be serialized from: two calls on the same module set return the
/// same order no matter how the graph stores its modules.
pub fn sorted_modules(graph: &Graph, registry: &ModuleIdRegistry) -> Vec<Arc<Module>> {
    sorted_modules_with_ids(graph, registry)
        .into_iter()
        .map(|(_, module)| module)
        .collect()
}

/// Like [`sorted_modules`], keeping each module's ID alongside it.
pub fn sorted_modules_with_ids(
    graph: &Graph,
    registry: &ModuleIdRegistry,
) -> Vec<(ModuleId, Arc<Module>)> {
    let context = ModuleIdContext::from_transform_options(&graph.transform_options);
    let ids = registry.assign_ids(graph.dependencies.keys().map(String::as_str), &context);

    let mut modules: Vec<_> = ids
        .into_iter()
        .zip(graph.dependencies.values().cloned())
        .collect();
    // IDs are unique per context, so an unstable sort is exact.
    modules.sort_unstable_by_key(|(id, _)| *id);

    tracing::trace!(
        context = %context,
        modules = modules.len(),
        "sorted graph modules by id"
    );
    modules
}
