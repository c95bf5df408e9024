//! Serializes a graph delta into HMR module payloads.
//!
//! Module IDs come exclusively from the `create_module_id` callback, which
//! the coordinator binds to the server's registry, so update payloads use
//! the same numbering as the initial bundle.

use std::collections::{BTreeMap, VecDeque};
use std::path::Path;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use steady_graph::{Delta, Graph, Module, ModuleId, canonical_separators};

use crate::error::HmrError;
use crate::hmr::message::{HmrModule, HmrUpdate};

/// Query parameter dropped from source URLs.
const EXCLUDE_SOURCE_PARAM: &str = "excludeSource";

#[derive(Debug, Clone, Copy)]
pub struct HmrBundleOptions<'a> {
    /// URL the client loaded its bundle from.
    pub client_url: &'a str,
    /// Attach bundle URLs for `import()` dependencies (lazy bundling).
    pub include_async_paths: bool,
    pub project_root: &'a Path,
    pub server_root: &'a Path,
}

/// Build the added/modified/deleted payloads of one update.
///
/// Added and modified modules are emitted in ascending ID order; deleted
/// IDs are sorted as well.
pub fn hmr_bundle<F>(
    delta: &Delta,
    graph: &Graph,
    options: &HmrBundleOptions<'_>,
    create_module_id: F,
) -> Result<HmrUpdate, HmrError>
where
    F: Fn(&str) -> ModuleId,
{
    let added = generate_modules(delta.added.values(), graph, options, &create_module_id)?;
    let modified = generate_modules(delta.modified.values(), graph, options, &create_module_id)?;

    let mut deleted: Vec<ModuleId> = delta
        .deleted
        .iter()
        .map(|path| create_module_id(path))
        .collect();
    deleted.sort_unstable();

    Ok(HmrUpdate {
        added,
        modified,
        deleted,
    })
}

fn generate_modules<'m, I, F>(
    modules: I,
    graph: &Graph,
    options: &HmrBundleOptions<'_>,
    create_module_id: &F,
) -> Result<Vec<HmrModule>, HmrError>
where
    I: Iterator<Item = &'m Arc<Module>>,
    F: Fn(&str) -> ModuleId,
{
    let mut out = Vec::new();

    for module in modules {
        let id = create_module_id(&module.path);
        let source_mapping_url = with_pathname(
            options.client_url,
            &bundle_pathname(options.server_root, &module.path, "map"),
        );
        let source_url = with_pathname(
            options.client_url,
            &bundle_pathname(options.server_root, &module.path, "bundle"),
        );

        let code = format!(
            "{}\n//# sourceMappingURL={source_mapping_url}\n//# sourceURL={source_url}\n",
            prepare_module(id, module, graph, options, create_module_id)?
        );

        out.push(HmrModule {
            module: (id, code),
            source_mapping_url,
            source_url,
        });
    }

    out.sort_unstable_by_key(|m| m.module.0);
    Ok(out)
}

/// Wrap a module in its module-definition call, including the map of
/// inverse dependencies the runtime uses to find accept handlers.
fn prepare_module<F>(
    id: ModuleId,
    module: &Module,
    graph: &Graph,
    options: &HmrBundleOptions<'_>,
    create_module_id: &F,
) -> Result<String, HmrError>
where
    F: Fn(&str) -> ModuleId,
{
    let dependency_ids: Vec<ModuleId> = module
        .dependencies
        .iter()
        .map(|dep| create_module_id(&dep.path))
        .collect();

    let mut dependency_map = serde_json::to_value(&dependency_ids)?;
    if options.include_async_paths {
        let paths: BTreeMap<String, String> = module
            .dependencies
            .iter()
            .zip(&dependency_ids)
            .filter(|(dep, _)| dep.is_async)
            .map(|(dep, dep_id)| {
                let url = with_pathname(
                    options.client_url,
                    &bundle_pathname(options.server_root, &dep.path, "bundle"),
                );
                (dep_id.to_string(), url)
            })
            .collect();
        if !paths.is_empty() {
            if let serde_json::Value::Array(items) = &mut dependency_map {
                items.push(serde_json::json!({ "paths": paths }));
            }
        }
    }

    let verbose_name = relative_to(options.project_root, &module.path);
    let inverse = inverse_dependencies(module, graph, create_module_id);

    Ok(format!(
        "__d(function (global, _$$_REQUIRE, _$$_IMPORT_DEFAULT, _$$_IMPORT_ALL, module, exports, _dependencyMap) {{\n{code}\n}},{id},{deps},{name},{inverse})",
        code = module.code,
        deps = serde_json::to_string(&dependency_map)?,
        name = serde_json::to_string(&verbose_name)?,
        inverse = serde_json::to_string(&inverse)?,
    ))
}

/// Walk inverse dependency edges from `module` up to the entry points.
fn inverse_dependencies<F>(
    module: &Module,
    graph: &Graph,
    create_module_id: &F,
) -> BTreeMap<ModuleId, Vec<ModuleId>>
where
    F: Fn(&str) -> ModuleId,
{
    let mut result = BTreeMap::new();
    let mut visited = FxHashSet::default();
    let mut queue = VecDeque::new();

    visited.insert(module.path.as_str());
    queue.push_back(module);

    while let Some(current) = queue.pop_front() {
        let mut parents: Vec<ModuleId> = Vec::with_capacity(current.inverse_dependencies.len());
        for parent_path in &current.inverse_dependencies {
            parents.push(create_module_id(parent_path));
            if visited.insert(parent_path.as_str()) {
                if let Some(parent) = graph.get(parent_path) {
                    queue.push_back(parent);
                }
            }
        }
        parents.sort_unstable();
        result.insert(create_module_id(&current.path), parents);
    }

    result
}

/// Path relative to `root` with `/` separators, or the path itself when it
/// lies outside `root`.
fn relative_to(root: &Path, path: &str) -> String {
    let canonical = canonical_separators(path);
    let root = root.to_string_lossy();
    let root = canonical_separators(&root);
    let root = root.trim_end_matches('/');

    if !root.is_empty() {
        if let Some(rest) = canonical.strip_prefix(root).and_then(|r| r.strip_prefix('/')) {
            return rest.to_string();
        }
    }
    canonical.into_owned()
}

/// URL pathname of `path` relative to the server root with its extension
/// replaced by `extension`. Segments are percent-encoded.
fn bundle_pathname(server_root: &Path, path: &str, extension: &str) -> String {
    let relative = relative_to(server_root, path);
    let (stem, _) = split_extension(&relative);

    let encoded: Vec<String> = format!("{stem}.{extension}")
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(encode_uri_component)
        .collect();
    format!("/{}", encoded.join("/"))
}

fn split_extension(path: &str) -> (&str, Option<&str>) {
    let file_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[file_start..].rfind('.') {
        Some(dot) if dot > 0 => {
            let dot = file_start + dot;
            (&path[..dot], Some(&path[dot + 1..]))
        }
        _ => (path, None),
    }
}

/// Replace the pathname of `client_url`, dropping `excludeSource`.
fn with_pathname(client_url: &str, pathname: &str) -> String {
    let (base, query) = client_url.split_once('?').unwrap_or((client_url, ""));

    let origin_end = base
        .find("://")
        .map(|scheme_end| scheme_end + 3)
        .map(|host_start| {
            base[host_start..]
                .find('/')
                .map_or(base.len(), |slash| host_start + slash)
        })
        .unwrap_or(0);
    let origin = &base[..origin_end];

    let query: Vec<&str> = query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .filter(|pair| pair.split('=').next() != Some(EXCLUDE_SOURCE_PARAM))
        .collect();

    if query.is_empty() {
        format!("{origin}{pathname}")
    } else {
        format!("{origin}{pathname}?{}", query.join("&"))
    }
}

fn encode_uri_component(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'-'
            | b'_'
            | b'.'
            | b'!'
            | b'~'
            | b'*'
            | b'\''
            | b'('
            | b')' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}
