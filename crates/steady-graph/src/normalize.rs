//! Per-file transform option normalization.
//!
//! Several custom transform options are only read by one well-known file
//! (or one package). Leaving them on every other file's options would give
//! otherwise identical transforms different cache keys, so they are reset
//! or dropped for everything else before the transform runs.

use std::borrow::Cow;

use crate::options::{TransformOptions, is_set};

/// The only generated file that reads the DOM component root.
const DOM_ENTRY_SUFFIX: &str = "expo/dom/entry.js";

/// Virtual entry that reads client boundaries for server component exports.
const RSC_ENTRY_SUFFIX: &str = "/expo/virtual/rsc.js";

/// Router internals that read the router root and async route settings.
const ROUTER_CONTEXT_MARKER: &str = "/expo-router/_ctx";
const ROUTER_BUILD_MARKER: &str = "/expo-router/build/";

/// Value `dom` is reset to outside the DOM entry.
pub const DEFAULT_DOM: &str = "true";

/// Value `routerRoot` is reset to outside router internals.
pub const DEFAULT_ROUTER_ROOT: &str = "app";

/// Return `options` with every option irrelevant to `path` reset or removed.
///
/// Never fails and never mutates its input. Idempotent:
/// `normalize(p, &normalize(p, o)) == normalize(p, o)`.
///
/// # Example
///
/// ```
/// use steady_graph::{TransformOptions, normalize};
///
/// let mut options = TransformOptions::for_platform("web");
/// options.custom_transform_options.dom = Some("components/Chart.tsx".into());
///
/// let entry = normalize("/project/node_modules/expo/dom/entry.js", &options);
/// assert_eq!(entry.custom_transform_options.dom.as_deref(), Some("components/Chart.tsx"));
///
/// let other = normalize("/project/src/App.js", &options);
/// assert_eq!(other.custom_transform_options.dom.as_deref(), Some("true"));
/// ```
pub fn normalize(path: &str, options: &TransformOptions) -> TransformOptions {
    let mut options = options.clone();
    normalize_in_place(path, &mut options);
    options
}

/// In-place variant of [`normalize`] for callers that already own a copy.
pub fn normalize_in_place(path: &str, options: &mut TransformOptions) {
    let path = canonical_separators(path);
    let custom = &mut options.custom_transform_options;

    if is_set(&custom.dom) && !path.ends_with(DOM_ENTRY_SUFFIX) {
        custom.dom = Some(DEFAULT_DOM.to_string());
    }

    let in_router = is_router_internal(&path);

    if is_set(&custom.router_root) && !in_router {
        custom.router_root = Some(DEFAULT_ROUTER_ROOT.to_string());
    }

    if is_set(&custom.async_routes) && !in_router {
        custom.async_routes = None;
    }

    if custom.client_boundaries.is_some() && !path.ends_with(RSC_ENTRY_SUFFIX) {
        custom.client_boundaries = None;
    }
}

/// Rewrite platform specific separators to `/`.
pub fn canonical_separators(path: &str) -> Cow<'_, str> {
    if path.contains('\\') {
        Cow::Owned(path.replace('\\', "/"))
    } else {
        Cow::Borrowed(path)
    }
}

fn is_router_internal(path: &str) -> bool {
    path.contains(ROUTER_CONTEXT_MARKER) || path.contains(ROUTER_BUILD_MARKER)
}
