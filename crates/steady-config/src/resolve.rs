//! Feature resolution: turns a raw [`ServerConfig`] into the flags a server
//! actually runs with.

use std::path::{Path, PathBuf};

use path_clean::PathClean;

use serde::Serialize;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::validation::validate_flags;

/// Fully resolved server settings. Produced once at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    /// Absolute and cleaned.
    pub project_root: PathBuf,
    /// Absolute and cleaned. Module URLs are relative to this root.
    pub server_root: PathBuf,
    pub exporting: bool,
    /// Public path used by the asset pipeline.
    pub public_path: String,
    /// Whether file changes trigger HMR updates.
    pub watch: bool,
    pub server_functions: bool,
    pub server_components: bool,
    pub react_canary: bool,
    pub react_compiler: bool,
    pub tsconfig_paths: bool,
    pub fast_resolver: bool,
    pub sticky_resolver: bool,
    pub named_requires: bool,
    pub optimize_graph: bool,
    pub tree_shaking: bool,
    /// Graph option for entry points registered without one.
    pub lazy: bool,
    /// Per-path watcher debounce, also the change batching window.
    pub debounce_ms: u64,
    /// Watcher ignore patterns: `*.ext` or whole path component names.
    pub ignore: Vec<String>,
}

impl ServerConfig {
    /// Apply implied flags, reject conflicting ones and emit startup warnings.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ConfigError::Conflict`] when an experimental flag is
    /// enabled without its prerequisite. Callers must not start a server in
    /// that case.
    pub fn resolve(&self) -> Result<ResolvedConfig> {
        validate_flags(self)?;

        let experiments = &self.experiments;
        let server_functions = experiments.react_server_functions;
        let server_components = experiments.react_server_component_routes;

        let mut named_requires = self.bundler.named_requires;
        let mut fast_resolver = self.bundler.fast_resolver;

        // Server components and functions need every experimental bundler path.
        if server_components || server_functions {
            named_requires = true;
            fast_resolver = true;
        }

        let react_canary = server_components || server_functions || experiments.react_canary;
        if react_canary {
            // The fast resolver can switch the node_modules location for react imports.
            fast_resolver = true;
        }

        if experiments.react_compiler {
            tracing::warn!("Experimental React Compiler is enabled.");
        }
        if self.bundler.optimize_graph {
            tracing::warn!("Experimental bundle optimization is enabled.");
        }
        if self.bundler.tree_shaking {
            tracing::warn!("Experimental tree shaking is enabled.");
        }
        if server_functions {
            let mode = if server_components { "server" } else { "client" };
            tracing::warn!("React Server Functions (beta) are enabled. Route rendering mode: {mode}");
        }

        Ok(ResolvedConfig {
            project_root: absolute_root(&self.project_root)?,
            server_root: absolute_root(&self.server_root())?,
            exporting: self.exporting,
            public_path: public_path(self.exporting, experiments.base_url.as_deref()),
            watch: is_watch_enabled(self.ci),
            server_functions,
            server_components,
            react_canary,
            react_compiler: experiments.react_compiler,
            tsconfig_paths: experiments.tsconfig_paths,
            fast_resolver,
            sticky_resolver: self.bundler.sticky_resolver,
            named_requires,
            optimize_graph: self.bundler.optimize_graph,
            tree_shaking: self.bundler.tree_shaking,
            lazy: self.hmr.lazy,
            debounce_ms: self.hmr.debounce_ms,
            ignore: self.hmr.ignore.clone(),
        })
    }
}

/// Absolute, lexically cleaned form of a configured root. Module paths
/// reported by the bundler are absolute, so relative roots such as `.`
/// are resolved against the working directory.
pub fn absolute_root(path: &Path) -> Result<PathBuf> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };
    Ok(path.clean())
}

/// Public path handed to the asset pipeline.
///
/// Exports carry a token the asset plugin uses to rewrite paths when
/// writing to disk; the dev server serves assets relative to the root.
pub fn public_path(exporting: bool, base_url: Option<&str>) -> String {
    if exporting {
        format!("/assets?export_path={}/assets", base_url.unwrap_or_default())
    } else {
        "/assets/?unstable_path=.".to_string()
    }
}

/// Watch mode is disabled under CI.
pub fn is_watch_enabled(ci: bool) -> bool {
    if ci {
        tracing::info!(
            "Running in CI mode, reloads are disabled. Remove CI=true to enable watch mode."
        );
    }
    !ci
}
