//! Server configuration types.
//!
//! `ServerConfig` is the raw, user-facing shape (what `steady.toml` and
//! `STEADY_*` variables deserialize into). Call [`ServerConfig::resolve`]
//! to apply implied flags and reject invalid combinations before starting
//! a server.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::settings::GlobalSettings;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_project_root")]
    pub project_root: PathBuf,

    /// Root that module paths are reported relative to. Defaults to the project root.
    #[serde(default)]
    pub server_root: Option<PathBuf>,

    /// True when producing a static export instead of serving.
    #[serde(default)]
    pub exporting: bool,

    /// Running under CI. Disables file watching.
    #[serde(default)]
    pub ci: bool,

    #[serde(default)]
    pub experiments: ExperimentsConfig,

    #[serde(default)]
    pub bundler: BundlerFlags,

    #[serde(default)]
    pub hmr: HmrConfig,

    #[serde(default)]
    pub settings: GlobalSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            project_root: default_project_root(),
            server_root: None,
            exporting: false,
            ci: false,
            experiments: ExperimentsConfig::default(),
            bundler: BundlerFlags::default(),
            hmr: HmrConfig::default(),
            settings: GlobalSettings::default(),
        }
    }
}

/// App-level experiments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentsConfig {
    #[serde(default)]
    pub react_server_functions: bool,

    #[serde(default)]
    pub react_server_component_routes: bool,

    #[serde(default)]
    pub react_canary: bool,

    #[serde(default)]
    pub react_compiler: bool,

    #[serde(default = "default_true")]
    pub tsconfig_paths: bool,

    /// Prefix for exported asset URLs.
    #[serde(default)]
    pub base_url: Option<String>,
}

impl Default for ExperimentsConfig {
    fn default() -> Self {
        Self {
            react_server_functions: false,
            react_server_component_routes: false,
            react_canary: false,
            react_compiler: false,
            tsconfig_paths: default_true(),
            base_url: None,
        }
    }
}

/// Unstable bundler switches.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundlerFlags {
    #[serde(default)]
    pub tree_shaking: bool,

    #[serde(default)]
    pub optimize_graph: bool,

    #[serde(default)]
    pub fast_resolver: bool,

    #[serde(default)]
    pub sticky_resolver: bool,

    /// Emit named `require` calls instead of numeric ones.
    #[serde(default)]
    pub named_requires: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HmrConfig {
    /// Default `lazy` graph option for clients that don't specify one.
    #[serde(default)]
    pub lazy: bool,

    /// Events for one path within this many milliseconds collapse into one.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// `*.ext` suffixes or path component names the watcher skips.
    #[serde(default = "default_ignore")]
    pub ignore: Vec<String>,
}

impl Default for HmrConfig {
    fn default() -> Self {
        Self {
            lazy: false,
            debounce_ms: default_debounce_ms(),
            ignore: default_ignore(),
        }
    }
}

fn default_project_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

fn default_debounce_ms() -> u64 {
    50
}

fn default_ignore() -> Vec<String> {
    vec!["node_modules".into(), "dist".into()]
}
