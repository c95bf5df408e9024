use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format as _, Serialized, Toml},
};

use crate::config::ServerConfig;
use crate::error::{ConfigError, Result};

/// Name of the optional config file looked up in the project root.
pub const CONFIG_FILE_NAME: &str = "steady.toml";

/// Prefix for environment overrides. Nested keys are separated by `__`,
/// e.g. `STEADY_BUNDLER__TREE_SHAKING=true`.
pub const ENV_PREFIX: &str = "STEADY_";

impl ServerConfig {
    /// Load configuration for a project.
    /// Priority: environment variables > steady.toml > defaults
    pub fn load(project_root: impl AsRef<Path>) -> Result<Self> {
        let root = project_root.as_ref();
        if !root.exists() {
            return Err(ConfigError::RootNotFound(root.to_path_buf()));
        }

        let defaults = ServerConfig {
            project_root: root.to_path_buf(),
            ..ServerConfig::default()
        };

        let mut figment = Figment::new().merge(Serialized::defaults(defaults));

        let config_file = root.join(CONFIG_FILE_NAME);
        if config_file.exists() {
            tracing::debug!(path = %config_file.display(), "loading config file");
            figment = figment.merge(Toml::file(&config_file));
        }

        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let mut config: ServerConfig = figment.extract()?;
        if config.project_root.is_relative() {
            config.project_root = root.join(&config.project_root);
        }
        Ok(config)
    }

    /// Build a config from an in-memory TOML document, without touching the
    /// environment or the filesystem.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Figment::new()
            .merge(Serialized::defaults(ServerConfig::default()))
            .merge(Toml::string(source))
            .extract()
            .map_err(ConfigError::from)
    }

    /// A `steady.toml` document with every default spelled out.
    pub fn example_toml() -> Result<String> {
        toml::to_string_pretty(&ServerConfig::default()).map_err(|e| ConfigError::InvalidValue {
            field: "config".to_string(),
            hint: format!("TOML serialization failed: {e}"),
        })
    }

    /// Root that module paths are reported relative to.
    pub fn server_root(&self) -> PathBuf {
        self.server_root
            .clone()
            .unwrap_or_else(|| self.project_root.clone())
    }
}
