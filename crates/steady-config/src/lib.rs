//! # steady-config
//!
//! Configuration for a deterministic bundler dev server: raw config types,
//! layered loading (`steady.toml`, `STEADY_*` environment variables) and
//! startup feature resolution.
//!
//! ```
//! use steady_config::ServerConfig;
//!
//! let config = ServerConfig::from_toml_str("[bundler]\nfast_resolver = true").unwrap();
//! let resolved = config.resolve().unwrap();
//! assert!(resolved.fast_resolver);
//! ```

pub mod config;
pub mod error;
pub mod loading;
pub mod resolve;
pub mod settings;
pub mod validation;

pub use config::*;
pub use error::*;
pub use loading::{CONFIG_FILE_NAME, ENV_PREFIX};
pub use resolve::{ResolvedConfig, absolute_root, is_watch_enabled, public_path};
pub use settings::*;
pub use validation::{ConfigValidator, FeatureFlagValidator, validate_flags};
