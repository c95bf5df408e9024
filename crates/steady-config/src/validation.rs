//! Startup validation of experimental flag combinations.

use crate::config::ServerConfig;
use crate::error::{ConfigError, Result};

/// Trait for pluggable config validation strategies
pub trait ConfigValidator {
    fn validate(&self, config: &ServerConfig) -> Result<()>;
}

/// Rejects flag combinations the bundler cannot honor.
///
/// # Example
///
/// ```
/// use steady_config::{ConfigValidator, FeatureFlagValidator, ServerConfig};
///
/// let mut config = ServerConfig::default();
/// config.bundler.tree_shaking = true;
/// assert!(FeatureFlagValidator.validate(&config).is_err());
///
/// config.bundler.optimize_graph = true;
/// assert!(FeatureFlagValidator.validate(&config).is_ok());
/// ```
pub struct FeatureFlagValidator;

impl ConfigValidator for FeatureFlagValidator {
    fn validate(&self, config: &ServerConfig) -> Result<()> {
        if config.bundler.tree_shaking && !config.bundler.optimize_graph {
            return Err(ConfigError::Conflict {
                flag: "bundler.tree_shaking",
                requires: "bundler.optimize_graph",
            });
        }

        Ok(())
    }
}

/// Convenience function for flag validation
pub fn validate_flags(config: &ServerConfig) -> Result<()> {
    FeatureFlagValidator.validate(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tree_shaking_without_optimize_graph_conflicts() {
        let mut config = ServerConfig::default();
        config.bundler.tree_shaking = true;

        let err = validate_flags(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Conflict {
                flag: "bundler.tree_shaking",
                requires: "bundler.optimize_graph"
            }
        ));
        assert_eq!(
            err.to_string(),
            "bundler.tree_shaking requires bundler.optimize_graph to be enabled"
        );
    }

    #[test]
    fn optimize_graph_alone_is_valid() {
        let mut config = ServerConfig::default();
        config.bundler.optimize_graph = true;
        assert!(validate_flags(&config).is_ok());
    }
}
