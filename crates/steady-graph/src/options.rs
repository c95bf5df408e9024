//! Transform options attached to graphs and file transforms.
//!
//! Only the options this crate inspects get typed fields. Everything else
//! round-trips through the flattened `extra` bags so newer bundler options
//! are preserved without code changes here.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Options controlling how a single file is compiled.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[serde(default)]
    pub dev: bool,

    #[serde(default)]
    pub hot: bool,

    #[serde(default)]
    pub minify: bool,

    #[serde(default)]
    pub custom_transform_options: CustomTransformOptions,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Framework-specific options forwarded to the transformer.
///
/// Values arrive from bundle URL query parameters, so the scalar options
/// are strings and "set" means present and non-empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTransformOptions {
    /// `client`, `node` or `react-server`. Part of the module ID context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,

    /// DOM component root. Only read by the DOM entry file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dom: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub router_root: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub async_routes: Option<String>,

    /// Client reference modules for server component exports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_boundaries: Option<Vec<String>>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl TransformOptions {
    pub fn for_platform(platform: impl Into<String>) -> Self {
        Self {
            platform: Some(platform.into()),
            ..Self::default()
        }
    }

    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.custom_transform_options.environment = Some(environment.into());
        self
    }

    pub fn environment(&self) -> Option<&str> {
        self.custom_transform_options.environment.as_deref()
    }
}

/// Query-string truthiness: present and non-empty.
pub(crate) fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_camel_case_and_keeps_unknown_options() {
        let options: TransformOptions = serde_json::from_value(json!({
            "platform": "ios",
            "dev": true,
            "type": "module",
            "customTransformOptions": {
                "environment": "node",
                "routerRoot": "src/app",
                "clientBoundaries": ["./Button.js"],
                "bytecode": "1"
            }
        }))
        .unwrap();

        assert_eq!(options.platform.as_deref(), Some("ios"));
        assert!(options.dev);
        assert_eq!(options.extra.get("type"), Some(&json!("module")));
        assert_eq!(options.environment(), Some("node"));

        let custom = &options.custom_transform_options;
        assert_eq!(custom.router_root.as_deref(), Some("src/app"));
        assert_eq!(
            custom.client_boundaries.as_deref(),
            Some(&["./Button.js".to_string()][..])
        );
        assert_eq!(custom.extra.get("bytecode"), Some(&json!("1")));
    }

    #[test]
    fn serializes_without_absent_options() {
        let value = serde_json::to_value(TransformOptions::for_platform("web")).unwrap();
        assert_eq!(
            value,
            json!({
                "platform": "web",
                "dev": false,
                "hot": false,
                "minify": false,
                "customTransformOptions": {}
            })
        );
    }

    #[test]
    fn is_set_treats_empty_as_unset() {
        assert!(!is_set(&None));
        assert!(!is_set(&Some(String::new())));
        assert!(is_set(&Some("false".to_string())));
    }
}
