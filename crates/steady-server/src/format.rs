//! Client-facing error payloads.

use serde::{Deserialize, Serialize};

use crate::error::{BundlerError, HmrError};

/// Body of an error message sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedError {
    /// Error class name shown by the client, e.g. `TransformError`.
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub errors: Vec<ErrorDescription>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescription {
    pub description: String,
}

impl FormattedError {
    fn new(kind: &str, message: String) -> Self {
        Self {
            kind: kind.to_string(),
            errors: vec![ErrorDescription {
                description: message.clone(),
            }],
            message,
        }
    }
}

/// Format an update failure the way clients expect bundling errors.
pub fn format_bundling_error(error: &HmrError) -> FormattedError {
    let message = error.to_string();
    let kind = match error {
        HmrError::RevisionNotFound(_) => "RevisionNotFoundError",
        HmrError::ClientGroupNotFound(_) | HmrError::ClientNotFound(_) => "NotFoundError",
        HmrError::Bundler(BundlerError::Transform { .. }) => "TransformError",
        HmrError::Bundler(BundlerError::Resolution { .. }) => "UnableToResolveError",
        HmrError::Bundler(BundlerError::Internal(_)) | HmrError::Serialization(_) => {
            "InternalError"
        }
    };
    FormattedError::new(kind, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use steady_graph::RevisionId;

    #[test]
    fn revision_not_found() {
        let formatted = format_bundling_error(&HmrError::RevisionNotFound(RevisionId::from("7")));
        assert_eq!(formatted.kind, "RevisionNotFoundError");
        assert_eq!(formatted.message, "The revision `7` was not found.");
        assert_eq!(formatted.errors.len(), 1);
    }

    #[test]
    fn transform_error_keeps_path() {
        let error = HmrError::Bundler(BundlerError::Transform {
            path: "/app/index.js".into(),
            message: "Unexpected token (3:4)".into(),
        });
        let formatted = format_bundling_error(&error);
        assert_eq!(formatted.kind, "TransformError");
        assert_eq!(formatted.message, "/app/index.js: Unexpected token (3:4)");
    }

    #[test]
    fn serializes_type_field() {
        let formatted = format_bundling_error(&HmrError::Serialization("boom".into()));
        let value = serde_json::to_value(&formatted).unwrap();
        assert_eq!(value["type"], "InternalError");
        assert_eq!(value["errors"][0]["description"], "failed to serialize update: boom");
    }
}
