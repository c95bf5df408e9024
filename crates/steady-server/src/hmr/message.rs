use serde::{Deserialize, Serialize};
use steady_graph::{ModuleId, RevisionId};

use crate::error::HmrError;
use crate::format::FormattedError;

/// A message sent to HMR clients.
///
/// [`crate::HmrCoordinator::prepare_update`] only ever produces
/// [`Message::Update`] or [`Message::Error`]; the start/done variants frame
/// an update on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "kebab-case")]
pub enum Message {
    /// Opens an update; the client buffers until `update-done`.
    UpdateStart {
        #[serde(rename = "isInitialUpdate")]
        is_initial_update: bool,
    },
    /// Modules to apply, tagged with the revision the client moves to.
    Update(UpdateBody),
    /// Closes an update.
    UpdateDone,
    /// The update failed; the client keeps its current revision.
    Error(FormattedError),
}

impl Message {
    pub fn is_error(&self) -> bool {
        matches!(self, Message::Error(_))
    }

    pub fn as_update(&self) -> Option<&UpdateBody> {
        match self {
            Message::Update(body) => Some(body),
            _ => None,
        }
    }

    /// Wire form of the message.
    pub fn to_json(&self) -> Result<String, HmrError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBody {
    /// Revision the client holds once the update is applied.
    pub revision_id: RevisionId,
    pub is_initial_update: bool,
    #[serde(flatten)]
    pub update: HmrUpdate,
}

/// Modules added, modified and deleted by one update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HmrUpdate {
    pub added: Vec<HmrModule>,
    pub modified: Vec<HmrModule>,
    pub deleted: Vec<ModuleId>,
}

impl HmrUpdate {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.modified.is_empty() && self.deleted.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HmrModule {
    /// `(id, wrapped code)`
    pub module: (ModuleId, String),
    #[serde(rename = "sourceMappingURL")]
    pub source_mapping_url: String,
    #[serde(rename = "sourceURL")]
    pub source_url: String,
}
