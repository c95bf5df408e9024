//! Turns file changes into per-group HMR messages.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use steady_graph::{ModuleIdContext, ModuleIdRegistry, RevisionId};
use tokio::sync::mpsc;

use crate::bundler::BundlerCore;
use crate::error::HmrError;
use crate::format::format_bundling_error;
use crate::hmr::clients::{ClientGroup, ClientId, ClientIndex, GraphOptions};
use crate::hmr::message::{Message, UpdateBody};
use crate::hmr::perf::{ChangeEvent, PerfLogger};
use crate::hmr::serializer::{HmrBundleOptions, hmr_bundle};
use crate::reporter::{Reporter, ReporterEvent};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// The client is receiving its first update for this entry point.
    /// Perf points are not recorded for initial updates.
    pub is_initial_update: bool,
}

/// Tracks client groups and prepares their update messages.
///
/// The client index lock is never held across an `.await`.
pub struct HmrCoordinator<B: BundlerCore> {
    bundler: Arc<B>,
    registry: Arc<ModuleIdRegistry>,
    reporter: Arc<dyn Reporter>,
    project_root: PathBuf,
    server_root: PathBuf,
    /// Used by entry points registered without explicit graph options.
    default_graph_options: GraphOptions,
    clients: Mutex<ClientIndex>,
}

impl<B: BundlerCore> HmrCoordinator<B> {
    pub fn new(
        bundler: Arc<B>,
        registry: Arc<ModuleIdRegistry>,
        reporter: Arc<dyn Reporter>,
        project_root: PathBuf,
        server_root: PathBuf,
    ) -> Self {
        Self {
            bundler,
            registry,
            reporter,
            project_root,
            server_root,
            default_graph_options: GraphOptions::default(),
            clients: Mutex::new(ClientIndex::new()),
        }
    }

    pub fn with_default_graph_options(mut self, graph_options: GraphOptions) -> Self {
        self.default_graph_options = graph_options;
        self
    }

    /// Register a connection. Messages for the client are sent on `sender`
    /// as JSON text.
    pub fn connect(&self, sender: mpsc::Sender<String>) -> ClientId {
        let id = self.clients.lock().connect(sender);
        self.reporter
            .update(&ReporterEvent::ClientConnected { client_id: id.get() });
        id
    }

    pub fn disconnect(&self, id: ClientId) {
        if self.clients.lock().disconnect(id).is_some() {
            self.reporter
                .update(&ReporterEvent::ClientDisconnected { client_id: id.get() });
        }
    }

    /// Add a client to the group for `revision_id` and bring it up to date.
    ///
    /// `None` for `graph_options` uses the coordinator's defaults (the
    /// `[hmr]` config table).
    pub async fn register_entry_point(
        &self,
        client: ClientId,
        client_url: impl Into<String>,
        revision_id: RevisionId,
        graph_options: Option<GraphOptions>,
    ) -> Result<(), HmrError> {
        let graph_options = graph_options.unwrap_or(self.default_graph_options);
        let sender = {
            let mut index = self.clients.lock();
            if !index.join(client, client_url.into(), revision_id.clone(), graph_options) {
                return Err(HmrError::ClientNotFound(client));
            }
            index.sender(client)
        };
        let Some(sender) = sender else {
            return Err(HmrError::ClientNotFound(client));
        };
        let targets = [(client, sender)];

        let options = UpdateOptions {
            is_initial_update: true,
        };
        self.send(&targets, &Message::UpdateStart {
            is_initial_update: true,
        })
        .await;
        let message = self.prepare_update(&revision_id, options, None).await;
        self.send(&targets, &message).await;
        self.send(&targets, &Message::UpdateDone).await;
        Ok(())
    }

    /// Build the message for the group keyed by `revision_id`.
    ///
    /// Always returns [`Message::Update`] or [`Message::Error`]. The group is
    /// re-keyed only when an update message is produced.
    ///
    /// When two attempts for the same revision overlap, only the first to
    /// finish re-keys the group. The other gets
    /// [`HmrError::ClientGroupNotFound`], so no client is ever told about a
    /// revision its group is not keyed under.
    pub async fn prepare_update(
        &self,
        revision_id: &RevisionId,
        options: UpdateOptions,
        change_event: Option<&ChangeEvent>,
    ) -> Message {
        let logger = if options.is_initial_update {
            None
        } else {
            change_event.and_then(|event| event.logger.clone())
        };

        match self.try_prepare_update(revision_id, options, logger.as_deref()).await {
            Ok(message) => message,
            Err(error) => {
                let formatted = format_bundling_error(&error);
                match error {
                    HmrError::RevisionNotFound(_) | HmrError::ClientGroupNotFound(_) => {
                        tracing::debug!(revision = %revision_id, "{}", formatted.message);
                    }
                    _ => self
                        .reporter
                        .update(&ReporterEvent::BundlingError(formatted.clone())),
                }
                Message::Error(formatted)
            }
        }
    }

    async fn try_prepare_update(
        &self,
        revision_id: &RevisionId,
        options: UpdateOptions,
        logger: Option<&dyn PerfLogger>,
    ) -> Result<Message, HmrError> {
        let group = self
            .group(revision_id)
            .ok_or_else(|| HmrError::ClientGroupNotFound(revision_id.clone()))?;

        let revision = self
            .bundler
            .get_revision(revision_id)
            .await?
            .ok_or_else(|| HmrError::RevisionNotFound(revision_id.clone()))?;

        point(logger, "updateGraph_start");
        let update = self.bundler.update_graph(revision, false).await?;
        point(logger, "updateGraph_end");

        point(logger, "serialize_start");
        let graph = &update.revision.graph;
        let context = ModuleIdContext::from_transform_options(&graph.transform_options);
        let bundle_options = HmrBundleOptions {
            client_url: &group.client_url,
            include_async_paths: group.graph_options.lazy,
            project_root: &self.project_root,
            server_root: &self.server_root,
        };
        let hmr_update = hmr_bundle(&update.delta, graph, &bundle_options, |path| {
            self.registry.assign_id(path, &context)
        })?;
        point(logger, "serialize_end");

        let new_revision_id = update.revision.id.clone();
        if !self.clients.lock().rekey(revision_id, &new_revision_id) {
            tracing::debug!(
                revision = %revision_id,
                superseded_by = %new_revision_id,
                "group moved during update"
            );
            return Err(HmrError::ClientGroupNotFound(revision_id.clone()));
        }

        self.reporter.update(&ReporterEvent::HmrUpdate {
            revision_id: new_revision_id.clone(),
            added: hmr_update.added.len(),
            modified: hmr_update.modified.len(),
            deleted: hmr_update.deleted.len(),
        });

        Ok(Message::Update(UpdateBody {
            revision_id: new_revision_id,
            is_initial_update: options.is_initial_update,
            update: hmr_update,
        }))
    }

    /// Push an update to every group. Clients whose channel has closed are
    /// disconnected.
    ///
    /// Groups are visited in key order from a snapshot taken up front. A
    /// group whose update lands on the key of a group visited later is
    /// merged into it, and its clients then receive that group's update as
    /// well. The second update is the one their recorded revision follows.
    pub async fn on_change(&self, event: &ChangeEvent) {
        let revision_ids = self.clients.lock().revision_ids();
        tracing::debug!(
            groups = revision_ids.len(),
            changed = event.changed_paths.len(),
            "file change"
        );

        for revision_id in revision_ids {
            let targets = self.clients.lock().senders(&revision_id);
            if targets.is_empty() {
                // Merged into another group earlier in this pass.
                continue;
            }

            self.send(&targets, &Message::UpdateStart {
                is_initial_update: false,
            })
            .await;
            let message = self
                .prepare_update(&revision_id, UpdateOptions::default(), Some(event))
                .await;
            self.send(&targets, &message).await;
            self.send(&targets, &Message::UpdateDone).await;
        }
    }

    async fn send(&self, targets: &[(ClientId, mpsc::Sender<String>)], message: &Message) {
        let json = match message.to_json() {
            Ok(json) => json,
            Err(error) => {
                tracing::error!(%error, "dropping unserializable hmr message");
                return;
            }
        };
        let mut closed = Vec::new();

        for (id, sender) in targets {
            if sender.send(json.clone()).await.is_err() {
                closed.push(*id);
            }
        }

        for id in closed {
            self.disconnect(id);
        }
    }

    /// Snapshot of a group.
    pub fn group(&self, revision_id: &RevisionId) -> Option<ClientGroup> {
        self.clients.lock().group(revision_id).cloned()
    }

    /// Revisions currently held by a client.
    pub fn client_revisions(&self, id: ClientId) -> Option<Vec<RevisionId>> {
        self.clients
            .lock()
            .client(id)
            .map(|client| client.revision_ids.clone())
    }

    pub fn revision_ids(&self) -> Vec<RevisionId> {
        self.clients.lock().revision_ids()
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().client_count()
    }
}

fn point(logger: Option<&dyn PerfLogger>, name: &str) {
    if let Some(logger) = logger {
        logger.point(name);
    }
}
