//! Reporting hook for bundling errors and update telemetry.

use steady_graph::RevisionId;

use crate::format::FormattedError;

/// Something a [`Reporter`] is told about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReporterEvent {
    /// An update attempt failed for a reason other than a missing revision.
    BundlingError(FormattedError),
    /// An update message was built for a client group.
    HmrUpdate {
        revision_id: RevisionId,
        added: usize,
        modified: usize,
        deleted: usize,
    },
    /// A client opened a connection.
    ClientConnected { client_id: u64 },
    /// A client disconnected or its channel was found closed.
    ClientDisconnected { client_id: u64 },
}

/// Receives server events. Implementations must not block.
pub trait Reporter: Send + Sync {
    fn update(&self, event: &ReporterEvent);
}

/// Default reporter: forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn update(&self, event: &ReporterEvent) {
        match event {
            ReporterEvent::BundlingError(error) => {
                tracing::error!(kind = %error.kind, "{}", error.message);
            }
            ReporterEvent::HmrUpdate {
                revision_id,
                added,
                modified,
                deleted,
            } => {
                tracing::debug!(
                    revision = %revision_id,
                    added,
                    modified,
                    deleted,
                    "hmr update prepared"
                );
            }
            ReporterEvent::ClientConnected { client_id } => {
                tracing::debug!(client_id, "hmr client connected");
            }
            ReporterEvent::ClientDisconnected { client_id } => {
                tracing::debug!(client_id, "hmr client disconnected");
            }
        }
    }
}
