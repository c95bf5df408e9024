//! Connected HMR clients and the revision-keyed groups they belong to.
//!
//! A client joins one group per entry point it registers. Groups are keyed
//! by the revision their clients last received; a successful update moves
//! the group to the new revision, merging it into any group already there.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use steady_graph::RevisionId;
use tokio::sync::mpsc;

/// Identifier of a connected client, unique for the server lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Graph options a group was registered with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GraphOptions {
    /// Async imports are bundled lazily, so updates carry their bundle URLs.
    pub lazy: bool,
}

/// A connected client.
#[derive(Debug, Clone)]
pub struct Client {
    pub id: ClientId,
    /// Revisions this client currently holds, one per registered entry point.
    pub revision_ids: Vec<RevisionId>,
    /// Outgoing JSON messages.
    pub sender: mpsc::Sender<String>,
}

/// Clients that hold the same revision of one entry point and therefore
/// share every update.
#[derive(Debug, Clone)]
pub struct ClientGroup {
    /// Revision every member currently holds. Also the group's key.
    pub revision_id: RevisionId,
    pub clients: BTreeSet<ClientId>,
    /// Bundle URL of the first registration, the base for source and
    /// async bundle URLs.
    pub client_url: String,
    pub graph_options: GraphOptions,
}

/// All clients and groups. Owned by the coordinator behind a mutex.
#[derive(Debug, Default)]
pub struct ClientIndex {
    clients: BTreeMap<ClientId, Client>,
    groups: BTreeMap<RevisionId, ClientGroup>,
    next_id: u64,
}

impl ClientIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client connection.
    pub fn connect(&mut self, sender: mpsc::Sender<String>) -> ClientId {
        let id = ClientId(self.next_id);
        self.next_id += 1;
        self.clients.insert(
            id,
            Client {
                id,
                revision_ids: Vec::new(),
                sender,
            },
        );
        id
    }

    /// Remove a client from the index and from every group it joined.
    /// Groups left without clients are dropped.
    pub fn disconnect(&mut self, id: ClientId) -> Option<Client> {
        let client = self.clients.remove(&id)?;
        for revision_id in &client.revision_ids {
            let now_empty = match self.groups.get_mut(revision_id) {
                Some(group) => {
                    group.clients.remove(&id);
                    group.clients.is_empty()
                }
                None => false,
            };
            if now_empty {
                self.groups.remove(revision_id);
            }
        }
        Some(client)
    }

    /// Add `id` to the group for `revision_id`, creating it if needed.
    ///
    /// Returns `false` when the client is not connected.
    pub fn join(
        &mut self,
        id: ClientId,
        client_url: String,
        revision_id: RevisionId,
        graph_options: GraphOptions,
    ) -> bool {
        let Some(client) = self.clients.get_mut(&id) else {
            return false;
        };
        if !client.revision_ids.contains(&revision_id) {
            client.revision_ids.push(revision_id.clone());
        }

        self.groups
            .entry(revision_id.clone())
            .or_insert_with(|| ClientGroup {
                revision_id,
                clients: BTreeSet::new(),
                client_url,
                graph_options,
            })
            .clients
            .insert(id);
        true
    }

    /// Move the group keyed by `from` to `to`.
    ///
    /// Each member's history drops `from` and gains `to`. When a group is
    /// already keyed by `to` the two are merged, keeping the existing
    /// group's URL and options.
    pub fn rekey(&mut self, from: &RevisionId, to: &RevisionId) -> bool {
        if from == to {
            return self.groups.contains_key(from);
        }
        let Some(mut group) = self.groups.remove(from) else {
            return false;
        };

        for id in &group.clients {
            if let Some(client) = self.clients.get_mut(id) {
                client.revision_ids.retain(|rev| rev != from);
                if !client.revision_ids.contains(to) {
                    client.revision_ids.push(to.clone());
                }
            }
        }

        match self.groups.get_mut(to) {
            Some(existing) => existing.clients.append(&mut group.clients),
            None => {
                group.revision_id = to.clone();
                self.groups.insert(to.clone(), group);
            }
        }
        true
    }

    pub fn group(&self, revision_id: &RevisionId) -> Option<&ClientGroup> {
        self.groups.get(revision_id)
    }

    pub fn client(&self, id: ClientId) -> Option<&Client> {
        self.clients.get(&id)
    }

    /// Keys of all current groups, in order.
    pub fn revision_ids(&self) -> Vec<RevisionId> {
        self.groups.keys().cloned().collect()
    }

    /// Senders of every client in a group.
    pub fn senders(&self, revision_id: &RevisionId) -> Vec<(ClientId, mpsc::Sender<String>)> {
        let Some(group) = self.groups.get(revision_id) else {
            return Vec::new();
        };
        group
            .clients
            .iter()
            .filter_map(|id| self.clients.get(id).map(|c| (*id, c.sender.clone())))
            .collect()
    }

    pub fn sender(&self, id: ClientId) -> Option<mpsc::Sender<String>> {
        self.clients.get(&id).map(|c| c.sender.clone())
    }

    pub fn client_count(&self) -> usize {
        self.clients.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}
