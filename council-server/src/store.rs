// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! In-memory document store with optional JSON snapshots.
//!
//! Collections are keyed by [`RecordId`], so iteration order is creation
//! order. When a snapshot path is set, every write rewrites
//! `council-store.json` before the lock is released, and a write whose
//! snapshot fails is not applied in memory.

use council_core::{
    ConversationSource, IdGenerator, Message, Node, RecordId, Sender, StoreError, User, Workspace,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const SNAPSHOT_FILE: &str = "council-store.json";

#[derive(Debug, Clone, Default)]
struct Collections {
    users: BTreeMap<RecordId, User>,
    workspaces: BTreeMap<RecordId, Workspace>,
    nodes: BTreeMap<RecordId, Node>,
    messages: BTreeMap<RecordId, Message>,
}

/// On-disk layout
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    users: Vec<User>,
    workspaces: Vec<Workspace>,
    nodes: Vec<Node>,
    messages: Vec<Message>,
}

impl Collections {
    fn to_snapshot(&self) -> Snapshot {
        Snapshot {
            users: self.users.values().cloned().collect(),
            workspaces: self.workspaces.values().cloned().collect(),
            nodes: self.nodes.values().cloned().collect(),
            messages: self.messages.values().cloned().collect(),
        }
    }

    fn from_snapshot(snapshot: Snapshot) -> Self {
        Self {
            users: snapshot.users.into_iter().map(|u| (u.id, u)).collect(),
            workspaces: snapshot.workspaces.into_iter().map(|w| (w.id, w)).collect(),
            nodes: snapshot.nodes.into_iter().map(|n| (n.id, n)).collect(),
            messages: snapshot.messages.into_iter().map(|m| (m.id, m)).collect(),
        }
    }

    fn max_id(&self) -> Option<RecordId> {
        [
            self.users.keys().next_back(),
            self.workspaces.keys().next_back(),
            self.nodes.keys().next_back(),
            self.messages.keys().next_back(),
        ]
        .into_iter()
        .flatten()
        .max()
        .copied()
    }
}

/// Changes accepted by [`MemoryStore::update_node`]
#[derive(Debug, Clone, Default)]
pub struct NodeChanges {
    pub workspace_id: Option<RecordId>,
    pub name: Option<String>,
    pub persona_id: Option<u8>,
}

pub struct MemoryStore {
    ids: IdGenerator,
    inner: RwLock<Collections>,
    snapshot_path: Option<PathBuf>,
}

impl MemoryStore {
    /// Store that never touches disk
    pub fn in_memory() -> Self {
        Self {
            ids: IdGenerator::new(),
            inner: RwLock::new(Collections::default()),
            snapshot_path: None,
        }
    }

    /// Open a persistent store in `data_dir`, loading the snapshot if present
    pub fn open<P: AsRef<Path>>(data_dir: P) -> Result<Self, StoreError> {
        let data_dir = data_dir.as_ref();
        std::fs::create_dir_all(data_dir)?;

        let snapshot_path = data_dir.join(SNAPSHOT_FILE);
        let collections = if snapshot_path.exists() {
            let contents = std::fs::read_to_string(&snapshot_path)?;
            let snapshot: Snapshot = serde_json::from_str(&contents)?;
            Collections::from_snapshot(snapshot)
        } else {
            Collections::default()
        };

        let ids = IdGenerator::new();
        if let Some(max) = collections.max_id() {
            ids.observe(max);
        }

        tracing::info!(
            "Loaded store from {:?}: {} users, {} workspaces, {} nodes, {} messages",
            snapshot_path,
            collections.users.len(),
            collections.workspaces.len(),
            collections.nodes.len(),
            collections.messages.len()
        );

        Ok(Self {
            ids,
            inner: RwLock::new(collections),
            snapshot_path: Some(snapshot_path),
        })
    }

    /// Serialize and atomically replace the snapshot file.
    ///
    /// Blocking file I/O, run under the write lock. Output is compact JSON.
    fn save(&self, collections: &Collections) -> Result<(), StoreError> {
        let Some(path) = &self.snapshot_path else {
            return Ok(());
        };

        let contents = serde_json::to_vec(&collections.to_snapshot())?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Apply a mutation and persist it.
    ///
    /// With a snapshot path the mutation runs on a staged copy that replaces
    /// the live collections only once the snapshot is written, so a failed
    /// save leaves memory untouched. When `changed` reports false nothing is
    /// saved or swapped in.
    fn commit<T>(
        &self,
        mutate: impl FnOnce(&mut Collections) -> T,
        changed: impl FnOnce(&T) -> bool,
    ) -> Result<T, StoreError> {
        let mut inner = self.inner.write();
        if self.snapshot_path.is_none() {
            return Ok(mutate(&mut *inner));
        }

        let mut staged = inner.clone();
        let result = mutate(&mut staged);
        if changed(&result) {
            self.save(&staged)?;
            *inner = staged;
        }
        Ok(result)
    }

    /// Mutation that may find nothing to change
    fn write<T>(
        &self,
        mutate: impl FnOnce(&mut Collections) -> Option<T>,
    ) -> Result<Option<T>, StoreError> {
        self.commit(mutate, Option::is_some)
    }

    /// Mutation that always adds a record
    fn insert<T>(&self, mutate: impl FnOnce(&mut Collections) -> T) -> Result<T, StoreError> {
        self.commit(mutate, |_| true)
    }

    // Users

    /// Insert a user; `None` when the email is already registered
    pub fn create_user(&self, email: &str, password_hash: String) -> Result<Option<User>, StoreError> {
        self.write(|c| {
            if c.users.values().any(|u| u.email == email) {
                return None;
            }
            let user = User {
                id: self.ids.next_id(),
                email: email.to_string(),
                password_hash,
            };
            c.users.insert(user.id, user.clone());
            Some(user)
        })
    }

    pub fn user(&self, id: RecordId) -> Option<User> {
        self.inner.read().users.get(&id).cloned()
    }

    pub fn user_by_email(&self, email: &str) -> Option<User> {
        self.inner
            .read()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
    }

    // Workspaces

    pub fn create_workspace(&self, owner_id: RecordId, name: String) -> Result<Workspace, StoreError> {
        self.insert(|c| {
            let workspace = Workspace {
                id: self.ids.next_id(),
                owner_id,
                name,
            };
            c.workspaces.insert(workspace.id, workspace.clone());
            workspace
        })
    }

    pub fn workspace(&self, id: RecordId, owner_id: RecordId) -> Option<Workspace> {
        self.inner
            .read()
            .workspaces
            .get(&id)
            .filter(|w| w.owner_id == owner_id)
            .cloned()
    }

    pub fn workspaces_for_owner(&self, owner_id: RecordId) -> Vec<Workspace> {
        self.inner
            .read()
            .workspaces
            .values()
            .filter(|w| w.owner_id == owner_id)
            .cloned()
            .collect()
    }

    pub fn update_workspace(
        &self,
        id: RecordId,
        owner_id: RecordId,
        name: Option<String>,
    ) -> Result<Option<Workspace>, StoreError> {
        self.write(|c| {
            let workspace = c
                .workspaces
                .get_mut(&id)
                .filter(|w| w.owner_id == owner_id)?;
            if let Some(name) = name {
                workspace.name = name;
            }
            Some(workspace.clone())
        })
    }

    /// Delete a workspace with its nodes and their messages
    pub fn delete_workspace(&self, id: RecordId, owner_id: RecordId) -> Result<bool, StoreError> {
        let deleted = self.write(|c| {
            c.workspaces
                .get(&id)
                .filter(|w| w.owner_id == owner_id)?;

            c.workspaces.remove(&id);
            let node_ids: Vec<RecordId> = c
                .nodes
                .values()
                .filter(|n| n.workspace_id == id)
                .map(|n| n.id)
                .collect();
            for node_id in &node_ids {
                c.nodes.remove(node_id);
            }
            c.messages.retain(|_, m| !node_ids.contains(&m.node_id));
            Some(node_ids.len())
        })?;

        if let Some(nodes) = deleted {
            tracing::debug!(workspace_id = %id, nodes, "Deleted workspace with its nodes");
        }
        Ok(deleted.is_some())
    }

    // Nodes

    pub fn create_node(
        &self,
        owner_id: RecordId,
        workspace_id: RecordId,
        name: String,
        persona_id: u8,
    ) -> Result<Node, StoreError> {
        self.insert(|c| {
            let node = Node {
                id: self.ids.next_id(),
                owner_id,
                workspace_id,
                name,
                persona_id,
            };
            c.nodes.insert(node.id, node.clone());
            node
        })
    }

    pub fn node(&self, id: RecordId, owner_id: RecordId) -> Option<Node> {
        self.inner
            .read()
            .nodes
            .get(&id)
            .filter(|n| n.owner_id == owner_id)
            .cloned()
    }

    /// Nodes of `owner_id` in creation order, optionally limited to one workspace
    pub fn nodes_for_owner(&self, owner_id: RecordId, workspace_id: Option<RecordId>) -> Vec<Node> {
        self.inner
            .read()
            .nodes
            .values()
            .filter(|n| n.owner_id == owner_id)
            .filter(|n| workspace_id.map_or(true, |ws| n.workspace_id == ws))
            .cloned()
            .collect()
    }

    pub fn update_node(
        &self,
        id: RecordId,
        owner_id: RecordId,
        changes: NodeChanges,
    ) -> Result<Option<Node>, StoreError> {
        self.write(|c| {
            let node = c.nodes.get_mut(&id).filter(|n| n.owner_id == owner_id)?;
            if let Some(workspace_id) = changes.workspace_id {
                node.workspace_id = workspace_id;
            }
            if let Some(name) = changes.name {
                node.name = name;
            }
            if let Some(persona_id) = changes.persona_id {
                node.persona_id = persona_id;
            }
            Some(node.clone())
        })
    }

    /// Delete a node with its messages
    pub fn delete_node(&self, id: RecordId, owner_id: RecordId) -> Result<bool, StoreError> {
        let deleted = self.write(|c| {
            c.nodes.get(&id).filter(|n| n.owner_id == owner_id)?;
            c.nodes.remove(&id);
            c.messages.retain(|_, m| m.node_id != id);
            Some(())
        })?;
        Ok(deleted.is_some())
    }

    // Messages

    pub fn create_message(
        &self,
        node_id: RecordId,
        sender: Sender,
        content: String,
    ) -> Result<Message, StoreError> {
        self.insert(|c| {
            let message = Message {
                id: self.ids.next_id(),
                node_id,
                sender,
                content,
            };
            c.messages.insert(message.id, message.clone());
            message
        })
    }

    pub fn message(&self, id: RecordId) -> Option<Message> {
        self.inner.read().messages.get(&id).cloned()
    }

    pub fn messages_for_node(&self, node_id: RecordId) -> Vec<Message> {
        self.inner
            .read()
            .messages
            .values()
            .filter(|m| m.node_id == node_id)
            .cloned()
            .collect()
    }

    /// Messages on any node owned by `owner_id`, in creation order
    pub fn messages_for_owner(&self, owner_id: RecordId) -> Vec<Message> {
        let inner = self.inner.read();
        let messages = inner
            .messages
            .values()
            .filter(|m| {
                inner
                    .nodes
                    .get(&m.node_id)
                    .is_some_and(|n| n.owner_id == owner_id)
            })
            .cloned()
            .collect();
        messages
    }

    pub fn update_message(
        &self,
        id: RecordId,
        sender: Option<Sender>,
        content: Option<String>,
    ) -> Result<Option<Message>, StoreError> {
        self.write(|c| {
            let message = c.messages.get_mut(&id)?;
            if let Some(sender) = sender {
                message.sender = sender;
            }
            if let Some(content) = content {
                message.content = content;
            }
            Some(message.clone())
        })
    }

    pub fn delete_message(&self, id: RecordId) -> Result<bool, StoreError> {
        let deleted = self.write(|c| c.messages.remove(&id))?;
        Ok(deleted.is_some())
    }
}

impl ConversationSource for MemoryStore {
    fn workspace_for_owner(
        &self,
        workspace_id: RecordId,
        owner_id: RecordId,
    ) -> Result<Option<Workspace>, StoreError> {
        Ok(self.workspace(workspace_id, owner_id))
    }

    fn nodes_in_workspace(
        &self,
        workspace_id: RecordId,
        owner_id: RecordId,
    ) -> Result<Vec<Node>, StoreError> {
        Ok(self.nodes_for_owner(owner_id, Some(workspace_id)))
    }

    fn latest_message(&self, node_id: RecordId) -> Result<Option<Message>, StoreError> {
        Ok(self
            .inner
            .read()
            .messages
            .values()
            .rev()
            .find(|m| m.node_id == node_id)
            .cloned())
    }
}
