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

//! Read-only view of the document store used by the summary pipeline

use crate::id::RecordId;
use crate::model::{Message, Node, Workspace};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The three reads the summary pipeline needs.
///
/// Ownership is enforced by the implementation: a workspace owned by someone
/// else is reported as absent.
pub trait ConversationSource: Send + Sync {
    fn workspace_for_owner(
        &self,
        workspace_id: RecordId,
        owner_id: RecordId,
    ) -> Result<Option<Workspace>, StoreError>;

    /// Nodes of the workspace in creation order
    fn nodes_in_workspace(
        &self,
        workspace_id: RecordId,
        owner_id: RecordId,
    ) -> Result<Vec<Node>, StoreError>;

    /// Most recently created message of the node, if any
    fn latest_message(&self, node_id: RecordId) -> Result<Option<Message>, StoreError>;
}
