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

//! Merges the latest message of every node in a workspace into one text
//! blob for the summary prompt.

use council_core::{ConversationSource, Node, RecordId, Sender, StoreError};
use thiserror::Error;
use tracing::debug;

/// Width of the rule lines separating blocks
pub const RULE_WIDTH: usize = 80;

#[derive(Debug, Error)]
pub enum AggregateError {
    #[error("Workspace not found")]
    WorkspaceNotFound,

    #[error("No nodes found in this workspace")]
    NoNodes,

    #[error("No messages found in any node of this workspace")]
    NoMessages,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One node's contribution to the summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    pub node_id: RecordId,
    pub node_name: String,
    pub persona_id: u8,
    pub sender: Sender,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct AggregatedContent {
    pub workspace_name: String,
    /// Nodes in the workspace, including those without messages
    pub node_count: usize,
    pub entries: Vec<ConversationEntry>,
    pub text: String,
}

/// Collect the latest message of each node of an owned workspace.
///
/// Nodes without messages are skipped. A workspace with no nodes and a
/// workspace whose nodes are all empty fail with different errors.
pub fn aggregate(
    source: &dyn ConversationSource,
    workspace_id: RecordId,
    owner_id: RecordId,
) -> Result<AggregatedContent, AggregateError> {
    let workspace = source
        .workspace_for_owner(workspace_id, owner_id)?
        .ok_or(AggregateError::WorkspaceNotFound)?;

    let nodes = source.nodes_in_workspace(workspace_id, owner_id)?;
    if nodes.is_empty() {
        return Err(AggregateError::NoNodes);
    }

    let mut entries = Vec::with_capacity(nodes.len());
    for node in &nodes {
        match source.latest_message(node.id)? {
            Some(message) => entries.push(entry_for(node, message.sender, message.content)),
            None => debug!(node_id = %node.id, "Skipping node without messages"),
        }
    }

    if entries.is_empty() {
        return Err(AggregateError::NoMessages);
    }

    let text = render(&workspace.name, &entries);

    Ok(AggregatedContent {
        workspace_name: workspace.name,
        node_count: nodes.len(),
        entries,
        text,
    })
}

fn entry_for(node: &Node, sender: Sender, content: String) -> ConversationEntry {
    ConversationEntry {
        node_id: node.id,
        node_name: node.name.clone(),
        persona_id: node.persona_id,
        sender,
        content,
    }
}

/// Render entries in the fixed block template
pub fn render(workspace_name: &str, entries: &[ConversationEntry]) -> String {
    let heavy_rule = "=".repeat(RULE_WIDTH);
    let light_rule = "-".repeat(RULE_WIDTH);

    let mut text = format!("Workspace: {}\n\n{}\n\n", workspace_name, heavy_rule);
    for (idx, entry) in entries.iter().enumerate() {
        text.push_str(&format!(
            "=== Conversation {}: {} ===\n",
            idx + 1,
            entry.node_name
        ));
        text.push_str(&format!("Persona ID: {}\n", entry.persona_id));
        text.push_str(&format!("Sender: {}\n", entry.sender));
        text.push_str(&format!("Content:\n{}\n", entry.content));
        text.push_str(&format!("\n{}\n\n", light_rule));
    }
    text
}
