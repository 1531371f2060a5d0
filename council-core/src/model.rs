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

use crate::id::RecordId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: RecordId,
    pub email: String,
    /// bcrypt hash, never serialized into API responses
    pub password_hash: String,
}

/// Top-level container owned by one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: RecordId,
    pub owner_id: RecordId,
    pub name: String,
}

/// Conversation thread inside a workspace, bound to one persona.
///
/// `owner_id` duplicates the workspace owner so ownership checks on a node
/// need no workspace lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: RecordId,
    pub owner_id: RecordId,
    pub workspace_id: RecordId,
    pub name: String,
    pub persona_id: u8,
}

/// Author of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    #[serde(rename = "AI")]
    Ai,
    You,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Sender must be 'AI' or 'You', got '{0}'")]
pub struct InvalidSender(pub String);

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::Ai => "AI",
            Sender::You => "You",
        }
    }
}

impl FromStr for Sender {
    type Err = InvalidSender;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AI" => Ok(Sender::Ai),
            "You" => Ok(Sender::You),
            other => Err(InvalidSender(other.to_string())),
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: RecordId,
    pub node_id: RecordId,
    pub sender: Sender,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sender_parsing_is_exact() {
        assert_eq!("AI".parse::<Sender>().unwrap(), Sender::Ai);
        assert_eq!("You".parse::<Sender>().unwrap(), Sender::You);
        assert!("ai".parse::<Sender>().is_err());
        assert!("Bot".parse::<Sender>().is_err());
    }

    #[test]
    fn test_sender_serializes_as_tag() {
        assert_eq!(serde_json::to_string(&Sender::Ai).unwrap(), "\"AI\"");
        assert_eq!(serde_json::to_string(&Sender::You).unwrap(), "\"You\"");
    }
}
