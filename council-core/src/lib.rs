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

//! Council Core
//!
//! Shared records for the Council workspace service:
//! - Record identifiers whose ordering follows creation order
//! - Users, workspaces, nodes and messages
//! - The fixed persona catalogue
//! - A read-only view of the store consumed by the summary pipeline

pub mod id;
pub mod model;
pub mod persona;
pub mod source;

pub use id::{IdGenerator, InvalidRecordId, RecordId};
pub use model::{InvalidSender, Message, Node, Sender, User, Workspace};
pub use persona::{Persona, ORCHESTRATOR_PERSONA_ID, PERSONAS};
pub use source::{ConversationSource, StoreError};
