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

//! Record identifiers.
//!
//! A `RecordId` is 12 bytes rendered as 24 lowercase hex characters:
//! a 4-byte big-endian Unix timestamp (seconds) followed by an 8-byte
//! big-endian sequence number. Ids issued by one `IdGenerator` are strictly
//! increasing, so sorting by id yields creation order.

use parking_lot::Mutex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Length of a record id in bytes
pub const RECORD_ID_BYTES: usize = 12;

/// Length of a record id in its hex form
pub const RECORD_ID_HEX_LEN: usize = RECORD_ID_BYTES * 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordId([u8; RECORD_ID_BYTES]);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid record id '{0}': expected 24 hexadecimal characters")]
pub struct InvalidRecordId(pub String);

impl RecordId {
    pub fn from_parts(timestamp_secs: u32, sequence: u64) -> Self {
        let mut bytes = [0u8; RECORD_ID_BYTES];
        bytes[..4].copy_from_slice(&timestamp_secs.to_be_bytes());
        bytes[4..].copy_from_slice(&sequence.to_be_bytes());
        Self(bytes)
    }

    pub fn timestamp_secs(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    pub fn sequence(&self) -> u64 {
        let mut seq = [0u8; 8];
        seq.copy_from_slice(&self.0[4..]);
        u64::from_be_bytes(seq)
    }

    /// Check whether `raw` is in the id format without allocating an id
    pub fn is_valid(raw: &str) -> bool {
        raw.len() == RECORD_ID_HEX_LEN && raw.bytes().all(|b| b.is_ascii_hexdigit())
    }
}

impl FromStr for RecordId {
    type Err = InvalidRecordId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !Self::is_valid(s) {
            return Err(InvalidRecordId(s.to_string()));
        }

        let mut bytes = [0u8; RECORD_ID_BYTES];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| InvalidRecordId(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Issues strictly increasing record ids.
///
/// The timestamp half never moves backwards even if the wall clock does,
/// and the sequence half increments on every call.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: Mutex<(u32, u64)>,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure every future id sorts after `id`
    pub fn observe(&self, id: RecordId) {
        let mut last = self.last.lock();
        last.0 = last.0.max(id.timestamp_secs());
        last.1 = last.1.max(id.sequence());
    }

    pub fn next_id(&self) -> RecordId {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);

        let mut last = self.last.lock();
        let secs = now.max(last.0);
        let seq = last.1 + 1;
        *last = (secs, seq);

        RecordId::from_parts(secs, seq)
    }
}
