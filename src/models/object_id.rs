//! Document identifiers.
//!
//! Every stored record (expense, budget, goal, wallet) is addressed by a
//! 24-character hexadecimal identifier. Identifiers are generated in
//! application code when a record is inserted, never by the database: each
//! expense store calls [`ObjectId::generate`] in its `insert`, and the budget,
//! goal and wallet services do the same in their `create_*` functions.
//!
//! # Layout
//!
//! 12 bytes, hex encoded:
//! - 4 bytes: seconds since the Unix epoch (big endian)
//! - 5 bytes: random value chosen once per process
//! - 3 bytes: counter, starting at a random value
//!
//! Identifiers generated by one process therefore sort by creation second.

use std::{
    fmt,
    str::FromStr,
    sync::{
        OnceLock,
        atomic::{AtomicU32, Ordering},
    },
};

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Length of an encoded identifier.
pub const OBJECT_ID_LEN: usize = 24;

/// A validated 24-character lowercase hexadecimal identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(try_from = "String", into = "String")]
#[sqlx(transparent)]
pub struct ObjectId(String);

/// Returned when a string is not a valid identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid identifier")]
pub struct InvalidObjectId;

impl ObjectId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        static PROCESS_UNIQUE: OnceLock<[u8; 5]> = OnceLock::new();
        static COUNTER: OnceLock<AtomicU32> = OnceLock::new();

        let process = PROCESS_UNIQUE.get_or_init(rand::random::<[u8; 5]>);
        let counter = COUNTER
            .get_or_init(|| AtomicU32::new(rand::random::<u32>()))
            .fetch_add(1, Ordering::Relaxed);
        let seconds = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;

        let mut bytes = [0u8; 12];
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        bytes[4..9].copy_from_slice(process);
        // Only the low 24 bits of the counter are kept.
        bytes[9..].copy_from_slice(&counter.to_be_bytes()[1..]);

        Self(hex::encode(bytes))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ObjectId {
    type Err = InvalidObjectId;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        if value.len() == OBJECT_ID_LEN && value.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(Self(value.to_ascii_lowercase()))
        } else {
            Err(InvalidObjectId)
        }
    }
}

impl TryFrom<String> for ObjectId {
    type Error = InvalidObjectId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
