//! Stored claim record.

use rkyv::{Archive, Deserialize, Serialize};

use crate::error::Error;

/// A stored uniqueness claim.
///
/// The identity string is the tree key and is not repeated in the value.
#[derive(Debug, Clone, PartialEq, Archive, Serialize, Deserialize)]
pub struct ClaimRecord {
    /// Opaque 16-byte reference to the entity that owns this claim, if any.
    /// Never dereferenced by this crate.
    pub target: Option<[u8; 16]>,

    /// Creation timestamp in microseconds since Unix epoch.
    pub created_at: u64,
}

impl ClaimRecord {
    /// Create a new record with the current timestamp.
    pub fn new(target: Option<[u8; 16]>) -> Self {
        Self {
            target,
            created_at: current_timestamp(),
        }
    }

    /// Serialize the record to bytes using rkyv.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Error> {
        rkyv::to_bytes::<rkyv::rancor::Error>(self)
            .map(|v| v.to_vec())
            .map_err(|e| Error::Serialization(e.to_string()))
    }

    /// Deserialize a record from bytes using rkyv.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
            .map_err(|e| Error::Deserialization(e.to_string()))
    }
}

/// Get current timestamp in microseconds since Unix epoch.
pub(crate) fn current_timestamp() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system time before Unix epoch")
        .as_micros() as u64
}
