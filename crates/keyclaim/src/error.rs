//! Crate error types.

use thiserror::Error;

/// Errors produced by the store and the registrar.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Kind did not resolve to a usable name.
    #[error("kind must resolve to a non-empty name")]
    InvalidKind,

    /// Null values cannot take part in a uniqueness constraint.
    #[error("value must not be null")]
    InvalidValue,

    /// The constraint is already claimed.
    #[error("uniqueness claim already exists: {identity}")]
    AlreadyExists {
        /// Identity string of the conflicting claim.
        identity: String,
    },
}

impl Error {
    /// True for the expected constraint-violation outcome.
    ///
    /// Callers should treat this as "insert failed because it would violate
    /// uniqueness", not as an infrastructure failure.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::AlreadyExists { .. })
    }
}
