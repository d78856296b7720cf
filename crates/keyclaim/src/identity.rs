//! Identity derivation for uniqueness constraints.
//!
//! A constraint on (kind, property, value) is encoded into a single string
//! that doubles as the primary key of the claims tree. That turns "is there
//! already an entity of kind X with property Y = Z" into a point lookup on
//! one key, the only operation the store guarantees atomic global
//! consistency for.

use std::fmt;

use crate::error::Error;
use crate::value::Value;

/// Separator between the kind, property name, and value parts.
pub const SEPARATOR: char = ':';

/// Capability for types that know the kind name they are stored under.
pub trait KindNamed {
    /// Kind name this type maps to.
    fn kind_name() -> &'static str;
}

/// The kind part of a uniqueness constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    /// Kind named directly.
    Literal(String),
    /// Kind taken from a type descriptor.
    Described(&'static str),
}

impl Kind {
    /// Kind of a type that declares its own name.
    pub fn of<T: KindNamed>() -> Self {
        Kind::Described(T::kind_name())
    }

    /// Resolve the kind name.
    ///
    /// The empty name is the one invalid shape left representable, and is
    /// rejected with [`Error::InvalidKind`].
    pub fn name(&self) -> Result<&str, Error> {
        let name = match self {
            Kind::Literal(s) => s.as_str(),
            Kind::Described(s) => s,
        };
        if name.is_empty() {
            return Err(Error::InvalidKind);
        }
        Ok(name)
    }
}

impl From<&str> for Kind {
    fn from(name: &str) -> Self {
        Kind::Literal(name.to_string())
    }
}

impl From<String> for Kind {
    fn from(name: String) -> Self {
        Kind::Literal(name)
    }
}

/// Identity string of a uniqueness constraint: `kind:property:value`.
///
/// Deterministic, and injective over (kind, property, value) triples as long
/// as no part embeds the separator. No escaping is performed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Derive the identity for a constraint.
    ///
    /// Total over values: null renders as `null`. Rejecting null is a
    /// registration precondition, not a derivation concern. Fails only when
    /// the kind name is empty.
    pub fn new(kind: &Kind, property_name: &str, value: &Value) -> Result<Self, Error> {
        let kind = kind.name()?;
        Ok(Self(format!(
            "{kind}{SEPARATOR}{property_name}{SEPARATOR}{value}"
        )))
    }

    /// The identity as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The identity as the key bytes used in the claims tree.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Consume into the underlying string.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
