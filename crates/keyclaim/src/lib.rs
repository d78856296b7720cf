//! Keyclaim - unique-constraint records for embedded key-value stores.
//!
//! Key-value stores guarantee strong consistency for single-key operations,
//! not "property X is globally unique". This crate emulates a unique index
//! by encoding an entire constraint (kind, property name, value) into one
//! primary key, so claiming and checking a constraint are transactional
//! single-key operations.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod error;
pub mod identity;
pub mod registry;
pub mod store;
pub mod value;

pub use error::Error;
pub use identity::{Identity, Kind, KindNamed, SEPARATOR};
pub use registry::{Claim, Registry};
pub use store::{ClaimOp, ClaimRecord, Store, StoreConfig, Transaction};
pub use value::Value;
