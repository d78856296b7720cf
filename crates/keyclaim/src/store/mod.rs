//! Sled-backed claims store.
//!
//! This module provides the storage surface the registrar relies on:
//! strongly consistent point reads and atomic transactions over the claims
//! tree.

mod config;
mod engine;
mod record;
mod transaction;

pub use config::StoreConfig;
pub use engine::Store;
pub use record::ClaimRecord;
pub use transaction::{ClaimOp, Transaction};
