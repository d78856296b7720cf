//! The uniqueness registrar.
//!
//! Emulates a unique index on a store whose only global-consistency
//! guarantee is per-key. The whole constraint (kind, property, value) is
//! encoded into one primary key, so checking and claiming it are single-key
//! operations and no scan-based uniqueness check is ever needed.

use std::sync::Arc;

use tracing::debug;

use crate::error::Error;
use crate::identity::{Identity, Kind};
use crate::store::{ClaimRecord, Store, Transaction};
use crate::value::Value;

/// Handle to a registered uniqueness claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Claim {
    /// Identity string of the constraint.
    pub identity: Identity,

    /// Opaque reference to the owning entity, if recorded.
    pub target: Option<[u8; 16]>,
}

/// Registrar providing an at-most-once-per-identity registration primitive.
///
/// No locking, retries, or timeouts live here. Racing creators of one
/// identity are arbitrated solely by the store's transactional key-level
/// isolation; transient storage failures propagate to the caller, who owns
/// retry policy.
pub struct Registry {
    store: Arc<Store>,
}

impl Registry {
    /// Create a registrar over the given store.
    pub fn new(store: Arc<Store>) -> Self {
        Self { store }
    }

    /// Register a uniqueness claim in its own transaction.
    ///
    /// Reads the identity key and fails with [`Error::AlreadyExists`] if a
    /// claim is present, otherwise writes the record and commits. Losing a
    /// race to a concurrent creator surfaces as `AlreadyExists` too.
    pub fn create(
        &self,
        kind: impl Into<Kind>,
        property_name: &str,
        value: impl Into<Value>,
        target: Option<[u8; 16]>,
    ) -> Result<Claim, Error> {
        let identity = checked_identity(kind, property_name, value)?;

        self.store.run_in_transaction(|tx| {
            if tx.read(&identity)?.is_some() {
                debug!(identity = %identity, "uniqueness claim already taken");
                return Err(Error::AlreadyExists {
                    identity: identity.as_str().to_string(),
                });
            }
            tx.create(identity.clone(), ClaimRecord::new(target));
            Ok(())
        })?;

        debug!(identity = %identity, "uniqueness claim registered");
        Ok(Claim { identity, target })
    }

    /// Register a uniqueness claim inside a caller-owned transaction.
    ///
    /// Queues exactly one write and performs no existence check: a pre-read
    /// here would add cost without adding a guarantee, since the caller's
    /// transaction read/write set already determines the outcome. Caller
    /// contract: whoever enters a transaction intending to create a claim
    /// must have established, via reads earlier in the same transaction,
    /// that the constraint is free. Commit still aborts with
    /// [`Error::AlreadyExists`] if the key turns out to be taken.
    pub fn create_in(
        &self,
        tx: &mut Transaction<'_>,
        kind: impl Into<Kind>,
        property_name: &str,
        value: impl Into<Value>,
        target: Option<[u8; 16]>,
    ) -> Result<Claim, Error> {
        let identity = checked_identity(kind, property_name, value)?;
        tx.create(identity.clone(), ClaimRecord::new(target));
        Ok(Claim { identity, target })
    }

    /// Find a claim, if it exists.
    ///
    /// Computes the identity and does a direct point lookup; no transaction
    /// required.
    pub fn retrieve(
        &self,
        kind: impl Into<Kind>,
        property_name: &str,
        value: impl Into<Value>,
    ) -> Result<Option<Claim>, Error> {
        let identity = Identity::new(&kind.into(), property_name, &value.into())?;
        Ok(self.store.get(&identity)?.map(|record| Claim {
            identity,
            target: record.target,
        }))
    }

    /// Release a claim so the triple can be claimed again.
    ///
    /// Claim lifecycle is caller-driven: this is the primitive to use when
    /// the owning entity goes away. Releasing an absent claim is not an
    /// error.
    pub fn release(
        &self,
        kind: impl Into<Kind>,
        property_name: &str,
        value: impl Into<Value>,
    ) -> Result<(), Error> {
        let identity = Identity::new(&kind.into(), property_name, &value.into())?;
        self.store.remove(&identity)?;
        debug!(identity = %identity, "uniqueness claim released");
        Ok(())
    }

    /// Queue a claim release in a caller-owned transaction.
    ///
    /// Pairs with [`Registry::create_in`] to swap a claimed value
    /// atomically: release the old identity and create the new one in a
    /// single commit.
    pub fn release_in(
        &self,
        tx: &mut Transaction<'_>,
        kind: impl Into<Kind>,
        property_name: &str,
        value: impl Into<Value>,
    ) -> Result<Identity, Error> {
        let identity = Identity::new(&kind.into(), property_name, &value.into())?;
        tx.release(identity.clone());
        Ok(identity)
    }
}

/// Derive the identity for a create operation, rejecting null values.
fn checked_identity(
    kind: impl Into<Kind>,
    property_name: &str,
    value: impl Into<Value>,
) -> Result<Identity, Error> {
    let value = value.into();
    if value.is_null() {
        return Err(Error::InvalidValue);
    }
    Identity::new(&kind.into(), property_name, &value)
}
