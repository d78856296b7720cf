//! Claims store implementation.

use sled::{Db, Tree};

use super::{ClaimRecord, StoreConfig};
use crate::error::Error;
use crate::identity::Identity;

/// Tree name for uniqueness claims.
const CLAIMS_TREE: &str = "claims";

/// The claims store wrapping sled.
///
/// A point read on a single key is strongly consistent, which is the only
/// global guarantee the registrar builds on.
pub struct Store {
    /// The underlying sled database.
    db: Db,

    /// Tree holding identity -> claim record.
    claims_tree: Tree,
}

impl Store {
    /// Open or create a store with the given configuration.
    pub fn open(config: StoreConfig) -> Result<Self, Error> {
        let sled_config = config.to_sled_config();
        let db = sled_config.open()?;
        let claims_tree = db.open_tree(CLAIMS_TREE)?;

        Ok(Self { db, claims_tree })
    }

    /// Point lookup of a claim by its identity.
    pub fn get(&self, identity: &Identity) -> Result<Option<ClaimRecord>, Error> {
        match self.claims_tree.get(identity.as_bytes())? {
            Some(bytes) => Ok(Some(ClaimRecord::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Remove a claim by its identity.
    ///
    /// A single-key removal; needs no transaction.
    pub fn remove(&self, identity: &Identity) -> Result<(), Error> {
        self.claims_tree.remove(identity.as_bytes())?;
        Ok(())
    }

    /// Number of stored claims.
    pub fn len(&self) -> usize {
        self.claims_tree.len()
    }

    /// Check if the store holds no claims.
    pub fn is_empty(&self) -> bool {
        self.claims_tree.is_empty()
    }

    /// Flush all pending writes to disk.
    pub fn flush(&self) -> Result<(), Error> {
        self.db.flush()?;
        Ok(())
    }

    /// Get access to the claims tree (for transactions).
    pub(crate) fn claims_tree(&self) -> &Tree {
        &self.claims_tree
    }
}
