//! Transaction support for atomic claim operations.

use std::collections::HashMap;

use sled::transaction::{ConflictableTransactionError, TransactionError};

use super::{ClaimRecord, Store};
use crate::error::Error;
use crate::identity::Identity;

/// A pending operation in a transaction.
#[derive(Debug, Clone)]
pub enum ClaimOp {
    /// Create a claim. Commit aborts if the identity is already taken.
    Create {
        /// Claim identity.
        identity: Identity,
        /// Record to store.
        record: ClaimRecord,
    },
    /// Release a claim.
    Release {
        /// Claim identity.
        identity: Identity,
    },
}

/// A transaction over the claims tree.
///
/// Operations are collected and executed atomically on commit. Reads see
/// uncommitted writes queued in the same transaction.
pub struct Transaction<'a> {
    store: &'a Store,
    ops: Vec<ClaimOp>,
    /// Identities read from the store in this transaction, with the
    /// presence observed at read time.
    pub(crate) read_set: HashMap<Identity, bool>,
    /// Local cache for uncommitted writes (identity -> record or removal).
    write_cache: HashMap<Identity, Option<ClaimRecord>>,
}

impl<'a> Transaction<'a> {
    /// Create a new transaction.
    pub(crate) fn new(store: &'a Store) -> Self {
        Self {
            store,
            ops: Vec::new(),
            read_set: HashMap::new(),
            write_cache: HashMap::new(),
        }
    }

    /// Read a claim within the transaction.
    ///
    /// Returns uncommitted writes from this transaction if present,
    /// otherwise reads the store and records the observation.
    pub fn read(&mut self, identity: &Identity) -> Result<Option<ClaimRecord>, Error> {
        if let Some(cached) = self.write_cache.get(identity) {
            return Ok(cached.clone());
        }

        let record = self.store.get(identity)?;
        self.read_set.insert(identity.clone(), record.is_some());
        Ok(record)
    }

    /// Queue a claim creation.
    pub fn create(&mut self, identity: Identity, record: ClaimRecord) -> &mut Self {
        self.write_cache.insert(identity.clone(), Some(record.clone()));
        self.ops.push(ClaimOp::Create { identity, record });
        self
    }

    /// Queue a claim release.
    pub fn release(&mut self, identity: Identity) -> &mut Self {
        self.write_cache.insert(identity.clone(), None);
        self.ops.push(ClaimOp::Release { identity });
        self
    }

    /// Get the pending operations.
    pub fn operations(&self) -> &[ClaimOp] {
        &self.ops
    }

    /// Get the number of pending operations.
    pub fn operation_count(&self) -> usize {
        self.ops.len()
    }

    /// Number of store reads performed by this transaction.
    pub fn read_count(&self) -> usize {
        self.read_set.len()
    }

    /// Commit the transaction atomically.
    ///
    /// All operations succeed or none do. A queued create that finds its key
    /// present at commit time aborts the whole transaction with
    /// [`Error::AlreadyExists`]; per-tree serializability makes this the
    /// store-native arbiter between racing creators.
    pub fn commit(self) -> Result<(), Error> {
        if self.ops.is_empty() {
            return Ok(());
        }

        let claims_tree = self.store.claims_tree();

        let result: Result<(), TransactionError<Error>> = claims_tree.transaction(|tx| {
            for op in &self.ops {
                match op {
                    ClaimOp::Create { identity, record } => {
                        if tx.get(identity.as_bytes())?.is_some() {
                            return Err(ConflictableTransactionError::Abort(
                                Error::AlreadyExists {
                                    identity: identity.as_str().to_string(),
                                },
                            ));
                        }
                        let bytes = record
                            .to_bytes()
                            .map_err(ConflictableTransactionError::Abort)?;
                        tx.insert(identity.as_bytes(), bytes)?;
                    }
                    ClaimOp::Release { identity } => {
                        tx.remove(identity.as_bytes())?;
                    }
                }
            }
            Ok(())
        });

        match result {
            Ok(()) => Ok(()),
            Err(TransactionError::Abort(e)) => Err(e),
            Err(TransactionError::Storage(e)) => Err(Error::Storage(e)),
        }
    }

    /// Rollback the transaction (discard all pending operations).
    pub fn rollback(self) {
        drop(self.ops);
    }
}

impl Store {
    /// Begin a new transaction.
    pub fn transaction(&self) -> Transaction<'_> {
        Transaction::new(self)
    }

    /// Run a unit of work inside a new transaction and commit it.
    ///
    /// If the closure fails, the transaction is dropped and nothing is
    /// written.
    pub fn run_in_transaction<T, F>(&self, f: F) -> Result<T, Error>
    where
        F: FnOnce(&mut Transaction<'_>) -> Result<T, Error>,
    {
        let mut tx = self.transaction();
        let value = f(&mut tx)?;
        tx.commit()?;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Kind;
    use crate::store::StoreConfig;
    use crate::value::Value;

    fn test_store() -> Store {
        Store::open(StoreConfig::temporary()).unwrap()
    }

    fn ident(value: &str) -> Identity {
        Identity::new(&Kind::from("User"), "email", &Value::from(value)).unwrap()
    }

    #[test]
    fn test_commit_creates() {
        let store = test_store();
        let a = ident("a@example.com");
        let b = ident("b@example.com");

        let mut tx = store.transaction();
        tx.create(a.clone(), ClaimRecord::new(None));
        tx.create(b.clone(), ClaimRecord::new(None));
        tx.commit().unwrap();

        assert!(store.get(&a).unwrap().is_some());
        assert!(store.get(&b).unwrap().is_some());
    }

    #[test]
    fn test_create_conflict_aborts_all() {
        let store = test_store();
        let taken = ident("taken@example.com");
        let fresh = ident("fresh@example.com");

        let mut tx = store.transaction();
        tx.create(taken.clone(), ClaimRecord::new(None));
        tx.commit().unwrap();

        // Second transaction queues one fresh and one conflicting create
        let mut tx = store.transaction();
        tx.create(fresh.clone(), ClaimRecord::new(None));
        tx.create(taken.clone(), ClaimRecord::new(None));
        let err = tx.commit().unwrap_err();

        assert!(err.is_already_exists());
        match err {
            Error::AlreadyExists { identity } => assert_eq!(identity, taken.as_str()),
            other => panic!("unexpected error: {other}"),
        }

        // The fresh create must not have survived the abort
        assert!(store.get(&fresh).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_create_in_same_tx() {
        let store = test_store();
        let identity = ident("a@example.com");

        let mut tx = store.transaction();
        tx.create(identity.clone(), ClaimRecord::new(None));
        tx.create(identity.clone(), ClaimRecord::new(None));

        assert!(tx.commit().unwrap_err().is_already_exists());
        assert!(store.get(&identity).unwrap().is_none());
    }

    #[test]
    fn test_read_your_writes() {
        let store = test_store();
        let identity = ident("a@example.com");

        let mut tx = store.transaction();
        tx.create(identity.clone(), ClaimRecord::new(Some([9u8; 16])));

        let record = tx.read(&identity).unwrap().unwrap();
        assert_eq!(record.target, Some([9u8; 16]));

        // Cache hits are not store reads
        assert_eq!(tx.read_count(), 0);
    }

    #[test]
    fn test_read_tracks_observations() {
        let store = test_store();
        let present = ident("present@example.com");
        let absent = ident("absent@example.com");

        let mut tx = store.transaction();
        tx.create(present.clone(), ClaimRecord::new(None));
        tx.commit().unwrap();

        let mut tx = store.transaction();
        assert!(tx.read(&present).unwrap().is_some());
        assert!(tx.read(&absent).unwrap().is_none());
        assert_eq!(tx.read_count(), 2);
        assert_eq!(tx.read_set.get(&present), Some(&true));
        assert_eq!(tx.read_set.get(&absent), Some(&false));
    }

    #[test]
    fn test_release_and_swap() {
        let store = test_store();
        let old = ident("old@example.com");
        let new = ident("new@example.com");

        let mut tx = store.transaction();
        tx.create(old.clone(), ClaimRecord::new(None));
        tx.commit().unwrap();

        // Swap the claimed value atomically
        let mut tx = store.transaction();
        tx.release(old.clone());
        tx.create(new.clone(), ClaimRecord::new(None));
        assert_eq!(tx.operation_count(), 2);
        tx.commit().unwrap();

        assert!(store.get(&old).unwrap().is_none());
        assert!(store.get(&new).unwrap().is_some());
    }

    #[test]
    fn test_release_is_visible_to_reads() {
        let store = test_store();
        let identity = ident("a@example.com");

        let mut tx = store.transaction();
        tx.create(identity.clone(), ClaimRecord::new(None));
        tx.commit().unwrap();

        let mut tx = store.transaction();
        tx.release(identity.clone());
        assert!(tx.read(&identity).unwrap().is_none());
    }

    #[test]
    fn test_run_in_transaction() {
        let store = test_store();
        let identity = ident("a@example.com");

        store
            .run_in_transaction(|tx| {
                tx.create(identity.clone(), ClaimRecord::new(None));
                Ok(())
            })
            .unwrap();
        assert!(store.get(&identity).unwrap().is_some());

        // A failing unit of work writes nothing
        let other = ident("b@example.com");
        let result: Result<(), Error> = store.run_in_transaction(|tx| {
            tx.create(other.clone(), ClaimRecord::new(None));
            Err(Error::InvalidValue)
        });
        assert!(matches!(result, Err(Error::InvalidValue)));
        assert!(store.get(&other).unwrap().is_none());
    }

    #[test]
    fn test_rollback() {
        let store = test_store();
        let identity = ident("a@example.com");

        let mut tx = store.transaction();
        tx.create(identity.clone(), ClaimRecord::new(None));
        tx.rollback();

        assert!(store.get(&identity).unwrap().is_none());
    }

    #[test]
    fn test_empty_commit() {
        let store = test_store();
        store.transaction().commit().unwrap();
    }
}
