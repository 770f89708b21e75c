//! Transaction handle.
//!
//! A [`StoreTxn`] wraps one pessimistic `RocksDB` transaction. Reads that
//! precede a write use `get_for_update`, which takes an exclusive row lock
//! (waiting at most the configured lock timeout) and sees the transaction's
//! own uncommitted writes. Nothing is visible to other readers until
//! [`StoreTxn::commit`]; dropping the handle rolls everything back.
//!
//! Domain operations live next to the data they touch: ledger operations in
//! `ledger`, stock in `stock`, codes in `codes`, batch checkpoints in
//! `batches`.

use rocksdb::{MultiThreaded, Transaction, TransactionDB};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::rocks::RocksStore;

/// An open store transaction.
pub struct StoreTxn<'a> {
    store: &'a RocksStore,
    txn: Transaction<'a, TransactionDB<MultiThreaded>>,
}

impl<'a> StoreTxn<'a> {
    pub(crate) fn new(store: &'a RocksStore, txn: Transaction<'a, TransactionDB<MultiThreaded>>) -> Self {
        Self { store, txn }
    }

    /// Lock a row and decode its value.
    pub(crate) fn get_for_update<T: DeserializeOwned>(
        &self,
        cf_name: &str,
        key: &[u8],
    ) -> Result<Option<T>> {
        let cf = self.store.cf(cf_name)?;
        self.txn
            .get_for_update_cf(&cf, key, true)?
            .map(|data| RocksStore::deserialize(&data))
            .transpose()
    }

    /// Check whether a row exists, locking it either way.
    ///
    /// Locking an absent key keeps concurrent transactions from inserting it
    /// until this one finishes.
    pub(crate) fn exists_for_update(&self, cf_name: &str, key: &[u8]) -> Result<bool> {
        let cf = self.store.cf(cf_name)?;
        Ok(self.txn.get_for_update_cf(&cf, key, true)?.is_some())
    }

    /// Encode and stage a value.
    pub(crate) fn put<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let bytes = RocksStore::serialize(value)?;
        self.put_raw(cf_name, key, &bytes)
    }

    /// Stage raw bytes (index entries).
    pub(crate) fn put_raw(&self, cf_name: &str, key: &[u8], value: &[u8]) -> Result<()> {
        let cf = self.store.cf(cf_name)?;
        self.txn.put_cf(&cf, key, value)?;
        Ok(())
    }

    /// Atomically apply every staged write.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Conflict` if the commit conflicted or timed out,
    /// `StoreError::Database` for any other failure. Either way nothing was
    /// applied.
    pub fn commit(self) -> Result<()> {
        self.txn.commit()?;
        Ok(())
    }

    /// Discard every staged write.
    ///
    /// Equivalent to dropping the handle, but reports failures.
    ///
    /// # Errors
    ///
    /// Returns an error if the rollback itself failed.
    pub fn rollback(self) -> Result<()> {
        self.txn.rollback()?;
        Ok(())
    }
}
