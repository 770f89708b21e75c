//! Stock counters.

use chrono::Utc;

use vouchr_core::{ProductKey, ProductStock};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::cf;
use crate::txn::StoreTxn;

impl StoreTxn<'_> {
    /// Lock a stock row.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock times out or the record cannot be read.
    pub fn lock_stock(&self, product_key: &ProductKey) -> Result<Option<ProductStock>> {
        self.get_for_update(cf::STOCK, &keys::stock_key(product_key))
    }

    /// Stage a stock write, replacing any previous count.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written.
    pub fn put_stock(&self, stock: &ProductStock) -> Result<()> {
        self.put(cf::STOCK, &keys::stock_key(&stock.key), stock)
    }

    /// Take `quantity` units if that many are available.
    ///
    /// Returns the units left after the reservation. A product that was
    /// never stocked has nothing to reserve.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::OutOfStock` if fewer than `quantity` remain.
    pub fn try_reserve(&self, product_key: &ProductKey, quantity: u64) -> Result<u64> {
        let Some(mut stock) = self.lock_stock(product_key)? else {
            return Err(StoreError::OutOfStock {
                product_key: product_key.to_string(),
                available: 0,
                requested: quantity,
            });
        };

        if !stock.can_reserve(quantity) {
            return Err(StoreError::OutOfStock {
                product_key: product_key.to_string(),
                available: stock.available,
                requested: quantity,
            });
        }

        stock.available -= quantity;
        stock.updated_at = Utc::now();
        self.put_stock(&stock)?;
        Ok(stock.available)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use crate::{RocksStore, Store};

    use super::*;

    fn stocked_store(count: u64) -> (RocksStore, TempDir, ProductKey) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        let key: ProductKey = "eload:100".parse().unwrap();
        store.put_stock(&ProductStock::new(key.clone(), count)).unwrap();
        (store, dir, key)
    }

    #[test]
    fn reserve_decrements() {
        let (store, _dir, key) = stocked_store(10);

        let txn = store.begin();
        assert_eq!(txn.try_reserve(&key, 4).unwrap(), 6);
        assert_eq!(txn.try_reserve(&key, 6).unwrap(), 0);
        txn.commit().unwrap();

        assert_eq!(store.get_available(&key).unwrap(), 0);
    }

    #[test]
    fn reserve_more_than_available_fails() {
        let (store, _dir, key) = stocked_store(3);

        let txn = store.begin();
        let err = txn.try_reserve(&key, 4).unwrap_err();
        assert!(matches!(
            err,
            StoreError::OutOfStock {
                available: 3,
                requested: 4,
                ..
            }
        ));
        drop(txn);

        assert_eq!(store.get_available(&key).unwrap(), 3);
    }

    #[test]
    fn unstocked_product_is_out_of_stock() {
        let (store, _dir, _) = stocked_store(3);
        let other: ProductKey = "gsat:90d".parse().unwrap();

        let txn = store.begin();
        assert!(matches!(
            txn.try_reserve(&other, 1),
            Err(StoreError::OutOfStock { available: 0, .. })
        ));
    }
}
