//! `RocksDB` storage implementation.
//!
//! The database is opened as a pessimistic `TransactionDB`: every
//! read-modify-write goes through [`StoreTxn`], which takes row locks with
//! `get_for_update` and commits all writes at once.

use std::path::Path;
use std::sync::Arc;

use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, Direction, IteratorMode, MultiThreaded, Options,
    TransactionDB, TransactionDBOptions,
};
use rust_decimal::Decimal;

use vouchr_core::{
    BatchCheckpoint, CreditAccount, CreditTransaction, IssuedCode, ProductKey, ProductStock,
    RedemptionCode, RequestId, TransactionId, TransactionType, UserId,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::txn::StoreTxn;
use crate::Store;

/// Default time a transaction waits for a row lock before failing.
pub const DEFAULT_LOCK_TIMEOUT_MS: i64 = 1000;

/// Storage tuning.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// How long a transaction waits for a row lock, in milliseconds.
    pub lock_timeout_ms: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: DEFAULT_LOCK_TIMEOUT_MS,
        }
    }
}

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<TransactionDB<MultiThreaded>>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, &StoreConfig::default())
    }

    /// Open or create a database with explicit tuning.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open_with<P: AsRef<Path>>(path: P, config: &StoreConfig) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let mut txn_opts = TransactionDBOptions::default();
        txn_opts.set_txn_lock_timeout(config.lock_timeout_ms);
        txn_opts.set_default_lock_timeout(config.lock_timeout_ms);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db: TransactionDB<MultiThreaded> =
            TransactionDB::open_cf_descriptors(&opts, &txn_opts, path, cf_descriptors)
                .map_err(|e| StoreError::Database(e.to_string()))?;

        tracing::debug!(lock_timeout_ms = config.lock_timeout_ms, "Opened vouchr store");

        Ok(Self { db: Arc::new(db) })
    }

    /// Start a transaction.
    ///
    /// Dropping the returned handle without calling [`StoreTxn::commit`]
    /// discards every write made through it.
    #[must_use]
    pub fn begin(&self) -> StoreTxn<'_> {
        StoreTxn::new(self, self.db.transaction())
    }

    /// Get a column family handle.
    pub(crate) fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    pub(crate) fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    pub(crate) fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// Read and decode one record outside any transaction.
    fn get<T: serde::de::DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    /// Collect index keys under `prefix`, newest first, and page through them.
    fn page_index(
        &self,
        cf_name: &str,
        prefix: &[u8],
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Vec<u8>>> {
        let cf = self.cf(cf_name)?;
        let iter = self
            .db
            .iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward));

        let mut all_keys: Vec<Vec<u8>> = Vec::new();
        for item in iter {
            let (key, _) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            all_keys.push(key.to_vec());
        }

        // Index keys embed ULIDs, so reversing gives newest first
        all_keys.reverse();

        Ok(all_keys.into_iter().skip(offset).take(limit).collect())
    }
}

impl Store for RocksStore {
    // =========================================================================
    // Account Operations
    // =========================================================================

    fn create_account(&self, account: &CreditAccount) -> Result<()> {
        let txn = self.begin();
        if txn.lock_account(&account.user_id)?.is_some() {
            return Err(StoreError::AlreadyExists {
                entity: "account",
                id: account.user_id.to_string(),
            });
        }
        txn.put_account(account)?;
        txn.commit()?;

        tracing::debug!(user_id = %account.user_id, role = %account.role, "Account created");
        Ok(())
    }

    fn get_account(&self, user_id: &UserId) -> Result<Option<CreditAccount>> {
        self.get(cf::ACCOUNTS, &keys::account_key(user_id))
    }

    fn get_balance(&self, user_id: &UserId) -> Result<Decimal> {
        self.get_account(user_id)?
            .map(|account| account.balance)
            .ok_or_else(|| StoreError::NotFound {
                entity: "account",
                id: user_id.to_string(),
            })
    }

    fn credit(
        &self,
        user_id: &UserId,
        amount: Decimal,
        transaction_type: TransactionType,
        description: &str,
    ) -> Result<CreditTransaction> {
        let txn = self.begin();
        let entry = txn.credit(user_id, amount, transaction_type, description)?;
        txn.commit()?;
        Ok(entry)
    }

    // =========================================================================
    // Stock Operations
    // =========================================================================

    fn put_stock(&self, stock: &ProductStock) -> Result<()> {
        let txn = self.begin();
        txn.put_stock(stock)?;
        txn.commit()
    }

    fn get_stock(&self, product_key: &ProductKey) -> Result<Option<ProductStock>> {
        self.get(cf::STOCK, &keys::stock_key(product_key))
    }

    fn get_available(&self, product_key: &ProductKey) -> Result<u64> {
        self.get_stock(product_key)?
            .map(|stock| stock.available)
            .ok_or_else(|| StoreError::NotFound {
                entity: "product",
                id: product_key.to_string(),
            })
    }

    // =========================================================================
    // Code Operations
    // =========================================================================

    fn get_code(&self, code: &RedemptionCode) -> Result<Option<IssuedCode>> {
        self.get(cf::CODES, &keys::code_key(code))
    }

    fn list_codes_by_owner(
        &self,
        owner_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<IssuedCode>> {
        let prefix = keys::owner_codes_prefix(owner_id);
        let index_keys = self.page_index(cf::CODES_BY_OWNER, &prefix, limit, offset)?;

        let mut codes = Vec::with_capacity(index_keys.len());
        for key in index_keys {
            let Some(code) = keys::extract_code_from_owner_key(&key) else {
                tracing::warn!(owner_id = %owner_id, "Skipping malformed owner index key");
                continue;
            };
            if let Some(issued) = self.get_code(&code)? {
                codes.push(issued);
            }
        }
        Ok(codes)
    }

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<CreditTransaction>> {
        self.get(cf::TRANSACTIONS, &keys::transaction_key(transaction_id))
    }

    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CreditTransaction>> {
        let prefix = keys::user_transactions_prefix(user_id);
        let index_keys = self.page_index(cf::TRANSACTIONS_BY_USER, &prefix, limit, offset)?;

        let mut transactions = Vec::with_capacity(index_keys.len());
        for key in index_keys {
            let Some(tx_id) = keys::extract_transaction_id_from_user_key(&key) else {
                tracing::warn!(user_id = %user_id, "Skipping malformed transaction index key");
                continue;
            };
            if let Some(tx) = self.get_transaction(&tx_id)? {
                transactions.push(tx);
            }
        }
        Ok(transactions)
    }

    // =========================================================================
    // Batch Operations
    // =========================================================================

    fn get_batch(&self, request_id: &RequestId) -> Result<Option<BatchCheckpoint>> {
        self.get(cf::BATCHES, &keys::batch_key(request_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use vouchr_core::{IssuanceId, MemberRole, PaymentMethod};

    fn create_test_store() -> (RocksStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = RocksStore::open(dir.path()).unwrap();
        (store, dir)
    }

    #[test]
    fn account_create_and_read() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();
        let account = CreditAccount::new(user_id, MemberRole::Reseller, 1);

        store.create_account(&account).unwrap();

        let retrieved = store.get_account(&user_id).unwrap().unwrap();
        assert_eq!(retrieved.role, MemberRole::Reseller);
        assert_eq!(store.get_balance(&user_id).unwrap(), Decimal::ZERO);

        let again = store.create_account(&account);
        assert!(matches!(again, Err(StoreError::AlreadyExists { .. })));
    }

    #[test]
    fn balance_of_unknown_user_is_not_found() {
        let (store, _dir) = create_test_store();
        let result = store.get_balance(&UserId::generate());
        assert!(matches!(
            result,
            Err(StoreError::NotFound {
                entity: "account",
                ..
            })
        ));
    }

    #[test]
    fn stock_put_and_get() {
        let (store, _dir) = create_test_store();
        let key: ProductKey = "tv:30d".parse().unwrap();

        assert!(matches!(
            store.get_available(&key),
            Err(StoreError::NotFound { entity: "product", .. })
        ));

        store.put_stock(&ProductStock::new(key.clone(), 25)).unwrap();
        assert_eq!(store.get_available(&key).unwrap(), 25);
    }

    #[test]
    fn credit_records_ledger_entries_newest_first() {
        let (store, _dir) = create_test_store();
        let user_id = UserId::generate();
        store
            .create_account(&CreditAccount::new(user_id, MemberRole::Dealer, 1))
            .unwrap();

        store
            .credit(&user_id, Decimal::from(500), TransactionType::TopUp, "Top-up 1")
            .unwrap();
        std::thread::sleep(std::time::Duration::from_millis(2));
        store
            .credit(&user_id, Decimal::from(250), TransactionType::TopUp, "Top-up 2")
            .unwrap();

        assert_eq!(store.get_balance(&user_id).unwrap(), Decimal::from(750));

        let transactions = store.list_transactions_by_user(&user_id, 10, 0).unwrap();
        assert_eq!(transactions.len(), 2);
        assert_eq!(transactions[0].description, "Top-up 2");
        assert_eq!(transactions[0].balance_after, Decimal::from(750));
        assert_eq!(transactions[1].description, "Top-up 1");

        let page2 = store.list_transactions_by_user(&user_id, 1, 1).unwrap();
        assert_eq!(page2.len(), 1);
        assert_eq!(page2[0].description, "Top-up 1");
    }

    #[test]
    fn codes_listed_by_owner() {
        let (store, _dir) = create_test_store();
        let owner = UserId::generate();
        let key: ProductKey = "wifi:1d".parse().unwrap();
        let issuance = IssuanceId::generate();

        let txn = store.begin();
        for raw in ["WFAAAA0001", "WFAAAA0002"] {
            let code = IssuedCode::new(
                raw.parse().unwrap(),
                owner,
                key.clone(),
                Decimal::from(20),
                issuance,
                chrono::Utc::now(),
            );
            assert!(txn.insert_code_if_absent(&code).unwrap());
        }
        txn.commit().unwrap();

        let codes = store.list_codes_by_owner(&owner, 10, 0).unwrap();
        assert_eq!(codes.len(), 2);
        assert!(codes.iter().all(|c| c.owner_id == owner));
        assert!(store.list_codes_by_owner(&UserId::generate(), 10, 0).unwrap().is_empty());
    }

    #[test]
    fn dropped_transaction_writes_nothing() {
        let (store, _dir) = create_test_store();
        let key: ProductKey = "gsat:90d".parse().unwrap();

        {
            let txn = store.begin();
            txn.put_stock(&ProductStock::new(key.clone(), 5)).unwrap();
        }

        assert!(store.get_stock(&key).unwrap().is_none());
    }

    #[test]
    fn batch_records_live_apart_from_the_checkpoint() {
        let (store, _dir) = create_test_store();
        let request_id: RequestId = "order-9".parse().unwrap();
        let mut checkpoint = BatchCheckpoint::new(
            request_id.clone(),
            UserId::generate(),
            "tv:30d".parse().unwrap(),
            Decimal::from(99),
            PaymentMethod::Credits,
            40,
        );

        let mut encoded_sizes = Vec::new();
        for batch in 0..4u32 {
            let codes: Vec<RedemptionCode> = (0..10)
                .map(|i| format!("TV{batch:04}{i:04}").parse().unwrap())
                .collect();
            let txn = store.begin();
            let record = checkpoint.record_batch(codes);
            txn.put_batch_record(&record).unwrap();
            txn.put_batch(&checkpoint).unwrap();
            txn.commit().unwrap();
            encoded_sizes.push(RocksStore::serialize(&checkpoint).unwrap().len());
        }

        // Forty codes would add hundreds of bytes if they were inlined.
        let spread = encoded_sizes.iter().max().unwrap() - encoded_sizes.iter().min().unwrap();
        assert!(spread < 32, "checkpoint grew: {encoded_sizes:?}");

        let stored = store.get_batch(&request_id).unwrap().unwrap();
        assert_eq!(stored.next_batch_index(), 4);
        assert_eq!(stored.total_processed, 40);

        let txn = store.begin();
        let third = txn.get_batch_record(&request_id, 2).unwrap().unwrap();
        assert_eq!(third.batch_index, 2);
        assert_eq!(third.total_processed, 30);
        assert_eq!(third.codes[0].as_str(), "TV00020000");
        assert!(txn.get_batch_record(&request_id, 4).unwrap().is_none());
    }
}
