//! `RocksDB` storage layer for vouchr.
//!
//! This crate persists credit accounts, product stock, issued codes, the
//! credit ledger and batch checkpoints in a transactional `RocksDB`.
//!
//! # Architecture
//!
//! The storage uses the following column families:
//!
//! - `accounts`: Credit accounts, keyed by `user_id`
//! - `stock`: Stock counters, keyed by product key
//! - `codes`: Issued codes, keyed by the code value (unique)
//! - `codes_by_owner`: Index for listing codes by owner
//! - `transactions`: Ledger entries, keyed by `transaction_id` (ULID)
//! - `transactions_by_user`: Index for listing ledger entries by user
//! - `batches`: Batch purchase checkpoints, keyed by request id
//! - `batch_records`: Codes of each committed batch, keyed by request id and index
//!
//! Simple reads and single-record writes go through the [`Store`] trait.
//! Multi-record units of work open a [`StoreTxn`] with [`RocksStore::begin`],
//! lock the rows they touch and commit once.
//!
//! # Example
//!
//! ```no_run
//! use vouchr_store::{RocksStore, Store};
//! use vouchr_core::{CreditAccount, Decimal, MemberRole, UserId};
//!
//! let store = RocksStore::open("/tmp/vouchr-db").unwrap();
//!
//! let user_id = UserId::generate();
//! store.create_account(&CreditAccount::new(user_id, MemberRole::Reseller, 1)).unwrap();
//!
//! let txn = store.begin();
//! txn.activate_account(&user_id).unwrap();
//! txn.commit().unwrap();
//!
//! assert_eq!(store.get_balance(&user_id).unwrap(), Decimal::ZERO);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod batches;
mod codes;
pub mod error;
pub mod keys;
mod ledger;
pub mod rocks;
pub mod schema;
mod stock;
pub mod txn;

pub use error::{Result, StoreError};
pub use rocks::{RocksStore, StoreConfig, DEFAULT_LOCK_TIMEOUT_MS};
pub use txn::StoreTxn;

use rust_decimal::Decimal;
use vouchr_core::{
    BatchCheckpoint, CreditAccount, CreditTransaction, IssuedCode, ProductKey, ProductStock,
    RedemptionCode, RequestId, TransactionId, TransactionType, UserId,
};

/// Reads and single-record writes.
///
/// Anything that must change several records together uses a [`StoreTxn`].
pub trait Store: Send + Sync {
    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Create a new account.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::AlreadyExists` if the user already has an account.
    fn create_account(&self, account: &CreditAccount) -> Result<()>;

    /// Get an account by user ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_account(&self, user_id: &UserId) -> Result<Option<CreditAccount>>;

    /// Get the current balance.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the account doesn't exist.
    fn get_balance(&self, user_id: &UserId) -> Result<Decimal>;

    /// Add credits and record the ledger entry.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the account doesn't exist.
    /// - `StoreError::InvalidAmount` if `amount` is not positive.
    fn credit(
        &self,
        user_id: &UserId,
        amount: Decimal,
        transaction_type: TransactionType,
        description: &str,
    ) -> Result<CreditTransaction>;

    // =========================================================================
    // Stock Operations
    // =========================================================================

    /// Set the stock count for a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn put_stock(&self, stock: &ProductStock) -> Result<()>;

    /// Get the stock record for a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_stock(&self, product_key: &ProductKey) -> Result<Option<ProductStock>>;

    /// Get the units left for a product.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the product was never stocked.
    fn get_available(&self, product_key: &ProductKey) -> Result<u64>;

    // =========================================================================
    // Code Operations
    // =========================================================================

    /// Get an issued code.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_code(&self, code: &RedemptionCode) -> Result<Option<IssuedCode>>;

    /// List codes owned by a user, newest purchase first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_codes_by_owner(
        &self,
        owner_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<IssuedCode>>;

    // =========================================================================
    // Ledger Operations
    // =========================================================================

    /// Get a ledger entry by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_transaction(&self, transaction_id: &TransactionId) -> Result<Option<CreditTransaction>>;

    /// List ledger entries for a user, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn list_transactions_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<CreditTransaction>>;

    // =========================================================================
    // Batch Operations
    // =========================================================================

    /// Get a batch checkpoint.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    fn get_batch(&self, request_id: &RequestId) -> Result<Option<BatchCheckpoint>>;
}
