//! Database schema definitions and column families.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// Credit accounts, keyed by `user_id`.
    pub const ACCOUNTS: &str = "accounts";

    /// Product stock counters, keyed by product key.
    pub const STOCK: &str = "stock";

    /// Issued codes, keyed by the code itself (unique).
    pub const CODES: &str = "codes";

    /// Index: codes by owner, keyed by `owner_id || issuance_id || code`.
    /// Value is empty (index only).
    pub const CODES_BY_OWNER: &str = "codes_by_owner";

    /// Ledger entries, keyed by `transaction_id` (ULID).
    pub const TRANSACTIONS: &str = "transactions";

    /// Index: ledger entries by user, keyed by `user_id || transaction_id`.
    /// Value is empty (index only).
    pub const TRANSACTIONS_BY_USER: &str = "transactions_by_user";

    /// Batch checkpoints, keyed by request id.
    pub const BATCHES: &str = "batches";

    /// Codes of each committed batch, keyed by `request_id || 0x00 || batch_index`.
    pub const BATCH_RECORDS: &str = "batch_records";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::ACCOUNTS,
        cf::STOCK,
        cf::CODES,
        cf::CODES_BY_OWNER,
        cf::TRANSACTIONS,
        cf::TRANSACTIONS_BY_USER,
        cf::BATCHES,
        cf::BATCH_RECORDS,
    ]
}
