//! Error types for vouchr storage.

use rust_decimal::Decimal;
use vouchr_core::IssuanceError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record (`account`, `product`, `code`, `batch`).
        entity: &'static str,
        /// Key that was looked up.
        id: String,
    },

    /// Record already exists.
    #[error("{entity} already exists: {id}")]
    AlreadyExists {
        /// Kind of record.
        entity: &'static str,
        /// Key that collided.
        id: String,
    },

    /// Balance lower than the debit.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance.
        balance: Decimal,
        /// Amount to debit.
        required: Decimal,
    },

    /// Stock lower than the reservation.
    #[error("out of stock: {product_key} (available={available}, requested={requested})")]
    OutOfStock {
        /// The product.
        product_key: String,
        /// Units left.
        available: u64,
        /// Units requested.
        requested: u64,
    },

    /// Amount is zero, negative, or overflows.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Row lock not acquired in time, or the write conflicted.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl From<rocksdb::Error> for StoreError {
    fn from(err: rocksdb::Error) -> Self {
        match err.kind() {
            rocksdb::ErrorKind::TimedOut | rocksdb::ErrorKind::Busy | rocksdb::ErrorKind::TryAgain => {
                Self::Conflict(err.into_string())
            }
            _ => Self::Database(err.into_string()),
        }
    }
}

impl From<StoreError> for IssuanceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity: "account", id } => Self::UserNotFound { user_id: id },
            StoreError::NotFound { entity: "product", id } => {
                Self::ProductNotFound { product_key: id }
            }
            StoreError::NotFound { entity: "code", id } => Self::CodeNotFound { code: id },
            StoreError::NotFound { entity, id } => {
                Self::Validation(format!("unknown {entity}: {id}"))
            }
            StoreError::AlreadyExists { entity, id } => {
                Self::Validation(format!("{entity} already exists: {id}"))
            }
            StoreError::InsufficientFunds { balance, required } => {
                Self::InsufficientFunds { balance, required }
            }
            StoreError::OutOfStock {
                product_key,
                available,
                requested,
            } => Self::OutOfStock {
                product_key,
                available,
                requested,
            },
            StoreError::InvalidAmount(msg) => Self::Validation(msg),
            StoreError::Conflict(msg) => Self::Conflict(msg),
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Storage(msg),
        }
    }
}
