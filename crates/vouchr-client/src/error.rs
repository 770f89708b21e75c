//! Client error types.

use rust_decimal::Decimal;

/// Errors that can occur when using the vouchr client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response without a more specific variant.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// The request was malformed.
    #[error("invalid request: {message}")]
    Validation {
        /// Server message.
        message: String,
    },

    /// The buyer cannot afford the purchase.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance.
        balance: Decimal,
        /// Required amount.
        required: Decimal,
    },

    /// Not enough units of a product.
    #[error("out of stock: {product_key} has {available}, requested {requested}")]
    OutOfStock {
        /// The product.
        product_key: String,
        /// Units left.
        available: u64,
        /// Units asked for.
        requested: u64,
    },

    /// The code has already been redeemed.
    #[error("code already redeemed")]
    AlreadyRedeemed,

    /// The code does not exist.
    #[error("code not found")]
    CodeNotFound,

    /// The account does not exist.
    #[error("user not found: {message}")]
    UserNotFound {
        /// Server message.
        message: String,
    },

    /// Lost a race with a concurrent request; the same call may be retried.
    #[error("conflict: {message}")]
    Conflict {
        /// Server message.
        message: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Whether repeating the same call can succeed without other changes.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Conflict { .. } => true,
            Self::Http(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }
}
