//! Error types for vouchr.

use rust_decimal::Decimal;

use crate::code::CodeError;
use crate::ids::IdError;
use crate::product::ProductKeyError;

/// Result type for issuance operations.
pub type Result<T> = std::result::Result<T, IssuanceError>;

/// Errors that can occur while issuing or redeeming codes.
///
/// Every failure raised inside a store transaction is returned only after the
/// transaction rolled back.
#[derive(Debug, thiserror::Error)]
pub enum IssuanceError {
    /// The purchase request is malformed.
    #[error("invalid line items: {0}")]
    InvalidLineItems(String),

    /// Any other malformed input (ids, codes, batch bookkeeping).
    #[error("invalid request: {0}")]
    Validation(String),

    /// The buyer cannot afford the purchase.
    #[error("insufficient funds: balance={balance}, required={required}")]
    InsufficientFunds {
        /// Current balance.
        balance: Decimal,
        /// Total cost of the purchase.
        required: Decimal,
    },

    /// Not enough stock left for a product.
    #[error("out of stock: {product_key} (available={available}, requested={requested})")]
    OutOfStock {
        /// The product that ran out.
        product_key: String,
        /// Units left.
        available: u64,
        /// Units requested.
        requested: u64,
    },

    /// No account for this user.
    #[error("user not found: {user_id}")]
    UserNotFound {
        /// The missing user.
        user_id: String,
    },

    /// No product stock line for this key.
    #[error("product not found: {product_key}")]
    ProductNotFound {
        /// The missing product.
        product_key: String,
    },

    /// No issued code with this value.
    #[error("code not found: {code}")]
    CodeNotFound {
        /// The missing code.
        code: String,
    },

    /// The code has already been redeemed.
    #[error("code already redeemed: {code}")]
    AlreadyRedeemed {
        /// The code.
        code: String,
    },

    /// Every generated candidate collided with an existing code.
    #[error("code generation exhausted after {attempts} attempts")]
    CodeGenerationExhausted {
        /// Attempts made for the failing unit.
        attempts: u32,
    },

    /// Lost a race for a row lock; retry later.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage failure.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Coarse classification used for status mapping and retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Fix the input; never retried.
    Validation,
    /// Business rule refused the purchase; never retried automatically.
    Business,
    /// Unknown user, product, or code.
    NotFound,
    /// Concurrency loser; a normal outcome.
    Conflict,
    /// Operational failure.
    Internal,
}

impl IssuanceError {
    /// Classify the error.
    #[must_use]
    pub const fn class(&self) -> ErrorClass {
        match self {
            Self::InvalidLineItems(_) | Self::Validation(_) => ErrorClass::Validation,
            Self::InsufficientFunds { .. } | Self::OutOfStock { .. } => ErrorClass::Business,
            Self::UserNotFound { .. } | Self::ProductNotFound { .. } | Self::CodeNotFound { .. } => {
                ErrorClass::NotFound
            }
            Self::AlreadyRedeemed { .. } | Self::Conflict(_) => ErrorClass::Conflict,
            Self::CodeGenerationExhausted { .. } | Self::Storage(_) => ErrorClass::Internal,
        }
    }

    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidLineItems(_) => "invalid_line_items",
            Self::Validation(_) => "validation_error",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::OutOfStock { .. } => "out_of_stock",
            Self::UserNotFound { .. } => "user_not_found",
            Self::ProductNotFound { .. } => "product_not_found",
            Self::CodeNotFound { .. } => "code_not_found",
            Self::AlreadyRedeemed { .. } => "already_redeemed",
            Self::CodeGenerationExhausted { .. } => "code_generation_exhausted",
            Self::Conflict(_) => "conflict",
            Self::Storage(_) => "storage_error",
        }
    }

    /// Message shown to the person who made the request.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidLineItems(reason) | Self::Validation(reason) => {
                format!("Please fix your request: {reason}")
            }
            Self::InsufficientFunds { balance, required } => format!(
                "You cannot afford this purchase: it costs {required} credits and your balance is {balance}"
            ),
            Self::OutOfStock {
                product_key,
                available,
                ..
            } => format!("Nothing left to sell for {product_key}: only {available} remaining"),
            Self::UserNotFound { .. } => "No account exists for this user".to_string(),
            Self::ProductNotFound { product_key } => format!("Unknown product {product_key}"),
            Self::CodeNotFound { .. } => "This code does not exist".to_string(),
            Self::AlreadyRedeemed { .. } => "This code was already used".to_string(),
            Self::Conflict(_) => {
                "Another request is updating the same records, please try again".to_string()
            }
            Self::CodeGenerationExhausted { .. } | Self::Storage(_) => {
                "The purchase could not be completed, please try again later".to_string()
            }
        }
    }

    /// Whether the caller may retry the same request unchanged.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<IdError> for IssuanceError {
    fn from(err: IdError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<CodeError> for IssuanceError {
    fn from(err: CodeError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<ProductKeyError> for IssuanceError {
    fn from(err: ProductKeyError) -> Self {
        Self::Validation(err.to_string())
    }
}
