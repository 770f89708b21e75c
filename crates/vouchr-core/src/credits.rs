//! Credit ledger entries.
//!
//! Every balance change writes one entry in the same store transaction as the
//! change itself.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{IssuanceId, TransactionId, UserId};

/// A credit transaction representing a balance change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditTransaction {
    /// Unique transaction ID (ULID for time-ordering).
    pub id: TransactionId,

    /// The user whose balance was affected.
    pub user_id: UserId,

    /// Signed amount. Positive = credit, negative = debit.
    pub amount: Decimal,

    /// Type of transaction.
    pub transaction_type: TransactionType,

    /// Balance after this transaction.
    pub balance_after: Decimal,

    /// Human-readable description.
    pub description: String,

    /// Issuance this entry paid for, if any.
    pub issuance_id: Option<IssuanceId>,

    /// When the transaction was created.
    pub created_at: DateTime<Utc>,
}

impl CreditTransaction {
    /// A debit paying for an issuance.
    #[must_use]
    pub fn issuance(
        user_id: UserId,
        amount: Decimal,
        balance_after: Decimal,
        issuance_id: IssuanceId,
        description: String,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount: -amount.abs(),
            transaction_type: TransactionType::Issuance,
            balance_after,
            description,
            issuance_id: Some(issuance_id),
            created_at: Utc::now(),
        }
    }

    /// A credit of the given type.
    #[must_use]
    pub fn credit(
        user_id: UserId,
        amount: Decimal,
        balance_after: Decimal,
        transaction_type: TransactionType,
        description: String,
    ) -> Self {
        Self {
            id: TransactionId::generate(),
            user_id,
            amount: amount.abs(),
            transaction_type,
            balance_after,
            description,
            issuance_id: None,
            created_at: Utc::now(),
        }
    }
}

/// Type of credit transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Credits spent buying codes.
    Issuance,

    /// Credits loaded by the member.
    TopUp,

    /// Credits returned after a cancelled sale.
    Refund,

    /// Manual correction.
    Adjustment,
}

impl TransactionType {
    /// Check if this transaction type adds credits.
    #[must_use]
    pub const fn is_credit(&self) -> bool {
        matches!(self, Self::TopUp | Self::Refund | Self::Adjustment)
    }

    /// Check if this transaction type removes credits.
    #[must_use]
    pub const fn is_debit(&self) -> bool {
        matches!(self, Self::Issuance)
    }
}
