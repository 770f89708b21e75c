//! Issued code records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{IssuanceId, ProductKey, RedemptionCode, UserId};

/// One purchased unit: a code owned by the buyer until someone redeems it.
///
/// `redeemed_by` moves from `None` to a user exactly once. A redeemed code is
/// terminal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedCode {
    /// The unique code.
    pub code: RedemptionCode,

    /// Purchaser (merchant) that owns the code.
    pub owner_id: UserId,

    /// Product the code is for.
    pub product_key: ProductKey,

    /// Price paid for this unit.
    pub unit_price: Decimal,

    /// Issuance that created the code.
    pub issuance_id: IssuanceId,

    /// When the code was purchased.
    pub purchased_at: DateTime<Utc>,

    /// Who redeemed the code, once redeemed.
    pub redeemed_by: Option<UserId>,

    /// When the code was redeemed.
    pub redeemed_at: Option<DateTime<Utc>>,
}

impl IssuedCode {
    /// A fresh, unredeemed code.
    #[must_use]
    pub fn new(
        code: RedemptionCode,
        owner_id: UserId,
        product_key: ProductKey,
        unit_price: Decimal,
        issuance_id: IssuanceId,
        purchased_at: DateTime<Utc>,
    ) -> Self {
        Self {
            code,
            owner_id,
            product_key,
            unit_price,
            issuance_id,
            purchased_at,
            redeemed_by: None,
            redeemed_at: None,
        }
    }

    /// Whether the code has been redeemed.
    #[must_use]
    pub const fn is_redeemed(&self) -> bool {
        self.redeemed_by.is_some()
    }

    /// Bind the code to its redeemer.
    ///
    /// Returns `false` without changing anything if the code was already
    /// redeemed.
    #[must_use]
    pub fn mark_redeemed(&mut self, redeemer: UserId, at: DateTime<Utc>) -> bool {
        if self.is_redeemed() {
            return false;
        }
        self.redeemed_by = Some(redeemer);
        self.redeemed_at = Some(at);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> IssuedCode {
        IssuedCode::new(
            "TVABCD1234".parse().unwrap(),
            UserId::generate(),
            "tv:30d".parse().unwrap(),
            Decimal::new(99, 0),
            IssuanceId::generate(),
            Utc::now(),
        )
    }

    #[test]
    fn new_code_is_unredeemed() {
        let code = sample();
        assert!(!code.is_redeemed());
        assert!(code.redeemed_at.is_none());
    }

    #[test]
    fn redemption_is_one_way() {
        let mut code = sample();
        let first = UserId::generate();
        let second = UserId::generate();

        assert!(code.mark_redeemed(first, Utc::now()));
        let redeemed_at = code.redeemed_at;

        assert!(!code.mark_redeemed(second, Utc::now()));
        assert_eq!(code.redeemed_by, Some(first));
        assert_eq!(code.redeemed_at, redeemed_at);
    }
}
