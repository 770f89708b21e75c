//! Purchase requests.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{IssuanceError, Result};
use crate::{ProductKey, UserId};

/// One product line of a purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Product to buy.
    pub product_key: ProductKey,
    /// Price per unit, already resolved for the buyer's role.
    pub unit_price: Decimal,
    /// Units to buy.
    pub quantity: u32,
}

impl LineItem {
    /// Create a line item.
    #[must_use]
    pub const fn new(product_key: ProductKey, unit_price: Decimal, quantity: u32) -> Self {
        Self {
            product_key,
            unit_price,
            quantity,
        }
    }

    /// Price of the whole line, or `None` on overflow.
    #[must_use]
    pub fn subtotal(&self) -> Option<Decimal> {
        self.unit_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// How the buyer pays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Debit the buyer's credit balance.
    Credits,
    /// Payment already confirmed out-of-band (card, e-wallet, ...).
    External {
        /// Payment rail tag, e.g. `gcash`.
        method: String,
        /// Reference of the confirmed payment.
        reference: String,
    },
}

impl PaymentMethod {
    /// Whether this method debits the credit ledger.
    #[must_use]
    pub const fn is_credits(&self) -> bool {
        matches!(self, Self::Credits)
    }

    /// Short label for logs and ledger entries.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Credits => "credits",
            Self::External { method, .. } => method,
        }
    }
}

/// What happens to the codes after purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseMode {
    /// Codes stay unredeemed for the merchant to resell.
    #[default]
    Resale,
    /// Codes are redeemed by the buyer on the spot and the buyer's account is
    /// activated.
    BuyOwn,
}

/// A purchase of one or more line items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseRequest {
    /// The buyer.
    pub buyer_id: UserId,
    /// Ordered line items.
    pub line_items: Vec<LineItem>,
    /// How the buyer pays.
    pub payment_method: PaymentMethod,
    /// Resale or buy-own.
    #[serde(default)]
    pub mode: PurchaseMode,
}

impl PurchaseRequest {
    /// Check the structural preconditions.
    ///
    /// # Errors
    ///
    /// Returns `IssuanceError::InvalidLineItems` if there are no line items,
    /// any quantity is zero, any price is negative, or external payment
    /// details are blank.
    pub fn validate(&self) -> Result<()> {
        if self.line_items.is_empty() {
            return Err(IssuanceError::InvalidLineItems("no line items".into()));
        }
        for (index, item) in self.line_items.iter().enumerate() {
            if item.quantity == 0 {
                return Err(IssuanceError::InvalidLineItems(format!(
                    "line {index}: quantity must be positive"
                )));
            }
            if item.unit_price.is_sign_negative() {
                return Err(IssuanceError::InvalidLineItems(format!(
                    "line {index}: unit price must not be negative"
                )));
            }
        }
        if let PaymentMethod::External { method, reference } = &self.payment_method {
            if method.trim().is_empty() || reference.trim().is_empty() {
                return Err(IssuanceError::InvalidLineItems(
                    "external payment needs a method and a confirmed reference".into(),
                ));
            }
        }
        Ok(())
    }

    /// `Σ unit_price × quantity`.
    ///
    /// # Errors
    ///
    /// Returns `IssuanceError::InvalidLineItems` if the sum overflows.
    pub fn total_cost(&self) -> Result<Decimal> {
        self.line_items.iter().try_fold(Decimal::ZERO, |acc, item| {
            item.subtotal()
                .and_then(|subtotal| acc.checked_add(subtotal))
                .ok_or_else(|| IssuanceError::InvalidLineItems("total cost overflows".into()))
        })
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn total_units(&self) -> u64 {
        self.line_items.iter().map(|i| u64::from(i.quantity)).sum()
    }

    /// Units per distinct product key, in key order.
    ///
    /// Stock rows are locked in this order.
    #[must_use]
    pub fn quantities_by_key(&self) -> BTreeMap<ProductKey, u64> {
        let mut totals = BTreeMap::new();
        for item in &self.line_items {
            *totals.entry(item.product_key.clone()).or_insert(0) += u64::from(item.quantity);
        }
        totals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(key: &str, price: i64, quantity: u32) -> LineItem {
        LineItem::new(key.parse().unwrap(), Decimal::from(price), quantity)
    }

    fn request(items: Vec<LineItem>) -> PurchaseRequest {
        PurchaseRequest {
            buyer_id: UserId::generate(),
            line_items: items,
            payment_method: PaymentMethod::Credits,
            mode: PurchaseMode::Resale,
        }
    }

    #[test]
    fn total_cost_sums_lines() {
        let req = request(vec![item("tv:30d", 99, 3), item("wifi:1d", 50, 1)]);
        assert_eq!(req.total_cost().unwrap(), Decimal::from(347));
        assert_eq!(req.total_units(), 4);
    }

    #[test]
    fn total_cost_is_exact() {
        let req = request(vec![LineItem::new(
            "eload:smart-10".parse().unwrap(),
            Decimal::new(10, 2),
            3,
        )]);
        assert_eq!(req.total_cost().unwrap(), Decimal::new(30, 2));
    }

    #[test]
    fn quantities_merge_duplicate_keys() {
        let req = request(vec![
            item("tv:30d", 99, 3),
            item("gsat:90d", 450, 1),
            item("tv:30d", 99, 2),
        ]);
        let totals = req.quantities_by_key();
        assert_eq!(totals.len(), 2);
        assert_eq!(totals[&"tv:30d".parse::<ProductKey>().unwrap()], 5);
        let keys: Vec<_> = totals.keys().map(ToString::to_string).collect();
        assert_eq!(keys, ["gsat:90d", "tv:30d"]);
    }

    #[test]
    fn validate_rejects_empty_and_zero() {
        assert!(matches!(
            request(vec![]).validate(),
            Err(IssuanceError::InvalidLineItems(_))
        ));
        assert!(matches!(
            request(vec![item("tv:30d", 99, 0)]).validate(),
            Err(IssuanceError::InvalidLineItems(_))
        ));
        assert!(matches!(
            request(vec![item("tv:30d", -1, 1)]).validate(),
            Err(IssuanceError::InvalidLineItems(_))
        ));
    }

    #[test]
    fn validate_rejects_blank_external_reference() {
        let mut req = request(vec![item("tv:30d", 99, 1)]);
        req.payment_method = PaymentMethod::External {
            method: "gcash".into(),
            reference: " ".into(),
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn payment_method_wire_format() {
        let json = serde_json::to_value(PaymentMethod::Credits).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "credits" }));
    }
}
