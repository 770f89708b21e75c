//! Credit accounts.
//!
//! Every member of the reseller network holds one account with a prepaid
//! credit balance. The balance is an exact decimal and never goes negative.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::UserId;

/// A member's credit account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditAccount {
    /// The account owner.
    pub user_id: UserId,

    /// Current credit balance.
    pub balance: Decimal,

    /// Network role of the owner.
    pub role: MemberRole,

    /// Tier within the role (1 is the entry tier).
    pub level: u32,

    /// Set once the owner has consumed an activation code of their own.
    pub activated: bool,

    /// Lifetime credits spent on issuance.
    pub lifetime_spent: Decimal,

    /// Lifetime credits added (top-ups, refunds, adjustments).
    pub lifetime_credited: Decimal,

    /// When the account was created.
    pub created_at: DateTime<Utc>,

    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

impl CreditAccount {
    /// Create a new account with zero balance.
    #[must_use]
    pub fn new(user_id: UserId, role: MemberRole, level: u32) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            balance: Decimal::ZERO,
            role,
            level,
            activated: false,
            lifetime_spent: Decimal::ZERO,
            lifetime_credited: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the account can pay `amount`.
    #[must_use]
    pub fn has_sufficient_credits(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }
}

/// Role a member plays in the reseller network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    /// End customer; buys for own use only.
    Member,
    /// Sells codes to members.
    Reseller,
    /// Supplies resellers.
    Dealer,
    /// Top of the network; supplies dealers.
    Distributor,
}

impl MemberRole {
    /// The lowercase name used in product variants and responses.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Reseller => "reseller",
            Self::Dealer => "dealer",
            Self::Distributor => "distributor",
        }
    }
}

impl fmt::Display for MemberRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MemberRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "member" => Ok(Self::Member),
            "reseller" => Ok(Self::Reseller),
            "dealer" => Ok(Self::Dealer),
            "distributor" => Ok(Self::Distributor),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

/// A role name that is not part of the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown member role: {0}")]
pub struct UnknownRole(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_account_has_zero_balance() {
        let account = CreditAccount::new(UserId::generate(), MemberRole::Reseller, 1);
        assert_eq!(account.balance, Decimal::ZERO);
        assert_eq!(account.lifetime_spent, Decimal::ZERO);
        assert!(!account.activated);
    }

    #[test]
    fn account_sufficient_credits() {
        let mut account = CreditAccount::new(UserId::generate(), MemberRole::Dealer, 2);
        account.balance = Decimal::new(1000, 2);

        assert!(account.has_sufficient_credits(Decimal::new(500, 2)));
        assert!(account.has_sufficient_credits(Decimal::new(1000, 2)));
        assert!(!account.has_sufficient_credits(Decimal::new(1001, 2)));
    }

    #[test]
    fn role_names_roundtrip() {
        for role in [
            MemberRole::Member,
            MemberRole::Reseller,
            MemberRole::Dealer,
            MemberRole::Distributor,
        ] {
            assert_eq!(role.as_str().parse::<MemberRole>(), Ok(role));
        }
        assert!("admin".parse::<MemberRole>().is_err());
    }
}
