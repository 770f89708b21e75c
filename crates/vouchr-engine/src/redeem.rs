//! Redemption resolver.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use vouchr_core::{IssuanceError, MemberRole, ProductKey, RedemptionCode, Result, UserId};
use vouchr_store::{RocksStore, Store};

/// A successful redemption and the owner details downstream registration
/// needs.
#[derive(Debug, Clone)]
pub struct Redemption {
    /// The redeemed code.
    pub code: RedemptionCode,
    /// Who bought the code.
    pub owner_id: UserId,
    /// The owner's role.
    pub owner_role: MemberRole,
    /// The owner's level.
    pub owner_level: u32,
    /// Product the code was issued for.
    pub product_key: ProductKey,
    /// Role the code grants its redeemer, for invitation codes.
    pub granted_role: Option<MemberRole>,
    /// Who redeemed it.
    pub redeemed_by: UserId,
    /// When.
    pub redeemed_at: DateTime<Utc>,
}

/// Binds codes to their redeemers, once.
#[derive(Clone)]
pub struct RedemptionResolver {
    store: Arc<RocksStore>,
}

impl RedemptionResolver {
    /// Create a resolver over a store.
    #[must_use]
    pub fn new(store: Arc<RocksStore>) -> Self {
        Self { store }
    }

    /// Redeem a code.
    ///
    /// The code row is locked for the check and the update, so of two
    /// concurrent redeemers exactly one wins; the other sees
    /// `AlreadyRedeemed` (or `Conflict` if it gave up waiting for the lock).
    /// The redeemer needs no account.
    ///
    /// # Errors
    ///
    /// - `CodeNotFound` if no code has this value.
    /// - `AlreadyRedeemed` if it was redeemed before.
    /// - `UserNotFound` if the owner's account is gone.
    /// - `Conflict` if the row lock could not be acquired in time.
    pub fn redeem(&self, code: &RedemptionCode, redeemer: UserId) -> Result<Redemption> {
        let txn = self.store.begin();
        let mut issued = txn.lock_code(code)?;

        let now = Utc::now();
        if !issued.mark_redeemed(redeemer, now) {
            tracing::info!(code = %code, redeemer = %redeemer, "Code already redeemed");
            return Err(IssuanceError::AlreadyRedeemed {
                code: code.to_string(),
            });
        }

        // Unlocked read; accounts are locked before codes, never after.
        let owner = self
            .store
            .get_account(&issued.owner_id)?
            .ok_or_else(|| IssuanceError::UserNotFound {
                user_id: issued.owner_id.to_string(),
            })?;

        txn.update_code(&issued)?;
        txn.commit()?;

        tracing::info!(
            code = %code,
            owner_id = %issued.owner_id,
            redeemer = %redeemer,
            product_key = %issued.product_key,
            "Code redeemed"
        );

        Ok(Redemption {
            code: issued.code,
            owner_id: issued.owner_id,
            owner_role: owner.role,
            owner_level: owner.level,
            granted_role: issued.product_key.granted_role(),
            product_key: issued.product_key,
            redeemed_by: redeemer,
            redeemed_at: now,
        })
    }
}
