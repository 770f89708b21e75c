//! Issuance transaction coordinator.
//!
//! One purchase is one store transaction. Rows are locked in a fixed order
//! (buyer account, then stock rows in product-key order, then code rows) so
//! competing purchases serialize instead of deadlocking. Any error drops the
//! transaction before it is returned, which rolls back every staged write.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use vouchr_core::{
    IssuanceError, IssuanceId, IssuedCode, ProductKey, PurchaseMode, PurchaseRequest, Result,
    StockLevel, UserId,
};
use vouchr_store::{RocksStore, StoreTxn};

use crate::config::EngineConfig;
use crate::source::CodeSource;

/// Outcome of a committed purchase.
#[derive(Debug, Clone)]
pub struct IssuanceReceipt {
    /// Groups the codes and ledger entry of this purchase.
    pub issuance_id: IssuanceId,
    /// One code per purchased unit, in line-item order.
    pub codes: Vec<IssuedCode>,
    /// `Σ unit_price × quantity`.
    pub total_cost: Decimal,
    /// Buyer balance after the purchase. Unchanged for external payments.
    pub new_balance: Decimal,
    /// Stock left per touched product, in product-key order.
    pub stock: Vec<StockLevel>,
}

/// Writes staged by [`IssuanceCoordinator::apply`], not yet committed.
pub(crate) struct StagedIssuance {
    pub codes: Vec<IssuedCode>,
    pub total_cost: Decimal,
    pub new_balance: Decimal,
    pub stock: Vec<StockLevel>,
}

/// Runs purchases as single atomic transactions.
#[derive(Clone)]
pub struct IssuanceCoordinator {
    store: Arc<RocksStore>,
    codes: Arc<dyn CodeSource>,
    config: EngineConfig,
}

impl IssuanceCoordinator {
    /// Create a coordinator over a store.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, codes: Arc<dyn CodeSource>, config: EngineConfig) -> Self {
        Self {
            store,
            codes,
            config,
        }
    }

    /// The store this coordinator writes to.
    #[must_use]
    pub fn store(&self) -> &Arc<RocksStore> {
        &self.store
    }

    /// The engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Issue codes for a purchase.
    ///
    /// With credits the buyer is debited; with an external method the caller
    /// has already confirmed payment and only codes and stock change. In
    /// buy-own mode the codes come back already redeemed by the buyer and the
    /// buyer's account is activated.
    ///
    /// # Errors
    ///
    /// - `InvalidLineItems` if the request is malformed or too large.
    /// - `UserNotFound` if the buyer has no account.
    /// - `InsufficientFunds` if the balance doesn't cover the total.
    /// - `OutOfStock` if any product lacks the requested units.
    /// - `CodeGenerationExhausted` if unique codes could not be drawn.
    /// - `Conflict` if a row lock could not be acquired in time.
    ///
    /// On any error nothing was written.
    pub fn issue(&self, request: &PurchaseRequest) -> Result<IssuanceReceipt> {
        request.validate()?;
        let units = request.total_units();
        if units > self.config.max_units_per_call {
            return Err(IssuanceError::InvalidLineItems(format!(
                "{units} units exceeds the per-call limit of {}; use batch purchase",
                self.config.max_units_per_call
            )));
        }

        let issuance_id = IssuanceId::generate();
        let txn = self.store.begin();
        let staged = self.apply(&txn, request, issuance_id)?;
        txn.commit()?;

        tracing::info!(
            buyer_id = %request.buyer_id,
            issuance_id = %issuance_id,
            units,
            total_cost = %staged.total_cost,
            payment = request.payment_method.label(),
            mode = ?request.mode,
            "Codes issued"
        );
        self.report_low_stock(&staged.stock);

        Ok(IssuanceReceipt {
            issuance_id,
            codes: staged.codes,
            total_cost: staged.total_cost,
            new_balance: staged.new_balance,
            stock: staged.stock,
        })
    }

    /// Stage a purchase inside an open transaction.
    ///
    /// The caller validates the request and commits.
    pub(crate) fn apply(
        &self,
        txn: &StoreTxn<'_>,
        request: &PurchaseRequest,
        issuance_id: IssuanceId,
    ) -> Result<StagedIssuance> {
        let total_cost = request.total_cost()?;
        let units = request.total_units();
        let buyer = request.buyer_id;

        let new_balance = if request.payment_method.is_credits() {
            txn.try_debit(
                &buyer,
                total_cost,
                issuance_id,
                &format!("Issued {units} codes"),
            )?
        } else {
            txn.require_account(&buyer)?.balance
        };

        let mut stock = Vec::new();
        for (product_key, quantity) in request.quantities_by_key() {
            let remaining = txn.try_reserve(&product_key, quantity)?;
            stock.push(StockLevel::evaluate(
                product_key,
                remaining,
                self.config.low_stock_threshold,
            ));
        }

        let now = Utc::now();
        let buy_own = request.mode == PurchaseMode::BuyOwn;
        let mut codes = Vec::with_capacity(usize::try_from(units).unwrap_or_default());
        for item in &request.line_items {
            for _ in 0..item.quantity {
                codes.push(self.insert_unique_code(
                    txn,
                    buyer,
                    &item.product_key,
                    item.unit_price,
                    issuance_id,
                    now,
                    buy_own,
                )?);
            }
        }

        if buy_own {
            txn.activate_account(&buyer)?;
        }

        Ok(StagedIssuance {
            codes,
            total_cost,
            new_balance,
            stock,
        })
    }

    /// Draw candidates until one is free, then stage it.
    #[allow(clippy::too_many_arguments)]
    fn insert_unique_code(
        &self,
        txn: &StoreTxn<'_>,
        owner: UserId,
        product_key: &ProductKey,
        unit_price: Decimal,
        issuance_id: IssuanceId,
        now: DateTime<Utc>,
        buy_own: bool,
    ) -> Result<IssuedCode> {
        let format = product_key.category().code_format();
        let attempts = self.config.max_code_attempts.max(1);

        for attempt in 1..=attempts {
            let mut issued = IssuedCode::new(
                self.codes.next_code(format),
                owner,
                product_key.clone(),
                unit_price,
                issuance_id,
                now,
            );
            if buy_own {
                let fresh = issued.mark_redeemed(owner, now);
                debug_assert!(fresh);
            }
            if txn.insert_code_if_absent(&issued)? {
                return Ok(issued);
            }
            tracing::debug!(attempt, code = %issued.code, "Code collision, drawing again");
        }

        tracing::error!(
            attempts,
            product_key = %product_key,
            "Code generation exhausted"
        );
        Err(IssuanceError::CodeGenerationExhausted { attempts })
    }

    pub(crate) fn report_low_stock(&self, levels: &[StockLevel]) {
        for level in levels.iter().filter(|level| level.is_low_stock) {
            tracing::warn!(
                product_key = %level.product_key,
                available = level.available,
                threshold = self.config.low_stock_threshold,
                "Low stock"
            );
        }
    }
}
