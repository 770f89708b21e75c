//! Batch continuation controller.
//!
//! Large orders are issued as a series of bounded chunks, one transaction
//! each. Progress lives in a [`BatchCheckpoint`] keyed by the caller's request
//! id. The checkpoint and a [`vouchr_core::BatchRecord`] holding the chunk's
//! codes are written in the same transaction as the chunk, so:
//!
//! - a batch index that already committed replays its recorded codes,
//! - a batch index past the checkpoint is rejected,
//! - a request id reused for a different order is rejected.
//!
//! A failed chunk leaves earlier chunks committed and marks the request
//! `Failed`; the caller retries the same index.

use std::sync::Arc;

use rust_decimal::Decimal;

use vouchr_core::{
    next_chunk_len, BatchCheckpoint, BatchProgress, IssuanceError, IssuanceId, LineItem,
    PaymentMethod, ProductKey, PurchaseMode, PurchaseRequest, RedemptionCode, RequestId, Result,
    UserId,
};
use vouchr_store::{RocksStore, Store, StoreTxn};

use crate::coordinator::IssuanceCoordinator;

/// One call of a batched purchase.
#[derive(Debug, Clone)]
pub struct BatchRequest {
    /// Caller-chosen id shared by every call of the same order.
    pub request_id: RequestId,
    /// Who pays and owns the codes.
    pub buyer_id: UserId,
    /// The single product being bought.
    pub product_key: ProductKey,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Units over the whole order.
    pub total_quantity: u64,
    /// How the order is paid.
    pub payment_method: PaymentMethod,
    /// Index of the batch this call should issue.
    pub batch_index: u32,
    /// Codes the caller believes were issued so far. Advisory only.
    pub already_processed: Vec<RedemptionCode>,
}

/// Result of one batch call.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Codes issued by this batch.
    pub newly_issued: Vec<RedemptionCode>,
    /// Progress after this batch.
    pub progress: BatchProgress,
    /// Whether the batch had already committed and was replayed.
    pub replayed: bool,
}

/// Drives batched purchases.
#[derive(Clone)]
pub struct BatchController {
    coordinator: IssuanceCoordinator,
}

impl BatchController {
    /// Create a controller that issues through `coordinator`.
    #[must_use]
    pub fn new(coordinator: IssuanceCoordinator) -> Self {
        Self { coordinator }
    }

    fn store(&self) -> &Arc<RocksStore> {
        self.coordinator.store()
    }

    /// Units per chunk, never above the single-call cap.
    fn chunk_size(&self) -> u32 {
        let config = self.coordinator.config();
        let cap = u32::try_from(config.max_units_per_call).unwrap_or(u32::MAX);
        config.batch_chunk_size.min(cap).max(1)
    }

    /// Issue (or replay) one batch.
    ///
    /// # Errors
    ///
    /// - `Validation` for an unknown batch index, a reused request id, or a
    ///   request that is already complete.
    /// - `InvalidLineItems` for a malformed order.
    /// - Any error of [`IssuanceCoordinator::issue`] for the chunk itself;
    ///   earlier batches stay committed.
    pub fn purchase_batch(&self, request: &BatchRequest) -> Result<BatchOutcome> {
        if request.total_quantity == 0 {
            return Err(IssuanceError::InvalidLineItems(
                "total quantity must be positive".into(),
            ));
        }

        let txn = self.store().begin();
        let existing = txn.lock_batch(&request.request_id)?;

        let mut checkpoint = match existing {
            Some(checkpoint) => {
                if !checkpoint.matches(
                    &request.buyer_id,
                    &request.product_key,
                    request.unit_price,
                    &request.payment_method,
                    request.total_quantity,
                ) {
                    return Err(IssuanceError::Validation(format!(
                        "request id {} was used for a different order",
                        request.request_id
                    )));
                }
                checkpoint
            }
            None => BatchCheckpoint::new(
                request.request_id.clone(),
                request.buyer_id,
                request.product_key.clone(),
                request.unit_price,
                request.payment_method.clone(),
                request.total_quantity,
            ),
        };

        let expected = checkpoint.next_batch_index();
        if request.batch_index < expected {
            return Self::replay(&txn, &checkpoint, request.batch_index);
        }
        if request.batch_index > expected {
            return Err(IssuanceError::Validation(format!(
                "batch index {} is ahead of the next expected index {expected}",
                request.batch_index
            )));
        }
        if checkpoint.state.is_terminal() {
            return Err(IssuanceError::Validation(format!(
                "request {} is already complete",
                request.request_id
            )));
        }

        let processed = checkpoint.total_processed;
        if request.already_processed.len() as u64 != processed {
            tracing::warn!(
                request_id = %request.request_id,
                caller_count = request.already_processed.len(),
                recorded = processed,
                "Caller progress disagrees with checkpoint"
            );
        }

        let chunk = next_chunk_len(request.total_quantity, processed, self.chunk_size());
        let quantity = u32::try_from(chunk)
            .map_err(|_| IssuanceError::InvalidLineItems("chunk too large".into()))?;
        let purchase = PurchaseRequest {
            buyer_id: request.buyer_id,
            line_items: vec![LineItem::new(
                request.product_key.clone(),
                request.unit_price,
                quantity,
            )],
            payment_method: request.payment_method.clone(),
            mode: PurchaseMode::Resale,
        };
        purchase.validate()?;

        let issuance_id = IssuanceId::generate();
        let staged = match self.coordinator.apply(&txn, &purchase, issuance_id) {
            Ok(staged) => staged,
            Err(err) => {
                if let Err(rollback_err) = txn.rollback() {
                    tracing::warn!(error = %rollback_err, "Rollback failed");
                }
                self.record_failure(&request.request_id, &err);
                return Err(err);
            }
        };

        let newly_issued: Vec<RedemptionCode> =
            staged.codes.iter().map(|issued| issued.code.clone()).collect();
        let record = checkpoint.record_batch(newly_issued.clone());
        txn.put_batch_record(&record)?;
        txn.put_batch(&checkpoint)?;
        txn.commit()?;

        tracing::info!(
            request_id = %request.request_id,
            batch_index = request.batch_index,
            issued = newly_issued.len(),
            total_processed = checkpoint.total_processed,
            total_requested = checkpoint.total_requested,
            state = ?checkpoint.state,
            "Batch committed"
        );
        self.coordinator.report_low_stock(&staged.stock);

        let progress = BatchProgress {
            batch_index: request.batch_index,
            items_processed_this_call: newly_issued.len() as u64,
            total_processed: checkpoint.total_processed,
            total_requested: checkpoint.total_requested,
            next_batch_index: request.batch_index.saturating_add(1),
            is_complete: checkpoint.is_complete(),
            state: checkpoint.state,
        };

        Ok(BatchOutcome {
            newly_issued,
            progress,
            replayed: false,
        })
    }

    /// Rebuild the result a committed batch returned.
    fn replay(
        txn: &StoreTxn<'_>,
        checkpoint: &BatchCheckpoint,
        batch_index: u32,
    ) -> Result<BatchOutcome> {
        let record = txn
            .get_batch_record(&checkpoint.request_id, batch_index)?
            .ok_or_else(|| {
                IssuanceError::Storage(format!(
                    "missing record for batch {batch_index} of request {}",
                    checkpoint.request_id
                ))
            })?;

        tracing::info!(
            request_id = %checkpoint.request_id,
            batch_index,
            "Replaying committed batch"
        );

        Ok(BatchOutcome {
            progress: BatchProgress {
                batch_index,
                items_processed_this_call: record.codes.len() as u64,
                total_processed: record.total_processed,
                total_requested: checkpoint.total_requested,
                next_batch_index: batch_index.saturating_add(1),
                is_complete: record.total_processed >= checkpoint.total_requested,
                state: checkpoint.state,
            },
            newly_issued: record.codes,
            replayed: true,
        })
    }

    /// Mark the request failed in its own transaction.
    ///
    /// Only requests with committed batches have a checkpoint to update.
    fn record_failure(&self, request_id: &RequestId, err: &IssuanceError) {
        let result = (|| -> vouchr_store::Result<()> {
            let txn = self.store().begin();
            if let Some(mut checkpoint) = txn.lock_batch(request_id)? {
                checkpoint.record_failure(err.to_string());
                txn.put_batch(&checkpoint)?;
                txn.commit()?;
            }
            Ok(())
        })();

        if let Err(store_err) = result {
            tracing::warn!(
                request_id = %request_id,
                error = %store_err,
                "Failed to record batch failure"
            );
        }
    }

    /// Current checkpoint for a request.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the checkpoint cannot be read.
    pub fn checkpoint(&self, request_id: &RequestId) -> Result<Option<BatchCheckpoint>> {
        Ok(self.store().get_batch(request_id)?)
    }
}
