//! Batched issuance progress.
//!
//! Large purchases are issued as a sequence of bounded chunks. Progress is
//! kept in a [`BatchCheckpoint`] keyed by the caller's request id and updated
//! in the same store transaction as each chunk, so a resubmitted batch index
//! replays instead of issuing twice. The codes of each chunk live in their own
//! [`BatchRecord`], so the checkpoint stays the same size however large the
//! order grows.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{PaymentMethod, ProductKey, RedemptionCode, RequestId, UserId};

/// Lifecycle of a batched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    /// No batch has committed yet.
    NotStarted,
    /// At least one batch committed, more remain.
    InProgress,
    /// Every requested unit has been issued.
    Complete,
    /// The last attempted batch failed; the same index may be retried.
    Failed,
}

impl BatchState {
    /// Whether no further batches will be accepted.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

/// Units to issue in the next chunk.
#[must_use]
pub fn next_chunk_len(total_requested: u64, total_processed: u64, chunk_size: u32) -> u64 {
    total_requested
        .saturating_sub(total_processed)
        .min(u64::from(chunk_size))
}

/// Persisted progress of one batched request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchCheckpoint {
    /// Caller's idempotency key.
    pub request_id: RequestId,
    /// The buyer.
    pub buyer_id: UserId,
    /// Product being issued.
    pub product_key: ProductKey,
    /// Price per unit.
    pub unit_price: Decimal,
    /// How the buyer pays.
    pub payment_method: PaymentMethod,
    /// Units requested over all batches.
    pub total_requested: u64,
    /// Number of committed batches.
    pub batches_committed: u32,
    /// Units issued over all committed batches.
    pub total_processed: u64,
    /// Current state.
    pub state: BatchState,
    /// Message of the most recent failure, cleared on the next success.
    pub last_error: Option<String>,
    /// When the first batch committed.
    pub created_at: DateTime<Utc>,
    /// When the checkpoint last changed.
    pub updated_at: DateTime<Utc>,
}

impl BatchCheckpoint {
    /// A checkpoint with nothing issued yet.
    #[must_use]
    pub fn new(
        request_id: RequestId,
        buyer_id: UserId,
        product_key: ProductKey,
        unit_price: Decimal,
        payment_method: PaymentMethod,
        total_requested: u64,
    ) -> Self {
        let now = Utc::now();
        Self {
            request_id,
            buyer_id,
            product_key,
            unit_price,
            payment_method,
            total_requested,
            batches_committed: 0,
            total_processed: 0,
            state: BatchState::NotStarted,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Index the next new batch must carry.
    #[must_use]
    pub const fn next_batch_index(&self) -> u32 {
        self.batches_committed
    }

    /// Whether every requested unit has been issued.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.total_processed >= self.total_requested
    }

    /// Whether a new call carries the same request parameters.
    #[must_use]
    pub fn matches(
        &self,
        buyer_id: &UserId,
        product_key: &ProductKey,
        unit_price: Decimal,
        payment_method: &PaymentMethod,
        total_requested: u64,
    ) -> bool {
        self.buyer_id == *buyer_id
            && self.product_key == *product_key
            && self.unit_price == unit_price
            && self.payment_method == *payment_method
            && self.total_requested == total_requested
    }

    /// Record a committed batch and move the state forward.
    ///
    /// Returns the record to store next to the checkpoint.
    pub fn record_batch(&mut self, codes: Vec<RedemptionCode>) -> BatchRecord {
        let batch_index = self.batches_committed;
        self.batches_committed = self.batches_committed.saturating_add(1);
        self.total_processed += codes.len() as u64;
        self.state = if self.is_complete() {
            BatchState::Complete
        } else {
            BatchState::InProgress
        };
        self.last_error = None;
        self.updated_at = Utc::now();

        BatchRecord {
            request_id: self.request_id.clone(),
            batch_index,
            codes,
            total_processed: self.total_processed,
            committed_at: self.updated_at,
        }
    }

    /// Record a failed batch attempt.
    ///
    /// Only an in-progress (or already failed) request can fail; a request
    /// that never committed a batch stays `NotStarted` and a complete one
    /// stays complete.
    pub fn record_failure(&mut self, message: impl Into<String>) {
        if matches!(self.state, BatchState::InProgress | BatchState::Failed) {
            self.state = BatchState::Failed;
            self.last_error = Some(message.into());
            self.updated_at = Utc::now();
        }
    }
}

/// Codes issued by one committed batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchRecord {
    /// Request the batch belongs to.
    pub request_id: RequestId,
    /// Index of the batch.
    pub batch_index: u32,
    /// Codes the batch issued.
    pub codes: Vec<RedemptionCode>,
    /// Units issued up to and including this batch.
    pub total_processed: u64,
    /// When the batch committed.
    pub committed_at: DateTime<Utc>,
}

/// Result of one batch call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchProgress {
    /// Index of the batch this call handled.
    pub batch_index: u32,
    /// Units issued by this batch.
    pub items_processed_this_call: u64,
    /// Units issued over all batches so far.
    pub total_processed: u64,
    /// Units requested over all batches.
    pub total_requested: u64,
    /// Index the caller sends next.
    pub next_batch_index: u32,
    /// Whether the caller should stop looping.
    pub is_complete: bool,
    /// Request state after this call.
    pub state: BatchState,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checkpoint(total: u64) -> BatchCheckpoint {
        BatchCheckpoint::new(
            "req-1".parse().unwrap(),
            UserId::generate(),
            "tv:30d".parse().unwrap(),
            Decimal::from(99),
            PaymentMethod::Credits,
            total,
        )
    }

    fn codes(n: usize) -> Vec<RedemptionCode> {
        (0..n)
            .map(|i| format!("TV{i:08}").parse().unwrap())
            .collect()
    }

    #[test]
    fn chunk_sizes() {
        assert_eq!(next_chunk_len(37, 0, 10), 10);
        assert_eq!(next_chunk_len(37, 30, 10), 7);
        assert_eq!(next_chunk_len(37, 37, 10), 0);
    }

    #[test]
    fn state_moves_forward() {
        let mut cp = checkpoint(15);
        assert_eq!(cp.state, BatchState::NotStarted);
        assert_eq!(cp.next_batch_index(), 0);

        let first = cp.record_batch(codes(10));
        assert_eq!(first.batch_index, 0);
        assert_eq!(first.total_processed, 10);
        assert_eq!(cp.state, BatchState::InProgress);
        assert!(!cp.state.is_terminal());
        assert_eq!(cp.next_batch_index(), 1);
        assert_eq!(cp.total_processed, 10);

        cp.record_failure("out of stock");
        assert_eq!(cp.state, BatchState::Failed);
        assert_eq!(cp.last_error.as_deref(), Some("out of stock"));

        let second = cp.record_batch(codes(5));
        assert_eq!(second.batch_index, 1);
        assert_eq!(second.codes.len(), 5);
        assert_eq!(second.total_processed, 15);
        assert_eq!(cp.state, BatchState::Complete);
        assert!(cp.is_complete());
        assert!(cp.last_error.is_none());
        assert!(cp.state.is_terminal());
    }

    #[test]
    fn failure_before_first_batch_keeps_not_started() {
        let mut cp = checkpoint(5);
        cp.record_failure("insufficient funds");
        assert_eq!(cp.state, BatchState::NotStarted);
        assert!(cp.last_error.is_none());
    }

    #[test]
    fn parameters_must_match() {
        let cp = checkpoint(10);
        assert!(cp.matches(
            &cp.buyer_id,
            &cp.product_key,
            cp.unit_price,
            &PaymentMethod::Credits,
            10
        ));
        assert!(!cp.matches(
            &cp.buyer_id,
            &cp.product_key,
            cp.unit_price,
            &PaymentMethod::Credits,
            11
        ));
        assert!(!cp.matches(
            &UserId::generate(),
            &cp.product_key,
            cp.unit_price,
            &PaymentMethod::Credits,
            10
        ));
    }
}
