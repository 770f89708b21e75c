//! Batch checkpoints.

use vouchr_core::{BatchCheckpoint, BatchRecord, RequestId};

use crate::error::Result;
use crate::keys;
use crate::schema::cf;
use crate::txn::StoreTxn;

impl StoreTxn<'_> {
    /// Lock the checkpoint for a batch request.
    ///
    /// Locking an absent checkpoint still serializes concurrent first calls
    /// for the same request id.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock times out or the record cannot be read.
    pub fn lock_batch(&self, request_id: &RequestId) -> Result<Option<BatchCheckpoint>> {
        self.get_for_update(cf::BATCHES, &keys::batch_key(request_id))
    }

    /// Stage a checkpoint write.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written.
    pub fn put_batch(&self, checkpoint: &BatchCheckpoint) -> Result<()> {
        self.put(cf::BATCHES, &keys::batch_key(&checkpoint.request_id), checkpoint)
    }

    /// Read the codes of one committed batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be read.
    pub fn get_batch_record(
        &self,
        request_id: &RequestId,
        batch_index: u32,
    ) -> Result<Option<BatchRecord>> {
        self.get_for_update(
            cf::BATCH_RECORDS,
            &keys::batch_record_key(request_id, batch_index),
        )
    }

    /// Stage the codes of a committed batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written.
    pub fn put_batch_record(&self, record: &BatchRecord) -> Result<()> {
        self.put(
            cf::BATCH_RECORDS,
            &keys::batch_record_key(&record.request_id, record.batch_index),
            record,
        )
    }
}
