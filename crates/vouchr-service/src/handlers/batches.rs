//! Batch purchase handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vouchr_core::{BatchState, IssuanceError, PaymentMethod, RedemptionCode, RequestId};
use vouchr_engine::BatchRequest;

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::handlers::run_blocking;
use crate::state::AppState;

/// One call of a batched purchase.
#[derive(Debug, Deserialize)]
pub struct BatchPurchaseRequest {
    /// Id shared by every call of the same order.
    pub request_id: String,
    /// Buyer user ID.
    pub buyer_id: String,
    /// Product key.
    pub product_key: String,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Units over the whole order.
    pub total_quantity: u64,
    /// How the order is paid.
    pub payment_method: PaymentMethod,
    /// Batch this call should issue, starting at 0.
    pub batch_index: u32,
    /// Codes received from earlier calls.
    #[serde(default)]
    pub already_processed: Vec<String>,
}

impl BatchPurchaseRequest {
    fn into_request(self) -> Result<BatchRequest, IssuanceError> {
        let already_processed = self
            .already_processed
            .iter()
            .map(|raw| raw.parse::<RedemptionCode>())
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BatchRequest {
            request_id: self.request_id.parse()?,
            buyer_id: self.buyer_id.parse()?,
            product_key: self.product_key.parse()?,
            unit_price: self.unit_price,
            total_quantity: self.total_quantity,
            payment_method: self.payment_method,
            batch_index: self.batch_index,
            already_processed,
        })
    }
}

/// Batch purchase response.
#[derive(Debug, Serialize)]
pub struct BatchPurchaseResponse {
    /// Always `true`; failures use the error body.
    pub success: bool,
    /// The order's request id.
    pub request_id: String,
    /// Codes issued by this batch.
    pub newly_issued: Vec<String>,
    /// Batch handled by this call.
    pub batch_index: u32,
    /// Batch to send next.
    pub next_batch_index: u32,
    /// Units issued so far.
    pub total_processed: u64,
    /// Units in the whole order.
    pub total_requested: u64,
    /// Whether to stop looping.
    pub is_complete: bool,
    /// Order state.
    pub state: BatchState,
    /// Whether this batch had already committed and was replayed.
    pub replayed: bool,
}

/// Issue one batch of a large order.
pub async fn purchase_batch(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<BatchPurchaseRequest>,
) -> Result<Json<BatchPurchaseResponse>, ApiError> {
    let request = body.into_request()?;

    tracing::debug!(
        service = %auth.service_name,
        request_id = %request.request_id,
        batch_index = request.batch_index,
        total_quantity = request.total_quantity,
        "Processing batch"
    );

    let request_id = request.request_id.to_string();
    let batches = state.batches.clone();
    let outcome = run_blocking(move || Ok(batches.purchase_batch(&request)?)).await?;

    Ok(Json(BatchPurchaseResponse {
        success: true,
        request_id,
        newly_issued: outcome.newly_issued.iter().map(ToString::to_string).collect(),
        batch_index: outcome.progress.batch_index,
        next_batch_index: outcome.progress.next_batch_index,
        total_processed: outcome.progress.total_processed,
        total_requested: outcome.progress.total_requested,
        is_complete: outcome.progress.is_complete,
        state: outcome.progress.state,
        replayed: outcome.replayed,
    }))
}

/// Stored progress of a batched order.
#[derive(Debug, Serialize)]
pub struct BatchStatusResponse {
    /// The order's request id.
    pub request_id: String,
    /// Order state.
    pub state: BatchState,
    /// Batch to send next.
    pub next_batch_index: u32,
    /// Units issued so far.
    pub total_processed: u64,
    /// Units in the whole order.
    pub total_requested: u64,
    /// Error of the last failed batch.
    pub last_error: Option<String>,
}

/// Get the stored progress of a batched order.
pub async fn get_batch(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(request_id): Path<String>,
) -> Result<Json<BatchStatusResponse>, ApiError> {
    let request_id: RequestId = request_id.parse().map_err(IssuanceError::from)?;
    let checkpoint = state
        .batches
        .checkpoint(&request_id)?
        .ok_or_else(|| ApiError::NotFound(format!("batch request not found: {request_id}")))?;

    Ok(Json(BatchStatusResponse {
        request_id: checkpoint.request_id.to_string(),
        state: checkpoint.state,
        next_batch_index: checkpoint.next_batch_index(),
        total_processed: checkpoint.total_processed,
        total_requested: checkpoint.total_requested,
        last_error: checkpoint.last_error,
    }))
}
