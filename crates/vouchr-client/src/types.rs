//! Request and response types for the vouchr client.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vouchr_core::{BatchState, PaymentMethod, PurchaseMode};

use crate::error::ClientError;

/// One line of a purchase.
#[derive(Debug, Clone, Serialize)]
pub struct LineItemRequest {
    /// Product key, e.g. `tv:30d`.
    pub product_key: String,
    /// Price per unit.
    pub unit_price: Decimal,
    /// Units to buy.
    pub quantity: u32,
}

/// Single-call purchase request.
#[derive(Debug, Clone, Serialize)]
pub struct PurchaseRequest {
    /// Buyer user ID.
    pub buyer_id: String,
    /// Products and quantities.
    pub line_items: Vec<LineItemRequest>,
    /// How the purchase is paid.
    pub payment_method: PaymentMethod,
    /// Resale or buy-own.
    pub mode: PurchaseMode,
}

/// An issued code as returned by the API.
#[derive(Debug, Clone, Deserialize)]
pub struct CodeInfo {
    /// The code.
    pub code: String,
    /// Purchaser.
    pub owner_id: String,
    /// Product key.
    pub product_key: String,
    /// Price paid for this unit.
    pub unit_price: Decimal,
    /// Purchase that created the code.
    pub issuance_id: String,
    /// Purchase timestamp.
    pub purchased_at: String,
    /// Redeemer, once redeemed.
    pub redeemed_by: Option<String>,
    /// Redemption timestamp.
    pub redeemed_at: Option<String>,
}

/// Stock level of one product.
#[derive(Debug, Clone, Deserialize)]
pub struct StockInfo {
    /// Product key.
    pub product_key: String,
    /// Units left.
    pub count: u64,
    /// Whether the count is at or below the low-stock threshold.
    pub is_low_stock: bool,
}

/// Single-call purchase response.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseResponse {
    /// Whether the purchase committed.
    pub success: bool,
    /// Purchase ID.
    pub issuance_id: String,
    /// One code per unit.
    pub codes: Vec<CodeInfo>,
    /// Total charged.
    pub total_cost: Decimal,
    /// Buyer balance after the purchase.
    pub new_balance: Decimal,
    /// Stock left per product.
    pub stock: Vec<StockInfo>,
}

/// A large order to issue in batches.
#[derive(Debug, Clone)]
pub struct BatchOrder {
    /// Id shared by every call of the order.
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
}

/// One call of a batched purchase.
#[derive(Debug, Clone, Serialize)]
pub struct BatchPurchaseRequest {
    /// Id shared by every call of the order.
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
    /// Batch this call should issue.
    pub batch_index: u32,
    /// Codes received from earlier calls.
    pub already_processed: Vec<String>,
}

impl BatchPurchaseRequest {
    /// The call for `batch_index` of `order`.
    #[must_use]
    pub fn for_order(order: &BatchOrder, batch_index: u32, already_processed: Vec<String>) -> Self {
        Self {
            request_id: order.request_id.clone(),
            buyer_id: order.buyer_id.clone(),
            product_key: order.product_key.clone(),
            unit_price: order.unit_price,
            total_quantity: order.total_quantity,
            payment_method: order.payment_method.clone(),
            batch_index,
            already_processed,
        }
    }
}

/// Response to one batch call.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchPurchaseResponse {
    /// Whether the batch committed.
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
    /// Whether the batch had already committed and was replayed.
    #[serde(default)]
    pub replayed: bool,
}

/// Result of driving an order through every batch.
///
/// Committed batches stay committed when a later batch fails.
#[derive(Debug)]
pub struct BatchRun {
    /// Batches that committed, in order.
    pub batches: Vec<BatchPurchaseResponse>,
    /// The first failure, if the order did not complete.
    pub error: Option<ClientError>,
}

impl BatchRun {
    /// Every code issued across the committed batches.
    #[must_use]
    pub fn codes(&self) -> Vec<String> {
        self.batches
            .iter()
            .flat_map(|b| b.newly_issued.iter().cloned())
            .collect()
    }

    /// Whether the last committed batch completed the order.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.batches.last().is_some_and(|b| b.is_complete)
    }
}

/// Stored progress of a batched order.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchStatus {
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

/// Redemption request.
#[derive(Debug, Clone, Serialize)]
pub struct RedeemRequest {
    /// The code.
    pub code: String,
    /// Who is redeeming it.
    pub redeemer_id: String,
}

/// Redemption response.
#[derive(Debug, Clone, Deserialize)]
pub struct RedeemResponse {
    /// Whether the redemption committed.
    pub success: bool,
    /// The normalized code.
    pub code: String,
    /// Who bought the code.
    pub owner_id: String,
    /// The owner's role.
    pub owner_role: String,
    /// The owner's level.
    pub owner_level: u32,
    /// Product the code was issued for.
    pub product_key: String,
    /// Role granted by invitation codes.
    pub granted_role: Option<String>,
    /// Redemption timestamp.
    pub redeemed_at: String,
}

/// Set stock request.
#[derive(Debug, Clone, Serialize)]
pub struct SetStockRequest {
    /// New unit count.
    pub count: u64,
}

/// Balance response.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceResponse {
    /// User ID.
    pub user_id: String,
    /// Current balance.
    pub balance: Decimal,
}

/// Add credits request.
#[derive(Debug, Clone, Serialize)]
pub struct AddCreditsRequest {
    /// User ID to credit.
    pub user_id: String,
    /// Amount to add.
    pub amount: Decimal,
    /// `top_up`, `refund` or `adjustment`.
    pub transaction_type: String,
    /// Reason shown in the ledger.
    pub description: String,
}

/// Add credits response.
#[derive(Debug, Clone, Deserialize)]
pub struct AddCreditsResponse {
    /// Whether the credit committed.
    pub success: bool,
    /// Ledger entry ID.
    pub transaction_id: String,
    /// Balance after the credit.
    pub new_balance: Decimal,
}

/// API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error details.
    pub error: ApiErrorBody,
}

/// API error body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
    /// Additional details.
    pub details: Option<serde_json::Value>,
}
