//! Purchase handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use vouchr_core::{
    IssuanceError, LineItem, PaymentMethod, ProductKey, PurchaseMode, PurchaseRequest, UserId,
};

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::handlers::codes::CodeResponse;
use crate::handlers::run_blocking;
use crate::handlers::stock::StockResponse;
use crate::state::AppState;

/// One line of a purchase.
#[derive(Debug, Deserialize)]
pub struct LineItemRequest {
    /// Product key, e.g. `tv:30d`.
    pub product_key: String,
    /// Price per unit, as a decimal string or number.
    pub unit_price: Decimal,
    /// Units to buy.
    pub quantity: u32,
}

/// Purchase request.
#[derive(Debug, Deserialize)]
pub struct PurchaseCodesRequest {
    /// Buyer user ID.
    pub buyer_id: String,
    /// Products and quantities.
    pub line_items: Vec<LineItemRequest>,
    /// How the purchase is paid.
    pub payment_method: PaymentMethod,
    /// Resale (default) or buy-own.
    #[serde(default)]
    pub mode: PurchaseMode,
}

impl PurchaseCodesRequest {
    fn into_request(self) -> Result<PurchaseRequest, IssuanceError> {
        let buyer_id: UserId = self.buyer_id.parse()?;
        let line_items = self
            .line_items
            .into_iter()
            .map(|item| {
                let key: ProductKey = item.product_key.parse()?;
                Ok(LineItem::new(key, item.unit_price, item.quantity))
            })
            .collect::<Result<Vec<_>, IssuanceError>>()?;

        Ok(PurchaseRequest {
            buyer_id,
            line_items,
            payment_method: self.payment_method,
            mode: self.mode,
        })
    }
}

/// Purchase response.
#[derive(Debug, Serialize)]
pub struct PurchaseCodesResponse {
    /// Always `true`; failures use the error body.
    pub success: bool,
    /// Purchase ID.
    pub issuance_id: String,
    /// One code per unit.
    pub codes: Vec<CodeResponse>,
    /// Total charged.
    pub total_cost: Decimal,
    /// Buyer balance after the purchase.
    pub new_balance: Decimal,
    /// Stock left per product.
    pub stock: Vec<StockResponse>,
}

/// Buy codes in one atomic transaction.
pub async fn purchase_codes(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<PurchaseCodesRequest>,
) -> Result<Json<PurchaseCodesResponse>, ApiError> {
    let request = body.into_request()?;

    tracing::debug!(
        service = %auth.service_name,
        buyer_id = %request.buyer_id,
        lines = request.line_items.len(),
        payment = request.payment_method.label(),
        "Processing purchase"
    );

    let coordinator = state.coordinator.clone();
    let receipt = run_blocking(move || Ok(coordinator.issue(&request)?)).await?;

    Ok(Json(PurchaseCodesResponse {
        success: true,
        issuance_id: receipt.issuance_id.to_string(),
        codes: receipt.codes.iter().map(CodeResponse::from).collect(),
        total_cost: receipt.total_cost,
        new_balance: receipt.new_balance,
        stock: receipt.stock.into_iter().map(StockResponse::from).collect(),
    }))
}
