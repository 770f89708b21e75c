//! Stock handlers.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use vouchr_core::{IssuanceError, ProductKey, ProductStock, StockLevel};
use vouchr_store::Store;

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::handlers::run_blocking;
use crate::state::AppState;

/// Stock level of one product.
#[derive(Debug, Serialize)]
pub struct StockResponse {
    /// The product key.
    pub product_key: String,
    /// Units left.
    pub count: u64,
    /// Whether the count is at or below the low-stock threshold.
    pub is_low_stock: bool,
}

impl From<StockLevel> for StockResponse {
    fn from(level: StockLevel) -> Self {
        Self {
            product_key: level.product_key.to_string(),
            count: level.available,
            is_low_stock: level.is_low_stock,
        }
    }
}

/// Get the stock level of a product.
pub async fn get_stock(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(product_key): Path<String>,
) -> Result<Json<StockResponse>, ApiError> {
    let key: ProductKey = product_key.parse().map_err(IssuanceError::from)?;
    let available = state.store.get_available(&key)?;

    Ok(Json(
        StockLevel::evaluate(key, available, state.config.engine.low_stock_threshold).into(),
    ))
}

/// Set stock request.
#[derive(Debug, Deserialize)]
pub struct SetStockRequest {
    /// New unit count.
    pub count: u64,
}

/// Set the stock count of a product.
pub async fn set_stock(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Path(product_key): Path<String>,
    Json(body): Json<SetStockRequest>,
) -> Result<Json<StockResponse>, ApiError> {
    let key: ProductKey = product_key.parse().map_err(IssuanceError::from)?;
    let store = Arc::clone(&state.store);
    let stock = ProductStock::new(key.clone(), body.count);
    run_blocking(move || Ok(store.put_stock(&stock)?)).await?;

    tracing::info!(
        service = %auth.service_name,
        product_key = %key,
        count = body.count,
        "Stock set"
    );

    Ok(Json(
        StockLevel::evaluate(key, body.count, state.config.engine.low_stock_threshold).into(),
    ))
}
