//! Issued code lookup.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use rust_decimal::Decimal;
use serde::Serialize;

use vouchr_core::{IssuanceError, IssuedCode, RedemptionCode};
use vouchr_store::Store;

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::state::AppState;

/// An issued code.
#[derive(Debug, Serialize)]
pub struct CodeResponse {
    /// The code.
    pub code: String,
    /// Who bought it.
    pub owner_id: String,
    /// Product it was issued for.
    pub product_key: String,
    /// Price paid per unit.
    pub unit_price: Decimal,
    /// Purchase that created it.
    pub issuance_id: String,
    /// When it was bought.
    pub purchased_at: String,
    /// Who redeemed it, if anyone.
    pub redeemed_by: Option<String>,
    /// When it was redeemed.
    pub redeemed_at: Option<String>,
}

impl From<&IssuedCode> for CodeResponse {
    fn from(issued: &IssuedCode) -> Self {
        Self {
            code: issued.code.to_string(),
            owner_id: issued.owner_id.to_string(),
            product_key: issued.product_key.to_string(),
            unit_price: issued.unit_price,
            issuance_id: issued.issuance_id.to_string(),
            purchased_at: issued.purchased_at.to_rfc3339(),
            redeemed_by: issued.redeemed_by.map(|id| id.to_string()),
            redeemed_at: issued.redeemed_at.map(|at| at.to_rfc3339()),
        }
    }
}

/// Look up a single code.
pub async fn get_code(
    State(state): State<Arc<AppState>>,
    _auth: ServiceAuth,
    Path(code): Path<String>,
) -> Result<Json<CodeResponse>, ApiError> {
    let code: RedemptionCode = code.parse().map_err(IssuanceError::from)?;

    let issued = state
        .store
        .get_code(&code)?
        .ok_or_else(|| IssuanceError::CodeNotFound {
            code: code.to_string(),
        })?;

    Ok(Json(CodeResponse::from(&issued)))
}
