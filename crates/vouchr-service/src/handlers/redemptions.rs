//! Redemption handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use vouchr_core::{IssuanceError, RedemptionCode, UserId};

use crate::auth::ServiceAuth;
use crate::error::ApiError;
use crate::handlers::run_blocking;
use crate::state::AppState;

/// Redemption request.
#[derive(Debug, Deserialize)]
pub struct RedeemRequest {
    /// The code as typed by the user.
    pub code: String,
    /// Who is redeeming it.
    pub redeemer_id: String,
}

/// Redemption response.
#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    /// Always `true`; failures use the error body.
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
    /// When the code was redeemed.
    pub redeemed_at: String,
}

/// Redeem a code.
pub async fn redeem_code(
    State(state): State<Arc<AppState>>,
    auth: ServiceAuth,
    Json(body): Json<RedeemRequest>,
) -> Result<Json<RedeemResponse>, ApiError> {
    let code: RedemptionCode = body.code.parse().map_err(IssuanceError::from)?;
    let redeemer: UserId = body.redeemer_id.parse().map_err(IssuanceError::from)?;

    tracing::debug!(
        service = %auth.service_name,
        code = %code,
        redeemer = %redeemer,
        "Processing redemption"
    );

    let resolver = state.resolver.clone();
    let redemption = run_blocking(move || Ok(resolver.redeem(&code, redeemer)?)).await?;

    Ok(Json(RedeemResponse {
        success: true,
        code: redemption.code.to_string(),
        owner_id: redemption.owner_id.to_string(),
        owner_role: redemption.owner_role.to_string(),
        owner_level: redemption.owner_level,
        product_key: redemption.product_key.to_string(),
        granted_role: redemption.granted_role.map(|role| role.to_string()),
        redeemed_at: redemption.redeemed_at.to_rfc3339(),
    }))
}
