//! Router configuration.

use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{accounts, batches, codes, health, purchases, redemptions, stock};
use crate::state::AppState;

/// Maximum concurrent requests for issuance endpoints.
///
/// Each purchase holds a blocking thread while it waits on row locks.
const ISSUANCE_MAX_CONCURRENT_REQUESTS: usize = 32;

/// Maximum concurrent requests for general API endpoints.
const API_MAX_CONCURRENT_REQUESTS: usize = 50;

/// Create the service router with all routes and middleware.
///
/// # Routes
///
/// ## Public
/// - `GET /health` - Health check
///
/// ## Accounts (Service API Key auth)
/// - `POST /v1/accounts` - Create account
/// - `GET /v1/accounts/:user_id` - Get account
/// - `GET /v1/accounts/:user_id/balance` - Get balance
/// - `GET /v1/accounts/:user_id/transactions` - List ledger history
/// - `GET /v1/accounts/:user_id/codes` - List purchased codes
/// - `POST /v1/credits/add` - Top up, refund or adjust
///
/// ## Issuance (Service API Key auth, rate-limited)
/// - `POST /v1/purchases` - Buy codes in one call
/// - `POST /v1/purchases/batch` - Buy one batch of a large order
/// - `GET /v1/purchases/batch/:request_id` - Batch order progress
/// - `POST /v1/redemptions` - Redeem a code
///
/// ## Inventory (Service API Key auth)
/// - `GET /v1/stock/:product_key` - Stock level
/// - `PUT /v1/stock/:product_key` - Set stock count
/// - `GET /v1/codes/:code` - Look up a code
pub fn create_router(state: AppState) -> Router {
    let cors_origins = state.config.cors_origins.clone();
    let max_body_bytes = state.config.max_body_bytes;
    let request_timeout_seconds = state.config.request_timeout_seconds;

    let cors = build_cors_layer(&cors_origins);

    let state = Arc::new(state);

    let issuance_routes = Router::new()
        .route("/purchases", post(purchases::purchase_codes))
        .route("/purchases/batch", post(batches::purchase_batch))
        .route("/redemptions", post(redemptions::redeem_code))
        .layer(ConcurrencyLimitLayer::new(ISSUANCE_MAX_CONCURRENT_REQUESTS));

    let api_routes = Router::new()
        // Accounts
        .route("/accounts", post(accounts::create_account))
        .route("/accounts/:user_id", get(accounts::get_account))
        .route("/accounts/:user_id/balance", get(accounts::get_balance))
        .route(
            "/accounts/:user_id/transactions",
            get(accounts::list_transactions),
        )
        .route("/accounts/:user_id/codes", get(accounts::list_codes))
        .route("/credits/add", post(accounts::add_credits))
        // Batch progress
        .route("/purchases/batch/:request_id", get(batches::get_batch))
        // Inventory
        .route(
            "/stock/:product_key",
            get(stock::get_stock).put(stock::set_stock),
        )
        .route("/codes/:code", get(codes::get_code))
        .merge(issuance_routes)
        .layer(ConcurrencyLimitLayer::new(API_MAX_CONCURRENT_REQUESTS));

    Router::new()
        // Health (public, no rate limit)
        .route("/health", get(health::health))
        .nest("/v1", api_routes)
        // Global middleware
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(TimeoutLayer::new(Duration::from_secs(
            request_timeout_seconds,
        )))
        .with_state(state)
}

/// Build the CORS layer from configured origins.
fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(origins)
    }
}
