//! HTTP API for the vouchr issuance engine.
//!
//! Back-office services call this API to:
//!
//! - Manage member credit accounts and top-ups
//! - Buy redemption codes, in one call or in checkpointed batches
//! - Redeem codes
//! - Maintain product stock
//!
//! # Authentication
//!
//! Every `/v1` route requires the shared service key in `x-api-key`. The
//! optional `x-service-name` header is recorded in logs.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Axum handlers must be async

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
