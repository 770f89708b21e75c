//! API handlers.

pub mod accounts;
pub mod batches;
pub mod codes;
pub mod health;
pub mod purchases;
pub mod redemptions;
pub mod stock;

use serde::Deserialize;

use crate::error::ApiError;

/// Run an engine call off the async workers.
///
/// Engine calls block on `RocksDB` row locks for up to the lock timeout.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("spawn_blocking: {e}")))?
}

/// Pagination query parameters.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    /// Maximum number of items to return (default: 50, max 100).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

impl PageQuery {
    /// The limit clamped to the page ceiling.
    #[must_use]
    pub fn capped_limit(&self) -> usize {
        self.limit.min(100)
    }
}
