//! Application state.

use std::sync::Arc;

use vouchr_engine::{
    BatchController, CodeSource, IssuanceCoordinator, RandomCodeSource, RedemptionResolver,
};
use vouchr_store::RocksStore;

use crate::config::ServiceConfig;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<RocksStore>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Single-call purchases.
    pub coordinator: IssuanceCoordinator,

    /// Batched purchases.
    pub batches: BatchController,

    /// Code redemption.
    pub resolver: RedemptionResolver,
}

impl AppState {
    /// Create a new application state drawing codes from the thread RNG.
    #[must_use]
    pub fn new(store: Arc<RocksStore>, config: ServiceConfig) -> Self {
        Self::with_code_source(store, config, Arc::new(RandomCodeSource))
    }

    /// Create a new application state with an explicit code source.
    #[must_use]
    pub fn with_code_source(
        store: Arc<RocksStore>,
        config: ServiceConfig,
        codes: Arc<dyn CodeSource>,
    ) -> Self {
        if config.service_api_key.is_none() {
            tracing::warn!("SERVICE_API_KEY not set - all /v1 requests will be rejected");
        }

        let coordinator =
            IssuanceCoordinator::new(Arc::clone(&store), codes, config.engine.clone());

        Self {
            batches: BatchController::new(coordinator.clone()),
            resolver: RedemptionResolver::new(Arc::clone(&store)),
            coordinator,
            store,
            config,
        }
    }
}
