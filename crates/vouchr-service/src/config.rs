//! Service configuration.

use std::str::FromStr;

use vouchr_engine::EngineConfig;
use vouchr_store::{StoreConfig, DEFAULT_LOCK_TIMEOUT_MS};

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/vouchr").
    pub data_dir: String,

    /// Service API key for service-to-service auth. Without one every `/v1`
    /// request is rejected.
    pub service_api_key: Option<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Issuance engine settings.
    pub engine: EngineConfig,

    /// Storage settings.
    pub store: StoreConfig,
}

impl ServiceConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = EngineConfig::default();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/vouchr".into()),
            service_api_key: std::env::var("SERVICE_API_KEY").ok(),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: env_or("MAX_BODY_BYTES", 1024 * 1024), // 1MB
            request_timeout_seconds: env_or("REQUEST_TIMEOUT_SECONDS", 30),
            engine: EngineConfig {
                low_stock_threshold: env_or("LOW_STOCK_THRESHOLD", defaults.low_stock_threshold),
                batch_chunk_size: env_or("BATCH_CHUNK_SIZE", defaults.batch_chunk_size),
                max_code_attempts: env_or("MAX_CODE_ATTEMPTS", defaults.max_code_attempts),
                max_units_per_call: env_or("MAX_UNITS_PER_PURCHASE", defaults.max_units_per_call),
            },
            store: StoreConfig {
                lock_timeout_ms: env_or("LOCK_TIMEOUT_MS", DEFAULT_LOCK_TIMEOUT_MS),
            },
        }
    }
}

/// Parse an environment variable, falling back when unset or malformed.
fn env_or<T: FromStr>(name: &str, default: T) -> T {
    match std::env::var(name) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(name, value = %raw, "Ignoring malformed setting");
            default
        }),
        Err(_) => default,
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/vouchr".into(),
            service_api_key: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            engine: EngineConfig::default(),
            store: StoreConfig::default(),
        }
    }
}
