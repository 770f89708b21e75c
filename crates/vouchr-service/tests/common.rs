//! Common test utilities for vouchr service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue};
use axum::Router;
use axum_test::{TestRequest, TestServer};
use serde_json::Value;
use tempfile::TempDir;

use vouchr_core::{CreditAccount, Decimal, MemberRole, ProductKey, ProductStock, UserId};
use vouchr_engine::{EngineConfig, SeededCodeSource};
use vouchr_service::{create_router, AppState, ServiceConfig};
use vouchr_store::{RocksStore, Store, StoreConfig, StoreTxn};

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// Direct store access for seeding and assertions.
    pub store: Arc<RocksStore>,
    /// Temporary directory for the database (kept alive for test duration).
    pub _temp_dir: TempDir,
    /// The service API key for service-to-service requests.
    pub service_api_key: String,
}

impl TestHarness {
    /// Create a new test harness with a fresh database.
    pub fn new() -> Self {
        Self::with_engine(EngineConfig::default())
    }

    /// Create a harness with custom engine settings.
    pub fn with_engine(engine: EngineConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = Arc::new(RocksStore::open(temp_dir.path()).expect("Failed to open store"));

        let service_api_key = "test-service-key".to_string();

        let config = ServiceConfig {
            listen_addr: "127.0.0.1:0".into(),
            data_dir: temp_dir.path().to_string_lossy().to_string(),
            service_api_key: Some(service_api_key.clone()),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            engine,
            store: StoreConfig::default(),
        };

        let state =
            AppState::with_code_source(Arc::clone(&store), config, Arc::new(SeededCodeSource::new(7)));
        let router: Router = create_router(state);

        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            _temp_dir: temp_dir,
            service_api_key,
        }
    }

    /// The service key header pair.
    pub fn api_key_header(&self) -> (HeaderName, HeaderValue) {
        (
            HeaderName::from_static("x-api-key"),
            HeaderValue::from_str(&self.service_api_key).expect("Invalid header value"),
        )
    }

    /// Authenticated GET.
    pub fn get(&self, path: &str) -> TestRequest {
        let (name, value) = self.api_key_header();
        self.server.get(path).add_header(name, value)
    }

    /// Authenticated POST.
    pub fn post(&self, path: &str) -> TestRequest {
        let (name, value) = self.api_key_header();
        self.server.post(path).add_header(name, value)
    }

    /// Authenticated PUT.
    pub fn put(&self, path: &str) -> TestRequest {
        let (name, value) = self.api_key_header();
        self.server.put(path).add_header(name, value)
    }

    /// Seed an account directly in the store.
    pub fn account(&self, role: MemberRole, level: u32, balance: i64) -> UserId {
        let user_id = UserId::generate();
        let mut account = CreditAccount::new(user_id, role, level);
        account.balance = Decimal::from(balance);
        self.store.create_account(&account).expect("Failed to seed account");
        user_id
    }

    /// Seed stock directly in the store.
    pub fn stock(&self, key: &str, count: u64) {
        let key: ProductKey = key.parse().expect("Invalid product key");
        self.store
            .put_stock(&ProductStock::new(key, count))
            .expect("Failed to seed stock");
    }

    pub fn balance(&self, user_id: &UserId) -> Decimal {
        self.store.get_balance(user_id).expect("Failed to read balance")
    }

    /// Hold the row locks taken by `lock` in another thread for `hold`, then roll back.
    ///
    /// Returns once the locks are held.
    pub fn hold_row_lock<F>(&self, lock: F, hold: Duration) -> JoinHandle<()>
    where
        F: FnOnce(&StoreTxn<'_>) + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let (locked_tx, locked_rx) = mpsc::channel();
        let holder = std::thread::spawn(move || {
            let txn = store.begin();
            lock(&txn);
            locked_tx.send(()).expect("Test dropped the lock receiver");
            std::thread::sleep(hold);
            txn.rollback().expect("Failed to roll back");
        });
        locked_rx.recv().expect("Lock holder panicked");
        holder
    }

    pub fn available(&self, key: &str) -> u64 {
        let key: ProductKey = key.parse().expect("Invalid product key");
        self.store.get_available(&key).expect("Failed to read stock")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Read a decimal field that serializes as a string.
pub fn decimal(value: &Value) -> Decimal {
    value
        .as_str()
        .expect("Decimal should serialize as a string")
        .parse()
        .expect("Invalid decimal")
}
