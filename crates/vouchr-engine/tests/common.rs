//! Shared fixtures for engine tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;
use vouchr_core::{
    CodeFormat, CreditAccount, Decimal, MemberRole, ProductKey, ProductStock, RedemptionCode,
    UserId,
};
use vouchr_engine::{
    BatchController, CodeSource, EngineConfig, IssuanceCoordinator, RedemptionResolver,
    SeededCodeSource,
};
use vouchr_store::{RocksStore, Store};

/// Replays scripted candidates, then falls back to a seeded generator.
pub struct ScriptedSource {
    script: Mutex<VecDeque<String>>,
    fallback: SeededCodeSource,
}

impl ScriptedSource {
    pub fn new(script: &[&str]) -> Self {
        Self {
            script: Mutex::new(script.iter().map(ToString::to_string).collect()),
            fallback: SeededCodeSource::new(42),
        }
    }
}

impl CodeSource for ScriptedSource {
    fn next_code(&self, format: CodeFormat) -> RedemptionCode {
        match self.script.lock().unwrap().pop_front() {
            Some(raw) => raw.parse().unwrap(),
            None => self.fallback.next_code(format),
        }
    }
}

pub struct Engine {
    pub store: Arc<RocksStore>,
    pub coordinator: IssuanceCoordinator,
    pub batches: BatchController,
    pub resolver: RedemptionResolver,
    _dir: TempDir,
}

impl Engine {
    pub fn new() -> Self {
        Self::with(Arc::new(SeededCodeSource::new(1)), EngineConfig::default())
    }

    pub fn with(codes: Arc<dyn CodeSource>, config: EngineConfig) -> Self {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RocksStore::open(dir.path()).unwrap());
        let coordinator = IssuanceCoordinator::new(Arc::clone(&store), codes, config);
        Self {
            batches: BatchController::new(coordinator.clone()),
            resolver: RedemptionResolver::new(Arc::clone(&store)),
            coordinator,
            store,
            _dir: dir,
        }
    }

    pub fn buyer(&self, balance: i64) -> UserId {
        let user_id = UserId::generate();
        let mut account = CreditAccount::new(user_id, MemberRole::Reseller, 2);
        account.balance = Decimal::from(balance);
        self.store.create_account(&account).unwrap();
        user_id
    }

    pub fn stock(&self, key: &str, count: u64) -> ProductKey {
        let key: ProductKey = key.parse().unwrap();
        self.store
            .put_stock(&ProductStock::new(key.clone(), count))
            .unwrap();
        key
    }

    pub fn balance(&self, user_id: &UserId) -> Decimal {
        self.store.get_balance(user_id).unwrap()
    }

    pub fn available(&self, key: &ProductKey) -> u64 {
        self.store.get_available(key).unwrap()
    }
}
