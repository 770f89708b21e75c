//! Stock integration tests.

mod common;

use std::time::{Duration, Instant};

use common::TestHarness;
use serde_json::{json, Value};
use vouchr_core::ProductKey;
use vouchr_engine::EngineConfig;

#[tokio::test]
async fn set_then_get_stock() {
    let harness = TestHarness::new();

    let response = harness
        .put("/v1/stock/package:gold")
        .json(&json!({ "count": 40 }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["count"], 40);
    assert_eq!(body["is_low_stock"], false);

    let body: Value = harness.get("/v1/stock/package:gold").await.json();
    assert_eq!(body["product_key"], "package:gold");
    assert_eq!(body["count"], 40);
}

#[tokio::test]
async fn low_stock_uses_configured_threshold() {
    let harness = TestHarness::with_engine(EngineConfig {
        low_stock_threshold: 3,
        ..EngineConfig::default()
    });
    harness.stock("tv:7d", 3);
    harness.stock("tv:30d", 4);

    let at: Value = harness.get("/v1/stock/tv:7d").await.json();
    assert_eq!(at["is_low_stock"], true);

    let above: Value = harness.get("/v1/stock/tv:30d").await.json();
    assert_eq!(above["is_low_stock"], false);
}

#[tokio::test]
async fn unstocked_product_is_not_found() {
    let harness = TestHarness::new();

    let response = harness.get("/v1/stock/gsat:365d").await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "product_not_found");
}

#[tokio::test]
async fn invalid_product_key_is_bad_request() {
    let harness = TestHarness::new();

    harness
        .get("/v1/stock/lottery:big")
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn restock_waiting_on_a_row_lock_leaves_other_requests_running() {
    let harness = TestHarness::new();
    harness.stock("tv:30d", 5);

    let holder = harness.hold_row_lock(
        |txn| {
            let key: ProductKey = "tv:30d".parse().unwrap();
            txn.try_reserve(&key, 1).unwrap();
        },
        Duration::from_millis(400),
    );

    let started = Instant::now();
    let restock = async {
        harness
            .put("/v1/stock/tv:30d")
            .json(&json!({ "count": 50 }))
            .await
    };
    let health = async {
        harness.server.get("/health").await.assert_status_ok();
        started.elapsed()
    };
    let (response, health_elapsed) = tokio::join!(restock, health);
    holder.join().unwrap();

    response.assert_status_ok();
    assert!(
        health_elapsed < Duration::from_millis(300),
        "health check waited {health_elapsed:?} behind the restock"
    );
    assert_eq!(harness.available("tv:30d"), 50);
}
