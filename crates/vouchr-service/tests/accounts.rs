//! Account and credit integration tests.

mod common;

use std::time::{Duration, Instant};

use common::{decimal, TestHarness};
use serde_json::{json, Value};
use vouchr_core::{Decimal, MemberRole, UserId};

// ============================================================================
// Accounts
// ============================================================================

#[tokio::test]
async fn create_account_with_defaults() {
    let harness = TestHarness::new();

    let response = harness.post("/v1/accounts").json(&json!({})).await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["role"], "member");
    assert_eq!(body["level"], 1);
    assert_eq!(body["activated"], false);
    assert_eq!(decimal(&body["balance"]), Decimal::ZERO);
}

#[tokio::test]
async fn create_account_with_role() {
    let harness = TestHarness::new();
    let user_id = UserId::generate();

    let response = harness
        .post("/v1/accounts")
        .json(&json!({ "user_id": user_id.to_string(), "role": "dealer", "level": 3 }))
        .await;

    response.assert_status_ok();
    let body: Value = harness.get(&format!("/v1/accounts/{user_id}")).await.json();
    assert_eq!(body["user_id"], user_id.to_string());
    assert_eq!(body["role"], "dealer");
    assert_eq!(body["level"], 3);
}

#[tokio::test]
async fn create_duplicate_account_is_conflict() {
    let harness = TestHarness::new();
    let user_id = UserId::generate();
    let body = json!({ "user_id": user_id.to_string() });

    harness.post("/v1/accounts").json(&body).await.assert_status_ok();
    let response = harness.post("/v1/accounts").json(&body).await;

    response.assert_status(axum::http::StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "already_exists");
}

#[tokio::test]
async fn unknown_role_is_bad_request() {
    let harness = TestHarness::new();

    harness
        .post("/v1/accounts")
        .json(&json!({ "role": "overlord" }))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn unknown_account_is_not_found() {
    let harness = TestHarness::new();

    let response = harness
        .get(&format!("/v1/accounts/{}/balance", UserId::generate()))
        .await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "user_not_found");
}

// ============================================================================
// Credits
// ============================================================================

#[tokio::test]
async fn add_credits_updates_balance_and_ledger() {
    let harness = TestHarness::new();
    let user_id = harness.account(MemberRole::Reseller, 1, 0);

    let response = harness
        .post("/v1/credits/add")
        .json(&json!({
            "user_id": user_id.to_string(),
            "amount": "250.50",
            "description": "Counter top-up",
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(decimal(&body["new_balance"]), "250.50".parse::<Decimal>().unwrap());

    let balance: Value = harness
        .get(&format!("/v1/accounts/{user_id}/balance"))
        .await
        .json();
    assert_eq!(decimal(&balance["balance"]), "250.50".parse::<Decimal>().unwrap());

    let ledger: Value = harness
        .get(&format!("/v1/accounts/{user_id}/transactions"))
        .await
        .json();
    let entries = ledger["transactions"].as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["transaction_type"], "top_up");
    assert_eq!(entries[0]["description"], "Counter top-up");
    assert_eq!(entries[0]["id"], body["transaction_id"]);
    assert_eq!(ledger["has_more"], false);
}

#[tokio::test]
async fn add_credits_rejects_non_positive_and_debit_types() {
    let harness = TestHarness::new();
    let user_id = harness.account(MemberRole::Reseller, 1, 10);

    harness
        .post("/v1/credits/add")
        .json(&json!({ "user_id": user_id.to_string(), "amount": "0", "description": "none" }))
        .await
        .assert_status_bad_request();

    harness
        .post("/v1/credits/add")
        .json(&json!({
            "user_id": user_id.to_string(),
            "amount": "5",
            "transaction_type": "issuance",
            "description": "sneaky",
        }))
        .await
        .assert_status_bad_request();

    assert_eq!(harness.balance(&user_id), Decimal::from(10));
}

#[tokio::test]
async fn transactions_paginate_newest_first() {
    let harness = TestHarness::new();
    let user_id = harness.account(MemberRole::Reseller, 1, 0);

    for amount in ["1", "2", "3"] {
        harness
            .post("/v1/credits/add")
            .json(&json!({
                "user_id": user_id.to_string(),
                "amount": amount,
                "description": format!("top-up {amount}"),
            }))
            .await
            .assert_status_ok();
        // Ledger ids order by millisecond.
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let page: Value = harness
        .get(&format!("/v1/accounts/{user_id}/transactions?limit=2"))
        .await
        .json();
    let entries = page["transactions"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0]["description"], "top-up 3");
    assert_eq!(page["has_more"], true);

    let rest: Value = harness
        .get(&format!("/v1/accounts/{user_id}/transactions?limit=2&offset=2"))
        .await
        .json();
    assert_eq!(rest["transactions"].as_array().unwrap().len(), 1);
    assert_eq!(rest["has_more"], false);
}

#[tokio::test]
async fn accounts_require_api_key() {
    let harness = TestHarness::new();

    harness
        .server
        .post("/v1/accounts")
        .json(&json!({}))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn account_creation_waiting_on_a_row_lock_leaves_other_requests_running() {
    let harness = TestHarness::new();
    let user_id = UserId::generate();

    let holder = harness.hold_row_lock(
        move |txn| {
            assert!(txn.lock_account(&user_id).unwrap().is_none());
        },
        Duration::from_millis(400),
    );

    let started = Instant::now();
    let create = async {
        harness
            .post("/v1/accounts")
            .json(&json!({ "user_id": user_id.to_string() }))
            .await
    };
    let health = async {
        harness.server.get("/health").await.assert_status_ok();
        started.elapsed()
    };
    let (response, health_elapsed) = tokio::join!(create, health);
    holder.join().unwrap();

    response.assert_status_ok();
    assert!(
        health_elapsed < Duration::from_millis(300),
        "health check waited {health_elapsed:?} behind account creation"
    );
    assert_eq!(harness.balance(&user_id), Decimal::ZERO);
}
