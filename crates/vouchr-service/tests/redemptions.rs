//! Redemption integration tests.

mod common;

use common::TestHarness;
use serde_json::{json, Value};
use vouchr_core::{MemberRole, UserId};

async fn buy_one(harness: &TestHarness, owner: &UserId, product_key: &str) -> String {
    harness.stock(product_key, 5);
    let body: Value = harness
        .post("/v1/purchases")
        .json(&json!({
            "buyer_id": owner.to_string(),
            "line_items": [{ "product_key": product_key, "unit_price": "10", "quantity": 1 }],
            "payment_method": { "type": "credits" },
        }))
        .await
        .json();
    body["codes"][0]["code"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn redeem_invitation_grants_role() {
    let harness = TestHarness::new();
    let owner = harness.account(MemberRole::Distributor, 4, 100);
    let code = buy_one(&harness, &owner, "invitation:dealer").await;
    let redeemer = UserId::generate();

    let response = harness
        .post("/v1/redemptions")
        .json(&json!({ "code": code, "redeemer_id": redeemer.to_string() }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["code"], code);
    assert_eq!(body["owner_id"], owner.to_string());
    assert_eq!(body["owner_role"], "distributor");
    assert_eq!(body["owner_level"], 4);
    assert_eq!(body["product_key"], "invitation:dealer");
    assert_eq!(body["granted_role"], "dealer");

    let stored: Value = harness.get(&format!("/v1/codes/{code}")).await.json();
    assert_eq!(stored["redeemed_by"], redeemer.to_string());
}

#[tokio::test]
async fn lowercase_input_is_normalized() {
    let harness = TestHarness::new();
    let owner = harness.account(MemberRole::Reseller, 1, 100);
    let code = buy_one(&harness, &owner, "wifi:1d").await;

    let response = harness
        .post("/v1/redemptions")
        .json(&json!({
            "code": code.to_lowercase(),
            "redeemer_id": UserId::generate().to_string(),
        }))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["code"], code);
    assert!(body["granted_role"].is_null());
}

#[tokio::test]
async fn second_redemption_is_conflict() {
    let harness = TestHarness::new();
    let owner = harness.account(MemberRole::Reseller, 1, 100);
    let code = buy_one(&harness, &owner, "tv:30d").await;

    harness
        .post("/v1/redemptions")
        .json(&json!({ "code": code, "redeemer_id": UserId::generate().to_string() }))
        .await
        .assert_status_ok();

    let response = harness
        .post("/v1/redemptions")
        .json(&json!({ "code": code, "redeemer_id": UserId::generate().to_string() }))
        .await;

    response.assert_status(axum::http::StatusCode::CONFLICT);
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "already_redeemed");
}

#[tokio::test]
async fn unknown_code_is_not_found() {
    let harness = TestHarness::new();

    let response = harness
        .post("/v1/redemptions")
        .json(&json!({ "code": "TV23456789", "redeemer_id": UserId::generate().to_string() }))
        .await;

    response.assert_status_not_found();
    let body: Value = response.json();
    assert_eq!(body["error"]["code"], "code_not_found");
}
