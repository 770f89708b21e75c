//! Redemption resolver tests.

mod common;

use std::sync::Barrier;

use common::Engine;
use vouchr_core::{
    Decimal, IssuanceError, LineItem, MemberRole, PaymentMethod, PurchaseMode, PurchaseRequest,
    RedemptionCode, UserId,
};
use vouchr_store::Store;

fn buy_one(engine: &Engine, key: &str) -> (UserId, RedemptionCode) {
    let buyer = engine.buyer(1000);
    let key = engine.stock(key, 10);
    let receipt = engine
        .coordinator
        .issue(&PurchaseRequest {
            buyer_id: buyer,
            line_items: vec![LineItem::new(key, Decimal::from(150), 1)],
            payment_method: PaymentMethod::Credits,
            mode: PurchaseMode::Resale,
        })
        .unwrap();
    (buyer, receipt.codes[0].code.clone())
}

#[test]
fn redeem_binds_code_and_returns_owner() {
    let engine = Engine::new();
    let (owner, code) = buy_one(&engine, "invitation:dealer");
    let redeemer = UserId::generate();

    let redemption = engine.resolver.redeem(&code, redeemer).unwrap();

    assert_eq!(redemption.owner_id, owner);
    assert_eq!(redemption.owner_role, MemberRole::Reseller);
    assert_eq!(redemption.owner_level, 2);
    assert_eq!(redemption.granted_role, Some(MemberRole::Dealer));
    assert_eq!(redemption.redeemed_by, redeemer);

    let stored = engine.store.get_code(&code).unwrap().unwrap();
    assert_eq!(stored.redeemed_by, Some(redeemer));
    assert!(stored.redeemed_at.is_some());
}

#[test]
fn non_invitation_codes_grant_no_role() {
    let engine = Engine::new();
    let (_, code) = buy_one(&engine, "eload:100");

    let redemption = engine.resolver.redeem(&code, UserId::generate()).unwrap();
    assert_eq!(redemption.granted_role, None);
}

#[test]
fn second_redemption_fails_and_keeps_first_redeemer() {
    let engine = Engine::new();
    let (_, code) = buy_one(&engine, "registration:standard");
    let first = UserId::generate();

    engine.resolver.redeem(&code, first).unwrap();
    let err = engine.resolver.redeem(&code, UserId::generate()).unwrap_err();

    assert!(matches!(err, IssuanceError::AlreadyRedeemed { .. }));
    let stored = engine.store.get_code(&code).unwrap().unwrap();
    assert_eq!(stored.redeemed_by, Some(first));
}

#[test]
fn unknown_code_is_not_found() {
    let engine = Engine::new();
    let code: RedemptionCode = "REG0000000".parse().unwrap();

    let err = engine.resolver.redeem(&code, UserId::generate()).unwrap_err();
    assert!(matches!(err, IssuanceError::CodeNotFound { .. }));
}

#[test]
fn concurrent_redeemers_have_one_winner() {
    let engine = Engine::new();
    let (_, code) = buy_one(&engine, "package:starter");
    let redeemers: Vec<UserId> = (0..8).map(|_| UserId::generate()).collect();
    let barrier = Barrier::new(redeemers.len());

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = redeemers
            .iter()
            .map(|redeemer| {
                let resolver = &engine.resolver;
                let code = &code;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    resolver.redeem(code, *redeemer)
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    let winners: Vec<_> = results.iter().filter_map(|r| r.as_ref().ok()).collect();
    assert_eq!(winners.len(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(
            matches!(
                err,
                IssuanceError::AlreadyRedeemed { .. } | IssuanceError::Conflict(_)
            ),
            "unexpected error: {err:?}"
        );
    }

    let stored = engine.store.get_code(&code).unwrap().unwrap();
    assert_eq!(stored.redeemed_by, Some(winners[0].redeemed_by));
}
