mod common;

use axum::body::Bytes;
use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::{Value, json};

use common::{PADDLE_WEBHOOK_SECRET, RAZORPAY_WEBHOOK_SECRET, TestApp, test_app};
use napstopper::prelude::{Plan, SubscriptionStatus};
use napstopper::utils::signature::sign_hex;

fn razorpay_event(event: &str, subscription_id: &str) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "entity": "event",
        "event": event,
        "payload": { "subscription": { "entity": { "id": subscription_id } } }
    }))
    .unwrap()
}

fn paddle_signature(body: &[u8]) -> String {
    paddle_signature_at(body, Utc::now().timestamp())
}

fn paddle_signature_at(body: &[u8], ts: i64) -> String {
    let mut signed = format!("{ts}:").into_bytes();
    signed.extend_from_slice(body);
    format!("ts={ts};h1={}", sign_hex(PADDLE_WEBHOOK_SECRET.as_bytes(), &signed))
}

async fn post_razorpay(
    app: &TestApp,
    body: Vec<u8>,
    signature: &str,
) -> axum_test::TestResponse {
    app.server
        .post("/api/webhooks/razorpay")
        .content_type("application/json")
        .add_header("x-razorpay-signature", signature.to_string())
        .bytes(Bytes::from(body))
        .await
}

async fn post_signed_razorpay(app: &TestApp, body: Vec<u8>) -> axum_test::TestResponse {
    let signature = sign_hex(RAZORPAY_WEBHOOK_SECRET.as_bytes(), &body);
    post_razorpay(app, body, &signature).await
}

fn subscribed_user(app: &TestApp, email: &str, subscription_id: &str) {
    app.seed_user(email, 21_600);
    app.update_user(email, |u| {
        u.subscription_id = Some(subscription_id.to_string());
        u.subscription_status = SubscriptionStatus::Created;
    });
}

// ─── Razorpay ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_razorpay_activated_upgrades_plan() {
    let app = test_app();
    subscribed_user(&app, "a@b.com", "sub_1");

    let response =
        post_signed_razorpay(&app, razorpay_event("subscription.activated", "sub_1")).await;

    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["received"], true);

    let user = app.user("a@b.com").unwrap();
    assert_eq!(user.plan, Plan::Paid);
    assert_eq!(user.subscription_status, SubscriptionStatus::Active);
}

#[tokio::test]
async fn test_razorpay_late_activation_after_cancel() {
    let app = test_app();
    subscribed_user(&app, "a@b.com", "sub_1");

    for event in [
        "subscription.activated",
        "subscription.cancelled",
        "subscription.activated",
    ] {
        post_signed_razorpay(&app, razorpay_event(event, "sub_1"))
            .await
            .assert_status_ok();
    }

    let user = app.user("a@b.com").unwrap();
    assert_eq!(user.plan, Plan::Free);
    assert_eq!(user.subscription_status, SubscriptionStatus::Cancelled);
}

#[tokio::test]
async fn test_razorpay_lifecycle() {
    let app = test_app();
    subscribed_user(&app, "a@b.com", "sub_1");

    let steps = [
        ("subscription.activated", Plan::Paid, SubscriptionStatus::Active),
        ("subscription.halted", Plan::Free, SubscriptionStatus::PastDue),
        ("subscription.resumed", Plan::Paid, SubscriptionStatus::Active),
        ("subscription.paused", Plan::Free, SubscriptionStatus::Paused),
        ("subscription.activated", Plan::Paid, SubscriptionStatus::Active),
        ("subscription.cancelled", Plan::Free, SubscriptionStatus::Cancelled),
    ];

    for (event, plan, status) in steps {
        post_signed_razorpay(&app, razorpay_event(event, "sub_1"))
            .await
            .assert_status_ok();

        let user = app.user("a@b.com").unwrap();
        assert_eq!(user.plan, plan, "{event}");
        assert_eq!(user.subscription_status, status, "{event}");
    }
}

#[tokio::test]
async fn test_razorpay_unknown_subscription_acknowledged() {
    let app = test_app();
    subscribed_user(&app, "a@b.com", "sub_1");

    let response =
        post_signed_razorpay(&app, razorpay_event("subscription.activated", "sub_other")).await;

    response.assert_status_ok();
    let user = app.user("a@b.com").unwrap();
    assert_eq!(user.plan, Plan::Free);
    assert_eq!(user.subscription_status, SubscriptionStatus::Created);
}

#[tokio::test]
async fn test_razorpay_unhandled_event_acknowledged() {
    let app = test_app();
    subscribed_user(&app, "a@b.com", "sub_1");

    let response = post_signed_razorpay(&app, razorpay_event("payment.captured", "sub_1")).await;

    response.assert_status_ok();
    assert_eq!(
        app.user("a@b.com").unwrap().subscription_status,
        SubscriptionStatus::Created
    );
}

#[tokio::test]
async fn test_razorpay_bad_signature() {
    let app = test_app();
    subscribed_user(&app, "a@b.com", "sub_1");

    let response = post_razorpay(
        &app,
        razorpay_event("subscription.activated", "sub_1"),
        "deadbeef",
    )
    .await;

    response.assert_status_bad_request();
    let json = response.json::<Value>();
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "invalid_signature");

    let user = app.user("a@b.com").unwrap();
    assert_eq!(user.plan, Plan::Free);
    assert_eq!(user.subscription_status, SubscriptionStatus::Created);
}

#[tokio::test]
async fn test_razorpay_signature_over_different_body() {
    let app = test_app();
    subscribed_user(&app, "a@b.com", "sub_1");

    let signed_for = razorpay_event("subscription.cancelled", "sub_1");
    let signature = sign_hex(RAZORPAY_WEBHOOK_SECRET.as_bytes(), &signed_for);

    post_razorpay(
        &app,
        razorpay_event("subscription.activated", "sub_1"),
        &signature,
    )
    .await
    .assert_status_bad_request();

    assert_eq!(app.user("a@b.com").unwrap().plan, Plan::Free);
}

#[tokio::test]
async fn test_razorpay_missing_signature() {
    let app = test_app();

    let response = app
        .server
        .post("/api/webhooks/razorpay")
        .content_type("application/json")
        .bytes(Bytes::from(razorpay_event("subscription.activated", "sub_1")))
        .await;

    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"], "invalid_signature");
}

#[tokio::test]
async fn test_razorpay_malformed_payload() {
    let app = test_app();

    let response = post_signed_razorpay(&app, b"not json".to_vec()).await;

    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"], "invalid_input");
}

// ─── Paddle ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_paddle_created_rebinds_checkout_reference() {
    let app = test_app();
    subscribed_user(&app, "a@b.com", "txn_checkout_1");

    let body = serde_json::to_vec(&json!({
        "event_id": "evt_1",
        "event_type": "subscription.created",
        "data": {
            "id": "sub_paddle_1",
            "status": "active",
            "transaction_id": "txn_checkout_1"
        }
    }))
    .unwrap();

    let response = app
        .server
        .post("/api/webhooks/paddle")
        .content_type("application/json")
        .add_header("paddle-signature", paddle_signature(&body))
        .bytes(Bytes::from(body))
        .await;

    response.assert_status_ok();

    let user = app.user("a@b.com").unwrap();
    assert_eq!(user.subscription_id.as_deref(), Some("sub_paddle_1"));
    assert_eq!(user.plan, Plan::Paid);
    assert_eq!(user.subscription_status, SubscriptionStatus::Active);
}

#[tokio::test]
async fn test_paddle_updated_schedules_cancellation() {
    let app = test_app();
    subscribed_user(&app, "a@b.com", "sub_paddle_1");
    app.update_user("a@b.com", |u| {
        u.plan = Plan::Paid;
        u.subscription_status = SubscriptionStatus::Active;
    });

    let body = serde_json::to_vec(&json!({
        "event_type": "subscription.updated",
        "data": {
            "id": "sub_paddle_1",
            "status": "active",
            "scheduled_change": { "action": "cancel", "effective_at": "2026-11-18T00:00:00Z" }
        }
    }))
    .unwrap();

    app.server
        .post("/api/webhooks/paddle")
        .content_type("application/json")
        .add_header("paddle-signature", paddle_signature(&body))
        .bytes(Bytes::from(body))
        .await
        .assert_status_ok();

    let user = app.user("a@b.com").unwrap();
    assert_eq!(user.plan, Plan::Paid);
    assert_eq!(user.subscription_status, SubscriptionStatus::ScheduledCancel);
}

#[tokio::test]
async fn test_paddle_bad_signature() {
    let app = test_app();
    subscribed_user(&app, "a@b.com", "sub_paddle_1");

    let body = br#"{"event_type":"subscription.canceled","data":{"id":"sub_paddle_1"}}"#.to_vec();

    let response = app
        .server
        .post("/api/webhooks/paddle")
        .content_type("application/json")
        .add_header("paddle-signature", "ts=1700000000;h1=00")
        .bytes(Bytes::from(body))
        .await;

    response.assert_status_bad_request();
    assert_eq!(
        app.user("a@b.com").unwrap().subscription_status,
        SubscriptionStatus::Created
    );
}

#[tokio::test]
async fn test_paddle_replayed_delivery_is_rejected() {
    let app = test_app();
    subscribed_user(&app, "a@b.com", "sub_paddle_1");

    let body = br#"{"event_type":"subscription.activated","data":{"id":"sub_paddle_1"}}"#.to_vec();
    let captured_at = (Utc::now() - Duration::hours(1)).timestamp();

    let response = app
        .server
        .post("/api/webhooks/paddle")
        .content_type("application/json")
        .add_header("paddle-signature", paddle_signature_at(&body, captured_at))
        .bytes(Bytes::from(body))
        .await;

    response.assert_status_bad_request();
    assert_eq!(response.json::<Value>()["error"], "invalid_signature");
    let user = app.user("a@b.com").unwrap();
    assert_eq!(user.plan, Plan::Free);
    assert_eq!(user.subscription_status, SubscriptionStatus::Created);
}

// ─── Routing ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unknown_provider() {
    let app = test_app();

    let response = app
        .server
        .post("/api/webhooks/stripe")
        .content_type("application/json")
        .bytes(Bytes::from_static(b"{}"))
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
}
