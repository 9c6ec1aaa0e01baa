mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};

use common::{TestSettings, spawn_app, test_app};
use napstopper::prelude::{Plan, SubscriptionStatus};

#[tokio::test]
async fn test_auth_registers_then_authenticates() {
    let app = test_app();

    let response = app
        .server
        .post("/api/users/auth")
        .json(&json!({ "email": "a@b.com" }))
        .await;

    response.assert_status(StatusCode::CREATED);
    let json = response.json::<Value>();
    assert_eq!(json["message"], "User account created successfully");
    assert_eq!(json["data"]["is_new_user"], true);
    assert_eq!(json["data"]["user"]["credit"], 21_600);
    assert_eq!(json["data"]["user"]["plan"], "free");
    assert_eq!(json["data"]["user_count"], 1);
    assert!(json["data"]["links"].as_array().unwrap().is_empty());

    let response = app
        .server
        .post("/api/users/auth")
        .json(&json!({ "email": "a@b.com" }))
        .await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["message"], "User authenticated successfully");
    assert_eq!(json["data"]["is_new_user"], false);
    assert_eq!(json["data"]["user_count"], 1);
    assert_eq!(app.user_count(), 1);
}

#[tokio::test]
async fn test_auth_returns_existing_links() {
    let app = test_app();
    let user = app.seed_user("a@b.com", 5_000);
    app.seed_link(user.id, "https://x.onrender.com");

    let response = app
        .server
        .post("/api/users/auth")
        .json(&json!({ "email": "a@b.com" }))
        .await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["data"]["user"]["credit"], 5_000);
    assert_eq!(json["data"]["links"][0]["url"], "https://x.onrender.com");
}

#[tokio::test]
async fn test_auth_registration_cap() {
    let app = spawn_app(TestSettings {
        max_users: 2,
        ..TestSettings::default()
    });
    app.seed_user("one@b.com", 21_600);
    app.seed_user("two@b.com", 21_600);

    let response = app
        .server
        .post("/api/users/auth")
        .json(&json!({ "email": "three@b.com" }))
        .await;

    response.assert_status(StatusCode::FORBIDDEN);
    let json = response.json::<Value>();
    assert_eq!(json["error"], "registration_closed");
    assert_eq!(json["data"]["current_user_count"], 2);
    assert_eq!(json["data"]["max_users"], 2);
    assert_eq!(app.user_count(), 2);

    // Existing users still get in.
    app.server
        .post("/api/users/auth")
        .json(&json!({ "email": "one@b.com" }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn test_auth_invalid_email() {
    let app = test_app();

    for body in [json!({}), json!({ "email": "" }), json!({ "email": "nope" })] {
        let response = app.server.post("/api/users/auth").json(&body).await;
        response.assert_status_bad_request();
        assert_eq!(response.json::<Value>()["error"], "invalid_input", "{body}");
    }
    assert_eq!(app.user_count(), 0);
}

#[tokio::test]
async fn test_plan() {
    let app = test_app();
    app.seed_user("a@b.com", 21_600);
    app.update_user("a@b.com", |u| {
        u.plan = Plan::Paid;
        u.subscription_status = SubscriptionStatus::Active;
        u.subscription_id = Some("sub_123".to_string());
    });

    let response = app.server.get("/api/user/a@b.com/plan").await;

    response.assert_status_ok();
    let json = response.json::<Value>();
    assert_eq!(json["data"]["plan"], "paid");
    assert_eq!(json["data"]["subscription_status"], "active");
    assert_eq!(json["data"]["subscription_id"], "sub_123");
}

#[tokio::test]
async fn test_plan_unknown_user() {
    let app = test_app();

    app.server
        .get("/api/user/nobody@b.com/plan")
        .await
        .assert_status_not_found();
}
