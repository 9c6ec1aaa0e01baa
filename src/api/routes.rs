//! API route configuration.
//!
//! Routes are split by rate-limit class; [`crate::routes::app_router`]
//! attaches the limiters. Tests mount [`api_routes`] directly, without
//! limiters, since those need the peer address of a real socket.

use crate::api::handlers::{
    add_credit_handler, add_url_handler, auth_handler, cancel_subscription_handler,
    create_subscription_handler, delete_link_handler, get_credit_handler, health_handler,
    plan_handler, response_times_handler, user_links_handler, verify_payment_handler,
    webhook_handler,
};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post},
};

/// Read-only endpoints.
///
/// # Endpoints
///
/// - `GET /health`                         - Service and database health
/// - `GET /credit/{email}`                 - Current credit balance
/// - `GET /user/{email}/links`             - Links with ping totals
/// - `GET /user/{email}/plan`              - Plan and subscription state
/// - `GET /user/{email}/response-times`    - Latest response times per URL
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/credit/{email}", get(get_credit_handler))
        .route("/user/{email}/links", get(user_links_handler))
        .route("/user/{email}/plan", get(plan_handler))
        .route("/user/{email}/response-times", get(response_times_handler))
}

/// Mutating endpoints, under the stricter limiter.
///
/// # Endpoints
///
/// - `POST   /credit/add`                    - Top up credit
/// - `POST   /urls`                          - Register a URL for monitoring
/// - `DELETE /links/{id}`                    - Remove a monitored URL
/// - `POST   /users/auth`                    - Sign in / register
/// - `POST   /payment/create-subscription`   - Start a checkout
/// - `POST   /payment/verify`                - Confirm a Razorpay checkout
/// - `POST   /subscription/cancel`           - Cancel at end of cycle
pub fn secure_routes() -> Router<AppState> {
    Router::new()
        .route("/credit/add", post(add_credit_handler))
        .route("/urls", post(add_url_handler))
        .route("/links/{id}", delete(delete_link_handler))
        .route("/users/auth", post(auth_handler))
        .route(
            "/payment/create-subscription",
            post(create_subscription_handler),
        )
        .route("/payment/verify", post(verify_payment_handler))
        .route("/subscription/cancel", post(cancel_subscription_handler))
}

/// Provider callbacks. Not rate limited: deliveries come from a handful of
/// provider addresses and are authenticated by signature.
///
/// - `POST /webhooks/{provider}` - Razorpay or Paddle subscription events
pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/webhooks/{provider}", post(webhook_handler))
}

/// Every `/api` route without rate limiting.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(public_routes())
        .merge(secure_routes())
        .merge(webhook_routes())
}
