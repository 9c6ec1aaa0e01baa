//! Handlers for subscription checkout, payment verification and cancellation.

use axum::{Json, extract::State};
use validator::Validate;

use crate::api::dto::response::ApiResponse;
use crate::api::dto::subscription::{
    CancelSubscriptionRequest, CancellationResponse, CheckoutResponse, CreateSubscriptionRequest,
    VerifyPaymentRequest,
};
use crate::api::dto::user::PlanResponse;
use crate::api::extract::ApiJson;
use crate::domain::gateways::CancelOutcome;
use crate::error::AppError;
use crate::state::AppState;

/// Starts a subscription checkout with the configured payment provider.
///
/// # Endpoint
///
/// `POST /api/payment/create-subscription`
///
/// # Request Body
///
/// ```json
/// { "email": "user@example.com", "plan": "monthly" }
/// ```
///
/// # Errors
///
/// - `404` for an unknown user
/// - `409` if the user already has an active subscription
/// - `500` if the provider rejects the request
/// - `503` if no payment provider is configured
pub async fn create_subscription_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateSubscriptionRequest>,
) -> Result<Json<ApiResponse<CheckoutResponse>>, AppError> {
    payload.validate()?;

    let created = state
        .subscription_service
        .create_subscription(&payload.email, &payload.plan)
        .await?;

    Ok(ApiResponse::ok(
        "Subscription created",
        CheckoutResponse::from(created),
    ))
}

/// Verifies the Razorpay checkout signature and upgrades the plan.
///
/// # Endpoint
///
/// `POST /api/payment/verify`
///
/// # Errors
///
/// - `400 invalid_signature` if the signature does not match
/// - `403` if the subscription is not the one stored for this user
/// - `503` if Razorpay is not configured
pub async fn verify_payment_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<VerifyPaymentRequest>,
) -> Result<Json<ApiResponse<PlanResponse>>, AppError> {
    payload.validate()?;

    let user = state
        .subscription_service
        .verify_payment(
            &payload.email,
            &payload.razorpay_subscription_id,
            &payload.razorpay_payment_id,
            &payload.razorpay_signature,
        )
        .await?;

    Ok(ApiResponse::ok(
        "Payment verified and plan upgraded successfully",
        PlanResponse::from(user),
    ))
}

/// Cancels the user's subscription at the end of the billing cycle.
///
/// # Endpoint
///
/// `POST /api/subscription/cancel`
///
/// # Errors
///
/// `400` with one of `no_subscription`, `already_cancelled`,
/// `already_scheduled` or `past_due` when there is nothing to cancel.
pub async fn cancel_subscription_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CancelSubscriptionRequest>,
) -> Result<Json<ApiResponse<CancellationResponse>>, AppError> {
    payload.validate()?;

    let cancellation = state
        .subscription_service
        .cancel_subscription(&payload.email)
        .await?;

    let message = match cancellation.outcome {
        CancelOutcome::Immediate => "Subscription cancelled",
        CancelOutcome::Scheduled { .. } => {
            "Subscription will be cancelled at the end of the current billing period"
        }
    };

    Ok(ApiResponse::ok(
        message,
        CancellationResponse::from(cancellation),
    ))
}
