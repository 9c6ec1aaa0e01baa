//! DTOs for payment and subscription endpoints.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::{Cancellation, CheckoutCreated};
use crate::domain::gateways::CancelOutcome;

/// Request body for `POST /api/payment/create-subscription`.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubscriptionRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email and plan are required"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "Email and plan are required"))]
    pub plan: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub provider: &'static str,
    pub subscription_id: String,
    pub status: String,
    pub checkout_url: Option<String>,
    pub subscription_status: &'static str,
}

impl From<CheckoutCreated> for CheckoutResponse {
    fn from(created: CheckoutCreated) -> Self {
        Self {
            provider: created.provider.as_str(),
            subscription_id: created.subscription.id,
            status: created.subscription.status,
            checkout_url: created.subscription.checkout_url,
            subscription_status: created.user.subscription_status.as_str(),
        }
    }
}

/// Request body for `POST /api/payment/verify` (Razorpay checkout callback).
#[derive(Debug, Deserialize, Validate)]
pub struct VerifyPaymentRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Payment details are required"))]
    pub razorpay_subscription_id: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Payment details are required"))]
    pub razorpay_payment_id: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Payment details are required"))]
    pub razorpay_signature: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
}

/// Request body for `POST /api/subscription/cancel`.
#[derive(Debug, Deserialize, Validate)]
pub struct CancelSubscriptionRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct CancellationResponse {
    pub plan: &'static str,
    pub subscription_status: &'static str,
    pub cancelled_immediately: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effective_at: Option<String>,
}

impl From<Cancellation> for CancellationResponse {
    fn from(c: Cancellation) -> Self {
        let (cancelled_immediately, effective_at) = match c.outcome {
            CancelOutcome::Immediate => (true, None),
            CancelOutcome::Scheduled { effective_at } => (false, effective_at),
        };

        Self {
            plan: c.user.plan.as_str(),
            subscription_status: c.user.subscription_status.as_str(),
            cancelled_immediately,
            effective_at,
        }
    }
}

/// Acknowledgement returned to payment providers.
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    pub received: bool,
}
