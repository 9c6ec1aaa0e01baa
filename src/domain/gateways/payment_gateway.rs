//! Outbound payment provider interface.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::entities::PaymentProvider;

/// Input for creating a provider-side subscription or checkout.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub user_id: i64,
    pub email: String,
    pub plan: String,
}

/// What the provider returned for a new subscription.
///
/// `id` is the reference stored on the user. For Paddle this is the checkout
/// transaction id until the `subscription.created` webhook rebinds it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderSubscription {
    pub id: String,
    pub status: String,
    pub checkout_url: Option<String>,
}

/// Result of a cancel-at-cycle-end request.
#[derive(Debug, Clone, PartialEq)]
pub enum CancelOutcome {
    /// Cancellation is scheduled; the plan stays paid until `effective_at`.
    Scheduled { effective_at: Option<String> },
    /// The provider cancelled right away.
    Immediate,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("payment provider unreachable: {0}")]
    Transport(String),

    #[error("payment provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected payment provider response: {0}")]
    Decode(String),

    #[error("operation not supported by {0}")]
    Unsupported(&'static str),
}

/// A payment provider able to create and cancel subscriptions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    fn provider(&self) -> PaymentProvider;

    /// Creates a subscription (Razorpay) or checkout transaction (Paddle).
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Transport`] or [`GatewayError::Api`] when the
    /// provider cannot be reached or refuses the request.
    async fn create_subscription(
        &self,
        request: CheckoutRequest,
    ) -> Result<ProviderSubscription, GatewayError>;

    /// Requests cancellation at the end of the current billing cycle.
    ///
    /// # Errors
    ///
    /// [`GatewayError::Decode`] means the provider accepted the call but the
    /// response body could not be read.
    async fn cancel_at_cycle_end(&self, subscription_id: &str)
    -> Result<CancelOutcome, GatewayError>;

    /// Checks a checkout callback signature.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Unsupported`] for providers without a
    /// client-side payment callback.
    fn verify_payment_signature(
        &self,
        subscription_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool, GatewayError>;
}
