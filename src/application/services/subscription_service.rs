//! User-initiated subscription operations: checkout, payment verification
//! and cancellation.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::json;
use tracing::{error, info, warn};

use crate::domain::entities::{
    NewSubscription, PaymentProvider, Plan, SubscriptionStatus, User,
};
use crate::domain::gateways::{
    CancelOutcome, CheckoutRequest, GatewayError, PaymentGateway, ProviderSubscription,
};
use crate::domain::repositories::{SubscriptionRepository, UserRepository};
use crate::error::AppError;

use super::credit_service::require_email;

/// A provider checkout bound to a user.
#[derive(Debug, Clone)]
pub struct CheckoutCreated {
    pub provider: PaymentProvider,
    pub subscription: ProviderSubscription,
    pub user: User,
}

/// A confirmed cancellation request.
#[derive(Debug, Clone)]
pub struct Cancellation {
    pub user: User,
    pub outcome: CancelOutcome,
}

pub struct SubscriptionService {
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    gateways: HashMap<PaymentProvider, Arc<dyn PaymentGateway>>,
    default_provider: Option<PaymentProvider>,
}

impl SubscriptionService {
    /// `default_provider` handles new checkouts; every gateway in `gateways`
    /// can still cancel subscriptions it issued.
    pub fn new(
        users: Arc<dyn UserRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        gateways: Vec<Arc<dyn PaymentGateway>>,
        default_provider: Option<PaymentProvider>,
    ) -> Self {
        let gateways = gateways
            .into_iter()
            .map(|g| (g.provider(), g))
            .collect();

        Self {
            users,
            subscriptions,
            gateways,
            default_provider,
        }
    }

    fn gateway(&self, provider: Option<PaymentProvider>) -> Result<&dyn PaymentGateway, AppError> {
        provider
            .and_then(|p| self.gateways.get(&p))
            .map(|g| g.as_ref())
            .ok_or_else(|| AppError::unavailable("Payments are not configured"))
    }

    async fn require_user(&self, email: &str) -> Result<User, AppError> {
        require_email(email)?;

        self.users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found("User not found", json!({ "email": email })))
    }

    /// Starts a subscription checkout with the configured provider.
    ///
    /// # Errors
    ///
    /// - [`AppError::Unavailable`] when no provider is configured
    /// - [`AppError::NotFound`] for an unknown user
    /// - [`AppError::Conflict`] if the user is already billed
    /// - [`AppError::Internal`] if the provider call fails
    pub async fn create_subscription(
        &self,
        email: &str,
        plan: &str,
    ) -> Result<CheckoutCreated, AppError> {
        let gateway = self.gateway(self.default_provider)?;
        let user = self.require_user(email).await?;

        if user.subscription_status.is_billing() {
            return Err(AppError::conflict(
                "You already have an active subscription",
                json!({ "subscription_status": user.subscription_status.as_str() }),
            ));
        }

        let subscription = gateway
            .create_subscription(CheckoutRequest {
                user_id: user.id,
                email: user.email.clone(),
                plan: plan.to_string(),
            })
            .await
            .map_err(|e| gateway_failure("Failed to create subscription", gateway.provider(), e))?;

        self.users
            .attach_subscription(user.id, &subscription.id, SubscriptionStatus::Created)
            .await?;

        if let Err(e) = self
            .subscriptions
            .create(NewSubscription {
                user_id: user.id,
                provider: gateway.provider(),
                external_id: subscription.id.clone(),
                plan_type: plan.to_string(),
            })
            .await
        {
            warn!(error = %e, subscription_id = %subscription.id, "Failed to record subscription history");
        }

        info!(
            email = %email,
            provider = %gateway.provider(),
            subscription_id = %subscription.id,
            "Subscription checkout created"
        );

        let user = User {
            subscription_id: Some(subscription.id.clone()),
            subscription_status: SubscriptionStatus::Created,
            ..user
        };

        Ok(CheckoutCreated {
            provider: gateway.provider(),
            subscription,
            user,
        })
    }

    /// Confirms a Razorpay checkout callback and activates the plan.
    ///
    /// # Errors
    ///
    /// - [`AppError::Unavailable`] when Razorpay is not configured
    /// - [`AppError::InvalidSignature`] if the signature does not match
    /// - [`AppError::Forbidden`] if the subscription belongs to someone else
    pub async fn verify_payment(
        &self,
        email: &str,
        subscription_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<User, AppError> {
        let gateway = self.gateway(Some(PaymentProvider::Razorpay))?;
        let user = self.require_user(email).await?;

        let valid = gateway
            .verify_payment_signature(subscription_id, payment_id, signature)
            .map_err(|e| gateway_failure("Payment verification failed", gateway.provider(), e))?;
        if !valid {
            warn!(email = %email, subscription_id, "Payment signature mismatch");
            return Err(AppError::invalid_signature("Payment verification failed"));
        }

        if user.subscription_id.as_deref() != Some(subscription_id) {
            return Err(AppError::forbidden(
                "Subscription does not belong to this user",
                json!({ "subscription_id": subscription_id }),
            ));
        }

        let user = self
            .users
            .set_subscription_state(email, Some(Plan::Paid), SubscriptionStatus::Active)
            .await?
            .ok_or_else(|| AppError::not_found("User not found", json!({ "email": email })))?;

        self.record_status(subscription_id, SubscriptionStatus::Active)
            .await;
        info!(email = %email, subscription_id, payment_id, "Payment verified");

        Ok(user)
    }

    /// Cancels the user's subscription at the end of the billing cycle.
    ///
    /// A provider failure leaves the user untouched. A call the provider
    /// accepted but whose response could not be read is treated as scheduled.
    ///
    /// # Errors
    ///
    /// - [`AppError::NotFound`] for an unknown user
    /// - [`AppError::SubscriptionState`] when there is nothing to cancel
    /// - [`AppError::Internal`] if the provider call fails
    pub async fn cancel_subscription(&self, email: &str) -> Result<Cancellation, AppError> {
        let user = self.require_user(email).await?;

        let subscription_id = match (&user.subscription_id, user.subscription_status) {
            (None, _) | (_, SubscriptionStatus::None) => {
                return Err(AppError::subscription_state(
                    "no_subscription",
                    "No active subscription found",
                    json!({}),
                ));
            }
            (_, SubscriptionStatus::Cancelled) => {
                return Err(AppError::subscription_state(
                    "already_cancelled",
                    "Subscription is already cancelled",
                    json!({}),
                ));
            }
            (_, SubscriptionStatus::ScheduledCancel) => {
                return Err(AppError::subscription_state(
                    "already_scheduled",
                    "Cancellation is already scheduled for the end of the billing period",
                    json!({}),
                ));
            }
            (_, SubscriptionStatus::Completed) => {
                return Err(AppError::subscription_state(
                    "already_completed",
                    "Subscription has already completed all billing cycles",
                    json!({}),
                ));
            }
            (_, SubscriptionStatus::PastDue) => {
                return Err(AppError::subscription_state(
                    "past_due",
                    "Subscription is past due and cannot be cancelled right now",
                    json!({}),
                ));
            }
            (Some(id), _) => id.clone(),
        };

        let provider = match self.subscriptions.find_latest_for_user(user.id).await {
            Ok(Some(record)) if record.external_id == subscription_id => Some(record.provider),
            Ok(_) => self.default_provider,
            Err(e) => {
                warn!(error = %e, "Failed to read subscription history");
                self.default_provider
            }
        };
        let gateway = self.gateway(provider)?;

        let outcome = match gateway.cancel_at_cycle_end(&subscription_id).await {
            Ok(outcome) => outcome,
            Err(GatewayError::Decode(cause)) => {
                warn!(
                    subscription_id = %subscription_id,
                    %cause,
                    "Cancellation accepted but response unreadable, assuming scheduled"
                );
                CancelOutcome::Scheduled { effective_at: None }
            }
            Err(e) => {
                return Err(gateway_failure(
                    "Failed to cancel subscription",
                    gateway.provider(),
                    e,
                ));
            }
        };

        let (plan, status) = match outcome {
            CancelOutcome::Scheduled { .. } => (None, SubscriptionStatus::ScheduledCancel),
            CancelOutcome::Immediate => (Some(Plan::Free), SubscriptionStatus::Cancelled),
        };

        let user = self
            .users
            .set_subscription_state(email, plan, status)
            .await?
            .ok_or_else(|| AppError::not_found("User not found", json!({ "email": email })))?;

        self.record_status(&subscription_id, status).await;
        info!(email = %email, subscription_id = %subscription_id, status = %status, "Subscription cancellation requested");

        Ok(Cancellation { user, outcome })
    }

    async fn record_status(&self, external_id: &str, status: SubscriptionStatus) {
        if let Err(e) = self.subscriptions.update_status(external_id, status).await {
            warn!(error = %e, external_id, "Failed to update subscription history");
        }
    }
}

fn gateway_failure(message: &str, provider: PaymentProvider, err: GatewayError) -> AppError {
    error!(%provider, error = %err, "{message}");
    AppError::internal(
        message,
        json!({ "provider": provider.as_str(), "cause": err.to_string() }),
    )
}
