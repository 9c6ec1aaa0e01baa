//! Payment webhook ingestion.
//!
//! Signature first, then parsing, then a single state transition keyed by
//! the provider's subscription id. Once a delivery is authenticated it is
//! always acknowledged: unknown events, unknown subscriptions and
//! persistence failures are logged for manual follow-up instead of being
//! retried by the provider.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;
use serde_json::json;
use tracing::{error, info, warn};

use crate::domain::entities::{PaymentProvider, SubscriptionEvent};
use crate::domain::gateways::{WebhookAdapter, WebhookEvent};
use crate::domain::repositories::{SubscriptionRepository, UserRepository};
use crate::error::AppError;

pub struct WebhookService {
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    adapters: HashMap<PaymentProvider, Arc<dyn WebhookAdapter>>,
}

impl WebhookService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        adapters: Vec<Arc<dyn WebhookAdapter>>,
    ) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|a| (a.provider(), a))
            .collect();

        Self {
            users,
            subscriptions,
            adapters,
        }
    }

    /// Looks up the adapter for a `{provider}` path segment.
    ///
    /// # Errors
    ///
    /// [`AppError::NotFound`] for an unknown or unconfigured provider.
    pub fn adapter(&self, provider: &str) -> Result<Arc<dyn WebhookAdapter>, AppError> {
        provider
            .parse::<PaymentProvider>()
            .ok()
            .and_then(|p| self.adapters.get(&p).cloned())
            .ok_or_else(|| {
                AppError::not_found(
                    "Webhook provider not configured",
                    json!({ "provider": provider }),
                )
            })
    }

    /// Authenticates and applies one webhook delivery.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidSignature`] if the signature is missing or wrong
    /// - [`AppError::Validation`] if a signed body is not valid JSON
    pub async fn ingest(
        &self,
        adapter: &dyn WebhookAdapter,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<(), AppError> {
        let provider = adapter.provider();

        let Some(signature) = signature.filter(|s| !s.is_empty()) else {
            warn!(%provider, "Webhook without signature");
            return Err(AppError::invalid_signature("Missing webhook signature"));
        };

        if !adapter.verify(body, signature) {
            warn!(%provider, "Webhook signature mismatch");
            return Err(AppError::invalid_signature("Invalid webhook signature"));
        }

        let event = adapter.parse(body).map_err(|e| {
            warn!(%provider, error = %e, "Malformed webhook payload");
            AppError::bad_request("Malformed webhook payload", json!({}))
        })?;

        match event {
            WebhookEvent::Ignored { event_type } => {
                counter!("webhook_events_total", "provider" => provider.as_str(), "outcome" => "ignored")
                    .increment(1);
                info!(%provider, %event_type, "Unhandled webhook event");
            }
            WebhookEvent::Transition(event) => {
                self.apply(provider, &event).await;
            }
            WebhookEvent::Linked {
                checkout_reference,
                subscription_id,
                then,
            } => {
                self.link(provider, &checkout_reference, &subscription_id)
                    .await;
                if let Some(kind) = then {
                    self.apply(
                        provider,
                        &SubscriptionEvent {
                            subscription_id,
                            kind,
                        },
                    )
                    .await;
                }
            }
        }

        Ok(())
    }

    async fn link(&self, provider: PaymentProvider, checkout_reference: &str, subscription_id: &str) {
        match self
            .users
            .rebind_subscription(checkout_reference, subscription_id)
            .await
        {
            Ok(0) => warn!(
                %provider,
                checkout_reference,
                subscription_id,
                "No user holds this checkout reference"
            ),
            Ok(_) => info!(%provider, checkout_reference, subscription_id, "Subscription linked"),
            Err(e) => error!(
                %provider,
                checkout_reference,
                subscription_id,
                error = %e,
                "Failed to link subscription"
            ),
        }

        if let Err(e) = self
            .subscriptions
            .rebind(checkout_reference, subscription_id)
            .await
        {
            warn!(error = %e, subscription_id, "Failed to update subscription history");
        }
    }

    async fn apply(&self, provider: PaymentProvider, event: &SubscriptionEvent) {
        let transition = event.kind.transition();
        let sub_id = event.subscription_id.as_str();
        let kind = event.kind.as_str();

        match self.users.apply_transition(sub_id, transition).await {
            Ok(0) => {
                counter!("webhook_events_total", "provider" => provider.as_str(), "outcome" => "unmatched")
                    .increment(1);
                warn!(
                    %provider,
                    subscription_id = sub_id,
                    event = kind,
                    "Webhook for unknown or finished subscription"
                );
            }
            Ok(_) => {
                counter!("webhook_events_total", "provider" => provider.as_str(), "outcome" => "applied")
                    .increment(1);
                info!(
                    %provider,
                    subscription_id = sub_id,
                    event = kind,
                    status = %transition.status,
                    "Subscription updated"
                );
            }
            Err(e) => {
                counter!("webhook_events_total", "provider" => provider.as_str(), "outcome" => "failed")
                    .increment(1);
                error!(
                    %provider,
                    subscription_id = sub_id,
                    event = kind,
                    error = %e,
                    "Failed to apply subscription transition"
                );
            }
        }

        if let Err(e) = self
            .subscriptions
            .update_status(sub_id, transition.status)
            .await
        {
            warn!(error = %e, subscription_id = sub_id, "Failed to update subscription history");
        }
    }
}
