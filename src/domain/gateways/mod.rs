//! Interfaces to external collaborators other than the database.
//!
//! - [`PaymentGateway`] - Subscription creation and cancellation
//! - [`WebhookAdapter`] - Signature check and payload mapping for webhooks
//! - [`Notifier`] - Post-commit user notifications

pub mod notifier;
pub mod payment_gateway;
pub mod webhook;

pub use notifier::{CreditNotice, NotificationError, Notifier};
pub use payment_gateway::{
    CancelOutcome, CheckoutRequest, GatewayError, PaymentGateway, ProviderSubscription,
};
pub use webhook::{WebhookAdapter, WebhookError, WebhookEvent};

#[cfg(test)]
pub use notifier::MockNotifier;
#[cfg(test)]
pub use payment_gateway::MockPaymentGateway;
#[cfg(test)]
pub use webhook::MockWebhookAdapter;
