//! Inbound webhook adapters.
//!
//! Each provider gets a thin adapter that checks the signature over the raw
//! body and maps its payload onto a [`WebhookEvent`]. Everything after that
//! is provider-agnostic.

use thiserror::Error;

use crate::domain::entities::{PaymentProvider, SubscriptionEvent, SubscriptionEventKind};

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookEvent {
    /// A lifecycle change for a known subscription id.
    Transition(SubscriptionEvent),
    /// The provider announced the real id for a pending checkout reference.
    /// `then` is the status the new subscription already carries.
    Linked {
        checkout_reference: String,
        subscription_id: String,
        then: Option<SubscriptionEventKind>,
    },
    /// Recognised envelope, event type not handled.
    Ignored { event_type: String },
}

#[derive(Debug, Error, PartialEq)]
pub enum WebhookError {
    #[error("malformed webhook payload: {0}")]
    Malformed(String),
}

#[cfg_attr(test, mockall::automock)]
pub trait WebhookAdapter: Send + Sync {
    fn provider(&self) -> PaymentProvider;

    /// Name of the request header carrying the signature.
    fn signature_header(&self) -> &'static str;

    /// Verifies `signature` against the raw request body.
    fn verify(&self, body: &[u8], signature: &str) -> bool;

    /// Parses a verified body.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::Malformed`] if the body is not the provider's
    /// JSON envelope.
    fn parse(&self, body: &[u8]) -> Result<WebhookEvent, WebhookError>;
}
