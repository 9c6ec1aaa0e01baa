//! Paddle Billing API client and webhook adapter.
//!
//! Checkout creates a transaction, not a subscription. The transaction id is
//! stored on the user until `subscription.created` arrives carrying both ids.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use serde_json::json;

use super::read_json;
use crate::domain::entities::{PaymentProvider, SubscriptionEvent, SubscriptionEventKind};
use crate::domain::gateways::{
    CancelOutcome, CheckoutRequest, GatewayError, PaymentGateway, ProviderSubscription,
    WebhookAdapter, WebhookError, WebhookEvent,
};
use crate::utils::signature::verify_hex;

pub const DEFAULT_API_URL: &str = "https://api.paddle.com";

/// Default replay window for `Paddle-Signature` timestamps.
pub const DEFAULT_WEBHOOK_MAX_AGE_SECS: i64 = 300;

#[derive(Debug, Clone)]
pub struct PaddleConfig {
    pub api_key: String,
    pub price_id: String,
    pub api_url: String,
}

#[derive(Debug)]
pub struct PaddleClient {
    http: reqwest::Client,
    config: PaddleConfig,
}

#[derive(Debug, Deserialize)]
struct Data<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct Transaction {
    id: String,
    status: String,
    #[serde(default)]
    checkout: Option<Checkout>,
}

#[derive(Debug, Deserialize)]
struct Checkout {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Subscription {
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    transaction_id: Option<String>,
    #[serde(default)]
    scheduled_change: Option<ScheduledChange>,
}

#[derive(Debug, Deserialize)]
struct ScheduledChange {
    action: String,
    #[serde(default)]
    effective_at: Option<String>,
}

impl PaddleClient {
    pub fn new(config: PaddleConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl PaymentGateway for PaddleClient {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Paddle
    }

    async fn create_subscription(
        &self,
        request: CheckoutRequest,
    ) -> Result<ProviderSubscription, GatewayError> {
        let response = self
            .http
            .post(self.url("/transactions"))
            .bearer_auth(&self.config.api_key)
            .json(&json!({
                "items": [{ "price_id": self.config.price_id, "quantity": 1 }],
                "custom_data": {
                    "email": request.email,
                    "user_id": request.user_id.to_string(),
                    "plan": request.plan,
                }
            }))
            .send()
            .await?;

        let Data { data: transaction } = read_json::<Data<Transaction>>(response).await?;

        Ok(ProviderSubscription {
            id: transaction.id,
            status: transaction.status,
            checkout_url: transaction.checkout.and_then(|c| c.url),
        })
    }

    async fn cancel_at_cycle_end(
        &self,
        subscription_id: &str,
    ) -> Result<CancelOutcome, GatewayError> {
        let response = self
            .http
            .post(self.url(&format!("/subscriptions/{subscription_id}/cancel")))
            .bearer_auth(&self.config.api_key)
            .json(&json!({ "effective_from": "next_billing_period" }))
            .send()
            .await?;

        let Data { data: subscription } = read_json::<Data<Subscription>>(response).await?;

        if subscription.status.as_deref() == Some("canceled") {
            return Ok(CancelOutcome::Immediate);
        }

        match subscription.scheduled_change {
            Some(change) if change.action == "cancel" => Ok(CancelOutcome::Scheduled {
                effective_at: change.effective_at,
            }),
            _ => Err(GatewayError::Decode(format!(
                "no scheduled cancellation on {}",
                subscription.id
            ))),
        }
    }

    fn verify_payment_signature(
        &self,
        _subscription_id: &str,
        _payment_id: &str,
        _signature: &str,
    ) -> Result<bool, GatewayError> {
        Err(GatewayError::Unsupported("paddle"))
    }
}

/// Verifies and parses Paddle notifications.
#[derive(Debug, Clone)]
pub struct PaddleWebhook {
    secret: String,
    max_age: Option<Duration>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    event_type: String,
    #[serde(default)]
    data: Option<serde_json::Value>,
}

/// Parsed `Paddle-Signature` header: `ts=...;h1=...`.
#[derive(Debug, PartialEq)]
struct SignatureHeader<'a> {
    ts: &'a str,
    h1: Vec<&'a str>,
}

fn parse_signature_header(header: &str) -> Option<SignatureHeader<'_>> {
    let mut ts = None;
    let mut h1 = Vec::new();

    for part in header.split(';') {
        match part.trim().split_once('=') {
            Some(("ts", v)) => ts = Some(v),
            Some(("h1", v)) => h1.push(v),
            _ => {}
        }
    }

    let ts = ts.filter(|v| !v.is_empty())?;
    if h1.is_empty() {
        return None;
    }
    Some(SignatureHeader { ts, h1 })
}

/// Maps a Paddle subscription status onto the event it implies.
fn status_kind(status: &str) -> Option<SubscriptionEventKind> {
    match status {
        "active" | "trialing" => Some(SubscriptionEventKind::Activated),
        "canceled" => Some(SubscriptionEventKind::Cancelled),
        "paused" => Some(SubscriptionEventKind::Paused),
        "past_due" => Some(SubscriptionEventKind::PastDue),
        _ => None,
    }
}

impl PaddleWebhook {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            max_age: Some(Duration::seconds(DEFAULT_WEBHOOK_MAX_AGE_SECS)),
        }
    }

    /// Deliveries whose `ts` is further than `max_age` from now are
    /// rejected. `None` accepts any timestamp.
    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    fn verify_at(&self, body: &[u8], signature: &str, now: DateTime<Utc>) -> bool {
        let Some(header) = parse_signature_header(signature) else {
            return false;
        };

        if let Some(max_age) = self.max_age {
            let Some(sent_at) = header
                .ts
                .parse::<i64>()
                .ok()
                .and_then(|ts| DateTime::from_timestamp(ts, 0))
            else {
                return false;
            };
            if now - sent_at > max_age || sent_at - now > max_age {
                tracing::warn!(
                    ts = header.ts,
                    "Paddle signature timestamp outside replay window"
                );
                return false;
            }
        }

        let mut signed = Vec::with_capacity(header.ts.len() + 1 + body.len());
        signed.extend_from_slice(header.ts.as_bytes());
        signed.push(b':');
        signed.extend_from_slice(body);

        // Several h1 values are sent while a secret is being rotated.
        header
            .h1
            .iter()
            .any(|h1| verify_hex(self.secret.as_bytes(), &signed, h1))
    }
}

impl WebhookAdapter for PaddleWebhook {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Paddle
    }

    fn signature_header(&self) -> &'static str {
        "paddle-signature"
    }

    fn verify(&self, body: &[u8], signature: &str) -> bool {
        self.verify_at(body, signature, Utc::now())
    }

    fn parse(&self, body: &[u8]) -> Result<WebhookEvent, WebhookError> {
        let envelope: Envelope =
            serde_json::from_slice(body).map_err(|e| WebhookError::Malformed(e.to_string()))?;

        let kind = match envelope.event_type.as_str() {
            "subscription.created" => None,
            "subscription.activated" => Some(SubscriptionEventKind::Activated),
            "subscription.resumed" => Some(SubscriptionEventKind::Resumed),
            "subscription.canceled" => Some(SubscriptionEventKind::Cancelled),
            "subscription.paused" => Some(SubscriptionEventKind::Paused),
            "subscription.past_due" => Some(SubscriptionEventKind::PastDue),
            "subscription.updated" => None,
            _ => {
                return Ok(WebhookEvent::Ignored {
                    event_type: envelope.event_type,
                });
            }
        };

        let data: Subscription = envelope
            .data
            .ok_or_else(|| {
                WebhookError::Malformed(format!("{} without data", envelope.event_type))
            })
            .and_then(|v| {
                serde_json::from_value(v).map_err(|e| WebhookError::Malformed(e.to_string()))
            })?;

        if let Some(kind) = kind {
            return Ok(WebhookEvent::Transition(SubscriptionEvent {
                subscription_id: data.id,
                kind,
            }));
        }

        let status_event = data.status.as_deref().and_then(status_kind);

        if envelope.event_type == "subscription.created" {
            return Ok(match data.transaction_id {
                Some(checkout_reference) => WebhookEvent::Linked {
                    checkout_reference,
                    subscription_id: data.id,
                    then: status_event,
                },
                None => match status_event {
                    Some(kind) => WebhookEvent::Transition(SubscriptionEvent {
                        subscription_id: data.id,
                        kind,
                    }),
                    None => WebhookEvent::Ignored {
                        event_type: envelope.event_type,
                    },
                },
            });
        }

        // subscription.updated
        let kind = match (&data.scheduled_change, data.status.as_deref()) {
            (Some(change), _) if change.action == "cancel" => {
                SubscriptionEventKind::CancellationScheduled
            }
            (None, Some("active")) => SubscriptionEventKind::Reactivated,
            _ => {
                return Ok(WebhookEvent::Ignored {
                    event_type: envelope.event_type,
                });
            }
        };

        Ok(WebhookEvent::Transition(SubscriptionEvent {
            subscription_id: data.id,
            kind,
        }))
    }
}
