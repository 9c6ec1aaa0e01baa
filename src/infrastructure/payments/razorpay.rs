//! Razorpay subscriptions API client and webhook adapter.

use async_trait::async_trait;
use chrono::DateTime;
use serde::Deserialize;
use serde_json::{Value, json};

use super::read_json;
use crate::domain::entities::{PaymentProvider, SubscriptionEvent, SubscriptionEventKind};
use crate::domain::gateways::{
    CancelOutcome, CheckoutRequest, GatewayError, PaymentGateway, ProviderSubscription,
    WebhookAdapter, WebhookError, WebhookEvent,
};
use crate::utils::signature::verify_hex;

pub const DEFAULT_API_URL: &str = "https://api.razorpay.com";

#[derive(Debug, Clone)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: String,
    pub plan_id: String,
    /// Number of billing cycles the subscription runs for.
    pub total_count: u32,
    pub api_url: String,
}

/// Razorpay REST client authenticated with the key id and secret.
#[derive(Debug)]
pub struct RazorpayClient {
    http: reqwest::Client,
    config: RazorpayConfig,
}

#[derive(Debug, Deserialize)]
struct RazorpaySubscription {
    id: String,
    status: String,
    #[serde(default)]
    short_url: Option<String>,
    #[serde(default)]
    current_end: Option<i64>,
    #[serde(default)]
    end_at: Option<i64>,
}

impl RazorpayClient {
    pub fn new(config: RazorpayConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1{}", self.config.api_url.trim_end_matches('/'), path)
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Razorpay
    }

    async fn create_subscription(
        &self,
        request: CheckoutRequest,
    ) -> Result<ProviderSubscription, GatewayError> {
        let response = self
            .http
            .post(self.url("/subscriptions"))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&json!({
                "plan_id": self.config.plan_id,
                "total_count": self.config.total_count,
                "customer_notify": 1,
                "quantity": 1,
                "notes": {
                    "email": request.email,
                    "user_id": request.user_id.to_string(),
                    "plan": request.plan,
                }
            }))
            .send()
            .await?;

        let subscription: RazorpaySubscription = read_json(response).await?;

        Ok(ProviderSubscription {
            id: subscription.id,
            status: subscription.status,
            checkout_url: subscription.short_url,
        })
    }

    async fn cancel_at_cycle_end(
        &self,
        subscription_id: &str,
    ) -> Result<CancelOutcome, GatewayError> {
        let response = self
            .http
            .post(self.url(&format!("/subscriptions/{subscription_id}/cancel")))
            .basic_auth(&self.config.key_id, Some(&self.config.key_secret))
            .json(&json!({ "cancel_at_cycle_end": 1 }))
            .send()
            .await?;

        let subscription: RazorpaySubscription = read_json(response).await?;

        if subscription.status == "cancelled" {
            return Ok(CancelOutcome::Immediate);
        }

        let effective_at = subscription
            .end_at
            .or(subscription.current_end)
            .and_then(|ts| DateTime::from_timestamp(ts, 0))
            .map(|dt| dt.to_rfc3339());

        Ok(CancelOutcome::Scheduled { effective_at })
    }

    /// Checkout callback signature: HMAC-SHA256 of `"{subscription_id}|{payment_id}"`
    /// keyed with the API key secret.
    fn verify_payment_signature(
        &self,
        subscription_id: &str,
        payment_id: &str,
        signature: &str,
    ) -> Result<bool, GatewayError> {
        let message = format!("{subscription_id}|{payment_id}");
        Ok(verify_hex(
            self.config.key_secret.as_bytes(),
            message.as_bytes(),
            signature,
        ))
    }
}

/// Verifies and parses Razorpay webhook deliveries.
#[derive(Debug, Clone)]
pub struct RazorpayWebhook {
    secret: String,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    event: String,
    #[serde(default)]
    payload: Value,
}

impl RazorpayWebhook {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    fn event_kind(event: &str) -> Option<SubscriptionEventKind> {
        match event {
            "subscription.activated" => Some(SubscriptionEventKind::Activated),
            "subscription.resumed" => Some(SubscriptionEventKind::Resumed),
            "subscription.cancelled" => Some(SubscriptionEventKind::Cancelled),
            "subscription.paused" => Some(SubscriptionEventKind::Paused),
            "subscription.halted" => Some(SubscriptionEventKind::PastDue),
            "subscription.completed" => Some(SubscriptionEventKind::Completed),
            _ => None,
        }
    }
}

impl WebhookAdapter for RazorpayWebhook {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Razorpay
    }

    fn signature_header(&self) -> &'static str {
        "x-razorpay-signature"
    }

    fn verify(&self, body: &[u8], signature: &str) -> bool {
        verify_hex(self.secret.as_bytes(), body, signature)
    }

    fn parse(&self, body: &[u8]) -> Result<WebhookEvent, WebhookError> {
        let envelope: Envelope =
            serde_json::from_slice(body).map_err(|e| WebhookError::Malformed(e.to_string()))?;

        let Some(kind) = Self::event_kind(&envelope.event) else {
            return Ok(WebhookEvent::Ignored {
                event_type: envelope.event,
            });
        };

        let subscription_id = envelope
            .payload
            .pointer("/subscription/entity/id")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                WebhookError::Malformed(format!("{} without subscription id", envelope.event))
            })?;

        Ok(WebhookEvent::Transition(SubscriptionEvent {
            subscription_id: subscription_id.to_string(),
            kind,
        }))
    }
}
