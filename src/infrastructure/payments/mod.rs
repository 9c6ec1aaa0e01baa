//! Payment provider clients and webhook adapters.
//!
//! - [`razorpay`] - Razorpay subscriptions API and `X-Razorpay-Signature` webhooks
//! - [`paddle`] - Paddle Billing API and `Paddle-Signature` webhooks

pub mod paddle;
pub mod razorpay;

pub use paddle::{PaddleClient, PaddleConfig, PaddleWebhook};
pub use razorpay::{RazorpayClient, RazorpayConfig, RazorpayWebhook};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::gateways::GatewayError;

impl From<reqwest::Error> for GatewayError {
    fn from(err: reqwest::Error) -> Self {
        GatewayError::Transport(err.to_string())
    }
}

/// Reads a provider response, mapping non-2xx statuses to
/// [`GatewayError::Api`] and unreadable 2xx bodies to [`GatewayError::Decode`].
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, GatewayError> {
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
        return Err(GatewayError::Api {
            status: status.as_u16(),
            message: api_error_message(&body)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown").into()),
        });
    }

    serde_json::from_slice(&body).map_err(|e| GatewayError::Decode(e.to_string()))
}

/// Pulls a human-readable message out of either provider's error envelope.
fn api_error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let error = value.get("error")?;

    ["description", "detail", "message"]
        .iter()
        .find_map(|key| error.get(key).and_then(Value::as_str))
        .map(str::to_string)
}
