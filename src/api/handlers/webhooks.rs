//! Handler for payment provider webhooks.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
};

use crate::api::dto::subscription::WebhookAck;
use crate::error::AppError;
use crate::state::AppState;

/// Receives a subscription lifecycle webhook.
///
/// # Endpoint
///
/// `POST /api/webhooks/{provider}` where `provider` is `razorpay` or `paddle`.
///
/// The body is kept as raw bytes: the signature covers the exact payload the
/// provider sent.
///
/// # Response Codes
///
/// - `200 OK` `{"received": true}` for every authenticated delivery, including
///   unknown events and updates that could not be applied
/// - `400` for a missing or wrong signature, or malformed JSON
/// - `404` for an unknown or unconfigured provider
pub async fn webhook_handler(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, AppError> {
    let adapter = state.webhook_service.adapter(&provider)?;

    let signature = headers
        .get(adapter.signature_header())
        .and_then(|v| v.to_str().ok());

    state
        .webhook_service
        .ingest(adapter.as_ref(), signature, &body)
        .await?;

    Ok(Json(WebhookAck { received: true }))
}
