//! Request extractors that fail with the JSON error envelope.

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// `Json<T>` whose rejection is an [`AppError`].
///
/// Malformed JSON, a wrong field type or a missing `Content-Type` become
/// `400 invalid_input` instead of axum's plain-text rejection.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// Parses an optional JSON body.
///
/// An empty or whitespace-only body yields `T::default()`, whatever the
/// `Content-Type` says.
pub fn optional_json<T>(body: &[u8]) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(body).map_err(|e| {
        AppError::bad_request(
            format!("Failed to parse the request body as JSON: {e}"),
            serde_json::Value::Null,
        )
    })
}
