//! Success envelope shared by every JSON endpoint.

use axum::Json;
use serde::Serialize;

/// `{ "success": true, "message": "...", "data": ... }`
///
/// Failures use [`crate::error::ErrorBody`] instead.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data,
        })
    }
}
