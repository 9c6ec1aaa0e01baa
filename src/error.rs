//! Application error type and its HTTP mapping.
//!
//! Every handler returns `Result<_, AppError>`. The [`IntoResponse`] impl turns
//! each variant into the JSON failure envelope:
//!
//! ```json
//! { "success": false, "error": "quota_exceeded", "message": "...", "data": { ... } }
//! ```
//!
//! `data` is omitted when the variant carries no diagnostic payload.
//! Internal failures never leak their cause; it is written to the log instead.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

/// JSON body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub data: Value,
}

#[derive(Debug, Error)]
pub enum AppError {
    /// Malformed or missing input (email, URL, ids, required fields).
    #[error("{message}")]
    Validation { message: String, details: Value },

    /// Webhook signature missing or not matching the raw body.
    #[error("{message}")]
    InvalidSignature { message: String },

    #[error("{message}")]
    NotFound { message: String, details: Value },

    #[error("{message}")]
    Conflict { message: String, details: Value },

    /// Link count for the user's plan is exhausted.
    #[error("{message}")]
    QuotaExceeded { message: String, details: Value },

    /// Credit top-up would exceed the balance ceiling.
    #[error("{message}")]
    LimitExceeded { message: String, details: Value },

    /// Credit top-up requested before the cooldown elapsed.
    #[error("{message}")]
    RateLimited { message: String, details: Value },

    #[error("{message}")]
    Forbidden { message: String, details: Value },

    #[error("{message}")]
    RegistrationClosed { message: String, details: Value },

    /// Subscription is in a state that blocks the requested operation.
    #[error("{message}")]
    SubscriptionState {
        code: &'static str,
        message: String,
        details: Value,
    },

    /// A required external collaborator is not configured.
    #[error("{message}")]
    Unavailable { message: String },

    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn invalid_signature(message: impl Into<String>) -> Self {
        Self::InvalidSignature {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn conflict(message: impl Into<String>, details: Value) -> Self {
        Self::Conflict {
            message: message.into(),
            details,
        }
    }

    pub fn quota_exceeded(message: impl Into<String>, details: Value) -> Self {
        Self::QuotaExceeded {
            message: message.into(),
            details,
        }
    }

    pub fn limit_exceeded(message: impl Into<String>, details: Value) -> Self {
        Self::LimitExceeded {
            message: message.into(),
            details,
        }
    }

    pub fn rate_limited(message: impl Into<String>, details: Value) -> Self {
        Self::RateLimited {
            message: message.into(),
            details,
        }
    }

    pub fn forbidden(message: impl Into<String>, details: Value) -> Self {
        Self::Forbidden {
            message: message.into(),
            details,
        }
    }

    pub fn registration_closed(message: impl Into<String>, details: Value) -> Self {
        Self::RegistrationClosed {
            message: message.into(),
            details,
        }
    }

    pub fn subscription_state(
        code: &'static str,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self::SubscriptionState {
            code,
            message: message.into(),
            details,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. }
            | AppError::InvalidSignature { .. }
            | AppError::QuotaExceeded { .. }
            | AppError::LimitExceeded { .. }
            | AppError::SubscriptionState { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::Forbidden { .. } | AppError::RegistrationClosed { .. } => {
                StatusCode::FORBIDDEN
            }
            AppError::Unavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short machine-readable code placed in the `error` field.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "invalid_input",
            AppError::InvalidSignature { .. } => "invalid_signature",
            AppError::NotFound { .. } => "not_found",
            AppError::Conflict { .. } => "conflict",
            AppError::QuotaExceeded { .. } => "quota_exceeded",
            AppError::LimitExceeded { .. } => "credit_limit_exceeded",
            AppError::RateLimited { .. } => "rate_limited",
            AppError::Forbidden { .. } => "forbidden",
            AppError::RegistrationClosed { .. } => "registration_closed",
            AppError::SubscriptionState { code, .. } => *code,
            AppError::Unavailable { .. } => "service_unavailable",
            AppError::Internal { .. } => "internal_error",
        }
    }

    /// Converts the error into the serialized failure body.
    pub fn to_error_body(&self) -> ErrorBody {
        let (message, data) = match self {
            AppError::Validation { message, details }
            | AppError::NotFound { message, details }
            | AppError::Conflict { message, details }
            | AppError::QuotaExceeded { message, details }
            | AppError::LimitExceeded { message, details }
            | AppError::RateLimited { message, details }
            | AppError::Forbidden { message, details }
            | AppError::RegistrationClosed { message, details }
            | AppError::SubscriptionState {
                message, details, ..
            } => (message.clone(), details.clone()),
            AppError::InvalidSignature { message } | AppError::Unavailable { message } => {
                (message.clone(), Value::Null)
            }
            // Internal details stay in the logs.
            AppError::Internal { message, .. } => (message.clone(), Value::Null),
        };

        ErrorBody {
            success: false,
            error: self.code(),
            message,
            data: normalize_details(data),
        }
    }
}

/// Empty objects are dropped from the response like `null`.
fn normalize_details(details: Value) -> Value {
    match details {
        Value::Object(map) if map.is_empty() => Value::Null,
        other => other,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if let AppError::Internal { message, details } = &self {
            tracing::error!(%message, details = %details, "Request failed");
        }

        (self.status_code(), Json(self.to_error_body())).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        map_sqlx_error(e)
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(e: validator::ValidationErrors) -> Self {
        let fields: Vec<String> = e.field_errors().keys().map(|k| k.to_string()).collect();
        let message = e
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .find_map(|err| err.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| "Invalid request".to_string());

        AppError::bad_request(message, json!({ "fields": fields }))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::bad_request(rejection.body_text(), Value::Null)
    }
}

/// Maps database errors onto the application taxonomy.
///
/// Unique violations become [`AppError::Conflict`] carrying the constraint name;
/// anything else is an opaque internal error.
pub fn map_sqlx_error(e: sqlx::Error) -> AppError {
    if let Some(db) = e.as_database_error()
        && db.is_unique_violation()
    {
        return AppError::conflict(
            "Unique constraint violation",
            json!({ "constraint": db.constraint() }),
        );
    }

    AppError::internal("Database error", json!({ "cause": e.to_string() }))
}
