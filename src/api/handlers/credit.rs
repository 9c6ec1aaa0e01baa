//! Handlers for credit balance endpoints.

use axum::{
    Json,
    extract::{Path, State},
};
use validator::Validate;

use crate::api::dto::credit::{AddCreditRequest, CreditAddedResponse, CreditResponse};
use crate::api::dto::response::ApiResponse;
use crate::api::extract::ApiJson;
use crate::error::AppError;
use crate::state::AppState;

/// Returns the current credit balance.
///
/// # Endpoint
///
/// `GET /api/credit/{email}`
///
/// # Errors
///
/// - `400` for a malformed e-mail
/// - `404` if no user has this e-mail
pub async fn get_credit_handler(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<ApiResponse<CreditResponse>>, AppError> {
    let user = state.credit_service.get_credit(&email).await?;

    Ok(ApiResponse::ok(
        "Credit retrieved successfully",
        CreditResponse::from(user),
    ))
}

/// Adds the configured increment to the balance and e-mails the user.
///
/// # Endpoint
///
/// `POST /api/credit/add`
///
/// # Request Body
///
/// ```json
/// { "email": "user@example.com" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "message": "Credit added successfully",
///   "data": {
///     "email": "user@example.com",
///     "previous_credit": 20000,
///     "added_credit": 2000,
///     "new_credit": 22000,
///     "created_at": "2026-01-01T00:00:00Z",
///     "email_sent": true,
///     "remaining_capacity": 3000
///   }
/// }
/// ```
///
/// # Errors
///
/// - `400 credit_limit_exceeded` if the ceiling would be crossed
/// - `404` for an unknown user
/// - `409` if a concurrent top-up won the race
/// - `429` while the cooldown is running
pub async fn add_credit_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AddCreditRequest>,
) -> Result<Json<ApiResponse<CreditAddedResponse>>, AppError> {
    payload.validate()?;

    let added = state.credit_service.add_credit(&payload.email).await?;

    Ok(ApiResponse::ok(
        "Credit added successfully",
        CreditAddedResponse::from(added),
    ))
}
