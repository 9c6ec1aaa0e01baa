//! Handlers for registration and plan lookup.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use validator::Validate;

use crate::api::dto::response::ApiResponse;
use crate::api::dto::user::{AuthRequest, AuthResponse, PlanResponse};
use crate::api::extract::ApiJson;
use crate::error::AppError;
use crate::state::AppState;

/// Signs a user in by e-mail, registering it on first use.
///
/// # Endpoint
///
/// `POST /api/users/auth`
///
/// # Response Codes
///
/// - `201 Created`: a new account was registered
/// - `200 OK`: the account already existed
/// - `403 registration_closed`: the user cap is reached
pub async fn auth_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AuthRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AuthResponse>>), AppError> {
    payload.validate()?;

    let registration = state.user_service.authenticate(&payload.email).await?;

    let (status, message) = if registration.is_new_user {
        (StatusCode::CREATED, "User account created successfully")
    } else {
        (StatusCode::OK, "User authenticated successfully")
    };

    Ok((
        status,
        ApiResponse::ok(message, AuthResponse::from(registration)),
    ))
}

/// Returns the user's plan and subscription state.
///
/// # Endpoint
///
/// `GET /api/user/{email}/plan`
pub async fn plan_handler(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<ApiResponse<PlanResponse>>, AppError> {
    let user = state.user_service.get_user(&email).await?;

    Ok(ApiResponse::ok(
        "Plan retrieved successfully",
        PlanResponse::from(user),
    ))
}
