//! Handlers for monitored link endpoints (register, list, delete, response times).

use std::collections::BTreeMap;

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde_json::json;
use validator::Validate;

use crate::api::dto::link::{
    AddUrlRequest, DeleteLinkRequest, DeleteLinkResponse, ResponseTimeDto, ResponseTimesQuery,
};
use crate::api::dto::response::ApiResponse;
use crate::api::dto::user::UserLinksResponse;
use crate::api::extract::{ApiJson, optional_json};
use crate::application::services::AddLinkOutcome;
use crate::error::AppError;
use crate::state::AppState;

/// Registers a URL for monitoring, creating the user on first use.
///
/// # Endpoint
///
/// `POST /api/urls`
///
/// # Request Body
///
/// ```json
/// { "email": "user@example.com", "link": "https://my-app.onrender.com" }
/// ```
///
/// # Response
///
/// `201 Created` with the user and all of their links.
///
/// # Errors
///
/// - `400 invalid_input` for a malformed e-mail or URL
/// - `400 quota_exceeded` when a free user already monitors the maximum
/// - `409 conflict` if the URL is already monitored; `data` carries the
///   current snapshot so the client can resync
pub async fn add_url_handler(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AddUrlRequest>,
) -> Result<(StatusCode, Json<ApiResponse<UserLinksResponse>>), AppError> {
    payload.validate()?;

    match state
        .link_service
        .add_link(&payload.email, &payload.link)
        .await?
    {
        AddLinkOutcome::Created {
            snapshot,
            user_created,
            ..
        } => {
            let message = if user_created {
                "User created and link added successfully"
            } else {
                "Link added successfully to existing user"
            };

            Ok((
                StatusCode::CREATED,
                ApiResponse::ok(message, UserLinksResponse::from(snapshot)),
            ))
        }
        AddLinkOutcome::AlreadyMonitored { snapshot } => {
            let data = serde_json::to_value(UserLinksResponse::from(snapshot)).map_err(|e| {
                AppError::internal(
                    "Failed to serialize response",
                    json!({ "cause": e.to_string() }),
                )
            })?;

            Err(AppError::conflict(
                "This link is already being monitored for this user",
                data,
            ))
        }
    }
}

/// Lists the user's links with ping totals.
///
/// # Endpoint
///
/// `GET /api/user/{email}/links`
pub async fn user_links_handler(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<ApiResponse<UserLinksResponse>>, AppError> {
    let snapshot = state.link_service.user_links(&email).await?;

    Ok(ApiResponse::ok(
        "User links retrieved successfully",
        UserLinksResponse::from(snapshot),
    ))
}

/// Deletes a monitored link.
///
/// # Endpoint
///
/// `DELETE /api/links/{id}`
///
/// # Request Body
///
/// Optional, and may be empty even with a JSON `Content-Type`. When a
/// non-empty e-mail is given, the link must belong to it:
///
/// ```json
/// { "email": "user@example.com" }
/// ```
///
/// # Errors
///
/// - `400` for a non-numeric id or malformed e-mail
/// - `403` if the link belongs to another user
/// - `404` if the link does not exist
pub async fn delete_link_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<ApiResponse<DeleteLinkResponse>>, AppError> {
    let payload: DeleteLinkRequest = optional_json(&body)?;
    let email = payload.email.as_deref().filter(|e| !e.trim().is_empty());

    let link = state.link_service.delete_link(&id, email).await?;

    Ok(ApiResponse::ok(
        "Link deleted successfully",
        DeleteLinkResponse::from(link),
    ))
}

/// Latest response times per monitored URL.
///
/// # Endpoint
///
/// `GET /api/user/{email}/response-times?limit=N`
///
/// `limit` defaults to 5 and is clamped to `1..=100`.
///
/// # Response
///
/// ```json
/// {
///   "success": true,
///   "message": "Response times retrieved successfully",
///   "data": {
///     "https://my-app.onrender.com": [
///       { "response_time": 231, "timestamp": "2026-01-01T00:00:00Z" }
///     ]
///   }
/// }
/// ```
pub async fn response_times_handler(
    State(state): State<AppState>,
    Path(email): Path<String>,
    Query(query): Query<ResponseTimesQuery>,
) -> Result<Json<ApiResponse<BTreeMap<String, Vec<ResponseTimeDto>>>>, AppError> {
    let per_link = state
        .link_service
        .response_times(&email, query.limit)
        .await?;

    let data = per_link
        .into_iter()
        .map(|(link, pings)| {
            (
                link.url,
                pings.into_iter().map(ResponseTimeDto::from).collect(),
            )
        })
        .collect();

    Ok(ApiResponse::ok("Response times retrieved successfully", data))
}
