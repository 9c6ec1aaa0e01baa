//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Health check endpoint for monitoring and load balancers.
///
/// # Endpoint
///
/// `GET /api/health`
///
/// # Checks
///
/// - **Database**: counts registered users
///
/// # Response Codes
///
/// - `200 OK`: the database answered
/// - `503 Service Unavailable`: the database check failed
///
/// # Response Example
///
/// ```json
/// {
///   "status": "OK",
///   "message": "Your API is running",
///   "timestamp": "2026-10-18T09:00:00Z",
///   "version": "0.1.0",
///   "checks": {
///     "database": { "status": "ok", "message": "Connected, 42 users" }
///   }
/// }
/// ```
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let db_check = check_database(&state).await;
    let healthy = db_check.status == "ok";

    let response = HealthResponse {
        status: if healthy { "OK" } else { "degraded" }.to_string(),
        message: if healthy {
            "Your API is running"
        } else {
            "Your API is running with failing dependencies"
        }
        .to_string(),
        timestamp: Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks { database: db_check },
    };

    if healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    match state.user_service.user_count().await {
        Ok(count) => CheckStatus {
            status: "ok".to_string(),
            message: Some(format!("Connected, {count} users")),
        },
        Err(e) => CheckStatus {
            status: "error".to_string(),
            message: Some(format!("Database error: {e}")),
        },
    }
}
