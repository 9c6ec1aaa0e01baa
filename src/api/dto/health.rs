//! DTOs for health check endpoint.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Overall health status response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `"OK"` or `"degraded"`.
    pub status: String,

    pub message: String,

    pub timestamp: DateTime<Utc>,

    /// Application version from Cargo.toml.
    pub version: String,

    pub checks: HealthChecks,
}

#[derive(Debug, Serialize)]
pub struct HealthChecks {
    pub database: CheckStatus,
}

/// Individual component health status.
#[derive(Debug, Serialize)]
pub struct CheckStatus {
    /// `"ok"` or `"error"`.
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
