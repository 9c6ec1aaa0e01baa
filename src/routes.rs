//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /api/health`           - Health check (public)
//! - `/api/*` read endpoints      - Per-IP rate limited
//! - `/api/*` mutating endpoints  - Stricter per-IP rate limit
//! - `POST /api/webhooks/{provider}` - Signature-authenticated, not rate limited
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **CORS** - Origin prefix allow-list for the browser frontend
//! - **Rate limiting** - Per-IP token bucket (configurable for proxy deployments)
//! - **Path normalization** - Trailing slash handling

use crate::api::middleware::{cors, rate_limit, tracing};
use crate::api::routes::{public_routes, secure_routes, webhook_routes};
use crate::state::AppState;
use axum::Router;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Options that shape the middleware stack.
#[derive(Debug, Clone, Default)]
pub struct RouterOptions {
    /// When `true`, rate limiting reads the client IP from `X-Forwarded-For` /
    /// `X-Real-IP` headers instead of the peer socket address; enable only
    /// behind a trusted reverse proxy.
    pub behind_proxy: bool,
    /// Allowed `Origin` prefix; `None` allows any origin.
    pub cors_allowed_origin: Option<String>,
}

/// Constructs the application router with all routes and middleware.
///
/// The service must be served with
/// `into_make_service_with_connect_info::<SocketAddr>` so the rate limiter
/// can read the peer address.
pub fn app_router(state: AppState, options: RouterOptions) -> NormalizePath<Router> {
    let api_router = Router::new()
        .merge(public_routes().layer(rate_limit::layer(options.behind_proxy)))
        .merge(secure_routes().layer(rate_limit::secure_layer(options.behind_proxy)))
        .merge(webhook_routes());

    let router = Router::new()
        .nest("/api", api_router)
        .with_state(state)
        .layer(cors::layer(options.cors_allowed_origin))
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
