//! Cross-origin policy for the browser frontend.

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Creates the CORS layer.
///
/// With `allowed_origin` set, an `Origin` is accepted when it starts with
/// that prefix (so preview deployments under the same host match). Without
/// it every origin is allowed. Requests without an `Origin` header are not
/// affected by CORS at all.
///
/// # Example
///
/// ```rust,ignore
/// let app = Router::new()
///     .nest("/api", api_routes())
///     .layer(cors::layer(Some("https://app.example.com".into())));
/// ```
pub fn layer(allowed_origin: Option<String>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    match allowed_origin {
        Some(prefix) => cors.allow_origin(AllowOrigin::predicate(
            move |origin: &HeaderValue, _| origin_matches(origin, &prefix),
        )),
        None => cors.allow_origin(Any),
    }
}

fn origin_matches(origin: &HeaderValue, prefix: &str) -> bool {
    origin.as_bytes().starts_with(prefix.as_bytes())
}
