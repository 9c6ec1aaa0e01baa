//! HTTP request/response tracing middleware.

use axum::extract::MatchedPath;
use axum::http::Request;
use tower_http::LatencyUnit;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::trace::{DefaultOnResponse, MakeSpan, TraceLayer};
use tracing::{Level, Span};

/// Span factory that records the route template instead of the raw URI.
///
/// Several routes carry the user's e-mail in the path
/// (`/api/user/{email}/links`); logging the template keeps addresses out of
/// the request logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteSpan;

impl<B> MakeSpan<B> for RouteSpan {
    fn make_span(&mut self, req: &Request<B>) -> Span {
        let route = req
            .extensions()
            .get::<MatchedPath>()
            .map(MatchedPath::as_str)
            .unwrap_or("<unmatched>");

        tracing::info_span!(
            "request",
            method = %req.method(),
            route,
            version = ?req.version(),
        )
    }
}

/// Creates a tracing middleware for HTTP requests.
///
/// **On Request:** opens an `INFO` span with method, route template and HTTP version.
///
/// **On Response:** logs status code and latency in milliseconds at `INFO`.
///
/// # Example Logs
///
/// ```text
/// INFO request{method=POST route=/api/urls version=HTTP/1.1}: finished processing request latency=12 ms status=201
/// INFO request{method=GET route=/api/user/{email}/links version=HTTP/1.1}: finished processing request latency=4 ms status=200
/// ```
pub fn layer() -> TraceLayer<SharedClassifier<ServerErrorsAsFailures>, RouteSpan> {
    TraceLayer::new_for_http()
        .make_span_with(RouteSpan)
        .on_response(
            DefaultOnResponse::new()
                .level(Level::INFO)
                .latency_unit(LatencyUnit::Millis),
        )
}
