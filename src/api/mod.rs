//! REST API layer for HTTP request/response handling.
//!
//! This layer translates HTTP requests into domain operations and formats
//! responses into the `{ success, message, data }` envelope.
//!
//! # Modules
//!
//! - [`dto`] - Data Transfer Objects for request/response serialization
//! - [`extract`] - Body extractors that reject with the JSON error envelope
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - CORS, rate limiting and tracing middleware
//! - [`routes`] - Route configuration and composition

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod routes;
