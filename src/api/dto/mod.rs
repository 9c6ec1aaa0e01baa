//! Data Transfer Objects for API requests and responses.
//!
//! All DTOs use Serde for JSON serialization/deserialization and validator
//! for input validation. Successful responses share the
//! [`response::ApiResponse`] envelope.

pub mod credit;
pub mod health;
pub mod link;
pub mod response;
pub mod subscription;
pub mod user;
