//! Helper functions used across the application.
//!
//! - [`validation`] - E-mail and URL validation
//! - [`signature`] - HMAC-SHA256 signing and constant-time verification
//! - [`format`] - Number formatting for e-mail content

pub mod format;
pub mod signature;
pub mod validation;
