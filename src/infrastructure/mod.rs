//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer.
//!
//! # Modules
//!
//! - [`persistence`] - PostgreSQL repository implementations
//! - [`payments`] - Razorpay and Paddle clients and webhook adapters
//! - [`mail`] - Credit notification e-mail

pub mod mail;
pub mod payments;
pub mod persistence;
