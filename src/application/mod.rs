//! Application layer services implementing business logic.
//!
//! Services orchestrate repository calls, validation and domain rules, and
//! give HTTP handlers a small typed API.
//!
//! # Available Services
//!
//! - [`services::credit_service::CreditService`] - Credit balance and top-ups
//! - [`services::link_service::LinkService`] - Link quota, listing and deletion
//! - [`services::user_service::UserService`] - Registration and plan lookup
//! - [`services::subscription_service::SubscriptionService`] - Checkout, payment verification, cancellation
//! - [`services::webhook_service::WebhookService`] - Payment webhook ingestion

pub mod services;
