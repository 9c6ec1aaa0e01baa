//! Domain layer containing business entities and rules.
//!
//! # Architecture
//!
//! - [`entities`] - Core business data structures and the subscription state machine
//! - [`ledger`] - Credit top-up rules
//! - [`repositories`] - Data access trait definitions
//! - [`gateways`] - Payment provider, webhook and notification interfaces
//!
//! The domain layer has no dependencies on infrastructure or presentation
//! layers. Services in [`crate::application::services`] hold the traits as
//! `Arc<dyn Trait>` so tests can substitute mocks and in-memory fakes.

pub mod entities;
pub mod gateways;
pub mod ledger;
pub mod repositories;
