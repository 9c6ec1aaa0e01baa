//! Repository trait definitions for the domain layer.
//!
//! These traits abstract data access. PostgreSQL implementations live in
//! `crate::infrastructure::persistence`; mock implementations are generated
//! via `mockall` for unit tests, and `tests/common` provides in-memory fakes
//! for the HTTP tests.
//!
//! # Available Repositories
//!
//! - [`UserRepository`] - Users, credit balances and plan state
//! - [`LinkRepository`] - Monitored links
//! - [`PingRepository`] - Recorded pings (read-only)
//! - [`SubscriptionRepository`] - Subscription history

pub mod link_repository;
pub mod ping_repository;
pub mod subscription_repository;
pub mod user_repository;

pub use link_repository::LinkRepository;
pub use ping_repository::PingRepository;
pub use subscription_repository::SubscriptionRepository;
pub use user_repository::{CreditTopUp, UserRepository};

#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use ping_repository::MockPingRepository;
#[cfg(test)]
pub use subscription_repository::MockSubscriptionRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
