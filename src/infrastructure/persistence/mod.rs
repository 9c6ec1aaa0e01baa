//! PostgreSQL repository implementations.
//!
//! Concrete implementations of the domain repository traits using SQLx
//! runtime queries mapped through `FromRow` row structs.
//!
//! # Repositories
//!
//! - [`PgUserRepository`] - Users, credit and plan state
//! - [`PgLinkRepository`] - Monitored links
//! - [`PgPingRepository`] - Recorded pings
//! - [`PgSubscriptionRepository`] - Subscription history

pub mod pg_link_repository;
pub mod pg_ping_repository;
pub mod pg_subscription_repository;
pub mod pg_user_repository;

pub use pg_link_repository::PgLinkRepository;
pub use pg_ping_repository::PgPingRepository;
pub use pg_subscription_repository::PgSubscriptionRepository;
pub use pg_user_repository::PgUserRepository;
