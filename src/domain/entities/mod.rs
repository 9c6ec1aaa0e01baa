//! Core domain entities representing the business data model.
//!
//! # Entity Types
//!
//! - [`User`] - Account identity, credit balance and subscription state
//! - [`Link`] - A monitored URL owned by a user
//! - [`Ping`] - A recorded ping of a link (read-only here)
//! - [`SubscriptionRecord`] - Audit row for a provider subscription
//!
//! # Design Pattern
//!
//! Entities follow the "New Type" pattern with separate structs for creation:
//! `NewUser`, `NewLink`, `NewSubscription`.

pub mod link;
pub mod ping;
pub mod subscription;
pub mod user;

pub use link::{Link, LinkWithOwner, NewLink};
pub use ping::Ping;
pub use subscription::{
    NewSubscription, PaymentProvider, Plan, SubscriptionEvent, SubscriptionEventKind,
    SubscriptionRecord, SubscriptionStatus, Transition,
};
pub use user::{NewUser, User, UserWithLinks};
