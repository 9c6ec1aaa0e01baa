//! User entity: identity, credit balance and subscription state.

use chrono::{DateTime, Utc};

use super::link::Link;
use super::subscription::{Plan, SubscriptionStatus};

/// A registered user.
///
/// `email` is the identity; `subscription_id` is the payment provider's
/// reference and is the only key webhooks can address a user by.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub credit: i64,
    pub plan: Plan,
    pub subscription_status: SubscriptionStatus,
    pub subscription_id: Option<String>,
    pub last_credit_topup_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Returns true when the plan lifts the link quota.
    pub fn is_paid(&self) -> bool {
        self.plan == Plan::Paid
    }
}

/// Input data for creating a new user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub credit: i64,
}

/// A user together with all of their monitored links.
///
/// This is the snapshot returned to clients after link mutations so they can
/// reconcile local state.
#[derive(Debug, Clone)]
pub struct UserWithLinks {
    pub user: User,
    pub links: Vec<Link>,
}

impl UserWithLinks {
    /// Sum of `ping_count` across every link.
    pub fn total_pings(&self) -> i64 {
        self.links.iter().map(|l| l.ping_count).sum()
    }
}
