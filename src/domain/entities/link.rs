//! Link entity representing a monitored URL.

use chrono::{DateTime, Utc};

/// A URL owned by a user and pinged by the external keep-alive worker.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub id: i64,
    pub user_id: i64,
    pub url: String,
    pub ping_count: i64,
    pub last_ping: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Input data for creating a new link.
///
/// New links always start with `ping_count = 0` and no `last_ping`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLink {
    pub user_id: i64,
    pub url: String,
}

/// A link joined with its owner's email, used for ownership checks.
#[derive(Debug, Clone)]
pub struct LinkWithOwner {
    pub link: Link,
    pub owner_email: String,
}

impl LinkWithOwner {
    /// Returns true if `email` owns this link.
    pub fn is_owned_by(&self, email: &str) -> bool {
        self.owner_email == email
    }
}
