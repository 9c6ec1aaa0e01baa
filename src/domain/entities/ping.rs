//! Ping records produced by the external pinger.

use chrono::{DateTime, Utc};

/// A single recorded ping of a link. Read-only from this service.
#[derive(Debug, Clone, PartialEq)]
pub struct Ping {
    pub link_id: i64,
    /// Response time in milliseconds.
    pub response_time: i32,
    pub created_at: DateTime<Utc>,
}
