//! Read-only access to recorded pings.

use crate::domain::entities::Ping;
use crate::error::AppError;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PingRepository: Send + Sync {
    /// Returns up to `limit` most recent pings for each of `link_ids`,
    /// newest first within each link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn latest_for_links(&self, link_ids: &[i64], limit: i64)
    -> Result<Vec<Ping>, AppError>;
}
