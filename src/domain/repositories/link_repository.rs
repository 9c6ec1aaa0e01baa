//! Repository trait for monitored links.

use crate::domain::entities::{Link, LinkWithOwner, NewLink};
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for monitored links.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Lists a user's links, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Link>, AppError>;

    /// Inserts a link with `ping_count = 0` and no last ping.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the user already monitors this URL.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_link: NewLink) -> Result<Link, AppError>;

    /// Loads a link together with its owner's e-mail.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_with_owner(&self, id: i64) -> Result<Option<LinkWithOwner>, AppError>;

    /// Deletes a link and returns the removed row.
    ///
    /// `Ok(None)` if no link had this id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn delete(&self, id: i64) -> Result<Option<Link>, AppError>;

    /// Counts all links.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count(&self) -> Result<i64, AppError>;
}
