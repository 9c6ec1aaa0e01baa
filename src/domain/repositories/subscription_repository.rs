//! Repository trait for the subscription history table.
//!
//! The authoritative plan and status live on the user row. Writes here are
//! best effort and callers log failures instead of surfacing them.

use crate::domain::entities::{NewSubscription, SubscriptionRecord, SubscriptionStatus};
use crate::error::AppError;
use async_trait::async_trait;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Records a subscription created through the API with status `created`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if `external_id` is already recorded.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_subscription: NewSubscription)
    -> Result<SubscriptionRecord, AppError>;

    /// Updates the status of the row with the given external id.
    ///
    /// Returns the number of rows updated.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn update_status(
        &self,
        external_id: &str,
        status: SubscriptionStatus,
    ) -> Result<u64, AppError>;

    /// Replaces a pending checkout reference with the real subscription id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn rebind(&self, pending_reference: &str, external_id: &str) -> Result<u64, AppError>;

    /// Most recent history row for a user.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_latest_for_user(
        &self,
        user_id: i64,
    ) -> Result<Option<SubscriptionRecord>, AppError>;
}
