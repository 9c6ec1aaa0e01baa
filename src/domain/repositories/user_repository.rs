//! Repository trait for user accounts, credit balances and plan state.

use crate::domain::entities::{NewUser, Plan, SubscriptionStatus, Transition, User};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Guarded credit mutation.
///
/// The update only applies when the resulting balance stays within
/// `max_credit` and, if `cooldown_cutoff` is set, the previous top-up is
/// not newer than it.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditTopUp {
    pub email: String,
    pub amount: i64,
    pub max_credit: i64,
    pub cooldown_cutoff: Option<DateTime<Utc>>,
    pub recorded_at: Option<DateTime<Utc>>,
}

/// Repository interface for users.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgUserRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds a user by e-mail.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Creates a user with plan `free` and status `none`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the e-mail is already registered.
    /// Returns [`AppError::Internal`] on database errors.
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;

    /// Counts registered users.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count(&self) -> Result<i64, AppError>;

    /// Lists users ordered by creation time, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, AppError>;

    /// Adds credit in a single guarded statement.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(User))` with the updated row
    /// - `Ok(None)` if the user is gone or a guard no longer holds
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn apply_credit_top_up(&self, top_up: CreditTopUp) -> Result<Option<User>, AppError>;

    /// Applies a subscription transition to the user holding `subscription_id`.
    ///
    /// Users in a terminal status only accept terminal transitions (see
    /// [`Transition::applies_to`]). Returns the number of rows updated, zero
    /// when no user matches or the transition is stale.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn apply_transition(
        &self,
        subscription_id: &str,
        transition: Transition,
    ) -> Result<u64, AppError>;

    /// Stores a provider reference on the user after checkout creation.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Conflict`] if the reference is already bound.
    /// Returns [`AppError::Internal`] on database errors.
    async fn attach_subscription(
        &self,
        user_id: i64,
        subscription_id: &str,
        status: SubscriptionStatus,
    ) -> Result<(), AppError>;

    /// Replaces a pending checkout reference with the real subscription id.
    ///
    /// Returns the number of rows updated.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn rebind_subscription(
        &self,
        pending_reference: &str,
        subscription_id: &str,
    ) -> Result<u64, AppError>;

    /// Sets plan and status for a user addressed by e-mail.
    ///
    /// `plan: None` leaves the plan unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn set_subscription_state(
        &self,
        email: &str,
        plan: Option<Plan>,
        status: SubscriptionStatus,
    ) -> Result<Option<User>, AppError>;

    /// Clears `last_credit_topup_at` so the next top-up is not rate limited.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn reset_topup_cooldown(&self, email: &str) -> Result<bool, AppError>;
}
