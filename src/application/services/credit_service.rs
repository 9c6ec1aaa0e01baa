//! Credit balance queries and top-ups.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::counter;
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::entities::User;
use crate::domain::gateways::{CreditNotice, NotificationError, Notifier};
use crate::domain::ledger::{CreditPolicy, TopUpRejection};
use crate::domain::repositories::{CreditTopUp, UserRepository};
use crate::error::AppError;
use crate::utils::format::format_thousands;
use crate::utils::validation::validate_email;

/// Outcome of a committed top-up.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditAdded {
    pub email: String,
    pub previous_credit: i64,
    pub added_credit: i64,
    pub new_credit: i64,
    pub created_at: DateTime<Utc>,
    pub email_sent: bool,
    pub remaining_capacity: i64,
}

/// Service for reading and adding credit.
///
/// The ledger rules are evaluated first for a precise error, then enforced
/// again by the guarded update in the repository.
pub struct CreditService {
    users: Arc<dyn UserRepository>,
    notifier: Arc<dyn Notifier>,
    policy: CreditPolicy,
}

impl CreditService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        notifier: Arc<dyn Notifier>,
        policy: CreditPolicy,
    ) -> Self {
        Self {
            users,
            notifier,
            policy,
        }
    }

    pub fn policy(&self) -> &CreditPolicy {
        &self.policy
    }

    /// Returns the user owning `email`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a malformed e-mail and
    /// [`AppError::NotFound`] for an unknown one.
    pub async fn get_credit(&self, email: &str) -> Result<User, AppError> {
        require_email(email)?;

        self.users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found("User not found", json!({ "email": email })))
    }

    /// Adds the configured increment to a user's balance.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for a malformed e-mail
    /// - [`AppError::NotFound`] for an unknown user
    /// - [`AppError::RateLimited`] while the cooldown is running
    /// - [`AppError::LimitExceeded`] if the ceiling would be crossed
    /// - [`AppError::Conflict`] if a concurrent change made the guarded update miss
    pub async fn add_credit(&self, email: &str) -> Result<CreditAdded, AppError> {
        require_email(email)?;

        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found("User not found", json!({ "email": email })))?;

        let now = Utc::now();
        let top_up = self
            .policy
            .evaluate(user.credit, user.last_credit_topup_at, now)
            .map_err(|rejection| self.rejection_error(rejection))?;

        let updated = self
            .users
            .apply_credit_top_up(CreditTopUp {
                email: email.to_string(),
                amount: top_up.added,
                max_credit: self.policy.max_credit,
                cooldown_cutoff: self.policy.cooldown_cutoff(now),
                recorded_at: top_up.recorded_at,
            })
            .await?
            .ok_or_else(|| {
                AppError::conflict(
                    "Credit balance changed while processing the request, please retry",
                    json!({ "email": email }),
                )
            })?;

        counter!("credit_topups_total").increment(1);
        info!(
            email = %email,
            previous = top_up.previous,
            new_balance = updated.credit,
            "Credit added"
        );

        let previous_credit = updated.credit - top_up.added;
        let email_sent = self
            .notify(CreditNotice {
                email: updated.email.clone(),
                previous_credit,
                added_credit: top_up.added,
                new_credit: updated.credit,
            })
            .await;

        Ok(CreditAdded {
            email: updated.email,
            previous_credit,
            added_credit: top_up.added,
            new_credit: updated.credit,
            created_at: updated.created_at,
            email_sent,
            remaining_capacity: self.policy.remaining_capacity(updated.credit),
        })
    }

    async fn notify(&self, notice: CreditNotice) -> bool {
        match self.notifier.send_credit_added(&notice).await {
            Ok(()) => true,
            Err(NotificationError::Disabled) => {
                debug!(email = %notice.email, "Mail disabled, skipping credit notification");
                false
            }
            Err(e) => {
                warn!(email = %notice.email, error = %e, "Failed to send credit notification");
                false
            }
        }
    }

    fn rejection_error(&self, rejection: TopUpRejection) -> AppError {
        match rejection {
            TopUpRejection::CoolingDown {
                last_topup_at,
                next_available_at,
                hours_remaining,
            } => AppError::rate_limited(
                format!(
                    "Credits can only be added once per cooldown period. Try again in {hours_remaining} hour(s)."
                ),
                json!({
                    "last_topup_at": last_topup_at,
                    "next_available_at": next_available_at,
                    "hours_remaining": hours_remaining,
                }),
            ),
            TopUpRejection::CeilingExceeded {
                current,
                increment,
                would_result_in,
                maximum,
                remaining_capacity,
            } => AppError::limit_exceeded(
                format!(
                    "Cannot add credits. Maximum credit limit is {}.",
                    format_thousands(maximum)
                ),
                json!({
                    "current_credit": current,
                    "attempted_addition": increment,
                    "would_result_in": would_result_in,
                    "maximum_allowed": maximum,
                    "remaining_capacity": remaining_capacity,
                    "can_add_more": remaining_capacity > 0,
                }),
            ),
        }
    }
}

pub(crate) fn require_email(email: &str) -> Result<(), AppError> {
    if validate_email(email) {
        Ok(())
    } else {
        Err(AppError::bad_request(
            "Please provide a valid email address",
            json!({ "field": "email" }),
        ))
    }
}
