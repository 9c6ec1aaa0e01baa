//! User registration and plan lookup.

use std::sync::Arc;

use serde_json::json;
use tracing::info;

use crate::domain::entities::{NewUser, User, UserWithLinks};
use crate::domain::repositories::{LinkRepository, UserRepository};
use crate::error::AppError;

use super::credit_service::require_email;

/// Result of [`UserService::authenticate`].
#[derive(Debug, Clone)]
pub struct Registration {
    pub snapshot: UserWithLinks,
    pub is_new_user: bool,
    pub user_count: i64,
}

/// Service for the e-mail based sign-in used by the dashboard.
pub struct UserService {
    users: Arc<dyn UserRepository>,
    links: Arc<dyn LinkRepository>,
    starting_credit: i64,
    max_users: i64,
}

impl UserService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        links: Arc<dyn LinkRepository>,
        starting_credit: i64,
        max_users: i64,
    ) -> Self {
        Self {
            users,
            links,
            starting_credit,
            max_users,
        }
    }

    /// Returns the user for `email`, registering it if there is room.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for a malformed e-mail
    /// - [`AppError::RegistrationClosed`] for a new e-mail once the user cap is reached
    pub async fn authenticate(&self, email: &str) -> Result<Registration, AppError> {
        require_email(email)?;

        let (user, is_new_user) = match self.users.find_by_email(email).await? {
            Some(user) => (user, false),
            None => {
                let count = self.users.count().await?;
                if count >= self.max_users {
                    return Err(AppError::registration_closed(
                        "Registration is closed. The maximum number of users has been reached.",
                        json!({
                            "current_user_count": count,
                            "max_users": self.max_users,
                        }),
                    ));
                }

                find_or_create_user(self.users.as_ref(), email, self.starting_credit).await?
            }
        };

        let links = self.links.list_by_user(user.id).await?;
        let user_count = self.users.count().await?;

        Ok(Registration {
            snapshot: UserWithLinks { user, links },
            is_new_user,
            user_count,
        })
    }

    /// Looks up a user for plan and subscription state.
    ///
    /// # Errors
    ///
    /// [`AppError::NotFound`] for an unknown user.
    pub async fn get_user(&self, email: &str) -> Result<User, AppError> {
        require_email(email)?;

        self.users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found("User not found", json!({ "email": email })))
    }

    /// Number of registered users. Doubles as the database health probe.
    pub async fn user_count(&self) -> Result<i64, AppError> {
        self.users.count().await
    }
}

/// Reads the user for `email` or creates one with `starting_credit`.
///
/// A concurrent insert of the same e-mail surfaces as a unique violation;
/// the existing row is returned instead. The flag is true only if this
/// call created the user.
pub(crate) async fn find_or_create_user(
    users: &dyn UserRepository,
    email: &str,
    starting_credit: i64,
) -> Result<(User, bool), AppError> {
    if let Some(user) = users.find_by_email(email).await? {
        return Ok((user, false));
    }

    match users
        .create(NewUser {
            email: email.to_string(),
            credit: starting_credit,
        })
        .await
    {
        Ok(user) => {
            info!(email = %email, credit = starting_credit, "User created");
            Ok((user, true))
        }
        Err(AppError::Conflict { .. }) => users
            .find_by_email(email)
            .await?
            .map(|user| (user, false))
            .ok_or_else(|| {
                AppError::internal(
                    "User vanished after unique violation",
                    json!({ "email": email }),
                )
            }),
        Err(e) => Err(e),
    }
}
