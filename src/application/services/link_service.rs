//! Monitored link registration, listing and deletion.

use std::collections::HashMap;
use std::sync::Arc;

use metrics::counter;
use serde_json::json;
use tracing::info;

use crate::application::services::user_service::find_or_create_user;
use crate::domain::entities::{Link, NewLink, Ping, User, UserWithLinks};
use crate::domain::repositories::{LinkRepository, PingRepository, UserRepository};
use crate::error::AppError;
use crate::utils::validation::validate_url;

use super::credit_service::require_email;

pub const DEFAULT_RESPONSE_TIME_LIMIT: i64 = 5;
pub const MAX_RESPONSE_TIME_LIMIT: i64 = 100;

/// Result of [`LinkService::add_link`].
#[derive(Debug, Clone)]
pub enum AddLinkOutcome {
    /// The link was stored; `snapshot` includes it.
    Created {
        snapshot: UserWithLinks,
        link: Link,
        user_created: bool,
    },
    /// The user already monitors this URL. Nothing was written.
    AlreadyMonitored { snapshot: UserWithLinks },
}

/// Service enforcing per-plan link quotas and link ownership.
pub struct LinkService {
    users: Arc<dyn UserRepository>,
    links: Arc<dyn LinkRepository>,
    pings: Arc<dyn PingRepository>,
    starting_credit: i64,
    free_link_limit: i64,
}

impl LinkService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        links: Arc<dyn LinkRepository>,
        pings: Arc<dyn PingRepository>,
        starting_credit: i64,
        free_link_limit: i64,
    ) -> Self {
        Self {
            users,
            links,
            pings,
            starting_credit,
            free_link_limit,
        }
    }

    /// Registers `url` for the user owning `email`, creating the user on
    /// first use.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for a malformed e-mail or URL
    /// - [`AppError::QuotaExceeded`] when a free user is at the link limit
    pub async fn add_link(&self, email: &str, url: &str) -> Result<AddLinkOutcome, AppError> {
        require_email(email)?;
        if !validate_url(url) {
            return Err(AppError::bad_request(
                "Please provide a valid URL",
                json!({ "field": "link" }),
            ));
        }

        let (user, user_created) =
            find_or_create_user(self.users.as_ref(), email, self.starting_credit).await?;
        let links = self.links.list_by_user(user.id).await?;

        if !user.is_paid() && links.len() as i64 >= self.free_link_limit {
            return Err(AppError::quota_exceeded(
                format!(
                    "Link limit reached: {} of {} links used on the {} plan. Upgrade to add more.",
                    links.len(),
                    self.free_link_limit,
                    user.plan.as_str()
                ),
                json!({
                    "current_links": links.len(),
                    "max_allowed": self.free_link_limit,
                    "user_plan": user.plan.as_str(),
                }),
            ));
        }

        if links.iter().any(|l| l.url == url) {
            return Ok(AddLinkOutcome::AlreadyMonitored {
                snapshot: UserWithLinks { user, links },
            });
        }

        let link = match self
            .links
            .create(NewLink {
                user_id: user.id,
                url: url.to_string(),
            })
            .await
        {
            Ok(link) => link,
            // Lost a race against an identical insert.
            Err(AppError::Conflict { .. }) => {
                let links = self.links.list_by_user(user.id).await?;
                return Ok(AddLinkOutcome::AlreadyMonitored {
                    snapshot: UserWithLinks { user, links },
                });
            }
            Err(e) => return Err(e),
        };

        counter!("links_created_total").increment(1);
        info!(email = %email, link_id = link.id, user_created, "Link added");

        let mut links = links;
        links.push(link.clone());

        Ok(AddLinkOutcome::Created {
            snapshot: UserWithLinks { user, links },
            link,
            user_created,
        })
    }

    /// Deletes a link by id, checking ownership when `email` is given.
    ///
    /// Deletion only removes the row; no credit is refunded.
    ///
    /// # Errors
    ///
    /// - [`AppError::Validation`] for a non-numeric id or malformed e-mail
    /// - [`AppError::NotFound`] if the link does not exist
    /// - [`AppError::Forbidden`] if `email` does not own the link
    pub async fn delete_link(&self, raw_id: &str, email: Option<&str>) -> Result<Link, AppError> {
        let id: i64 = raw_id.trim().parse().map_err(|_| {
            AppError::bad_request("Invalid link ID", json!({ "id": raw_id }))
        })?;

        if let Some(email) = email {
            require_email(email)?;

            let owned = self
                .links
                .find_with_owner(id)
                .await?
                .ok_or_else(|| link_not_found(id))?;

            if !owned.is_owned_by(email) {
                return Err(AppError::forbidden(
                    "You do not have permission to delete this link",
                    json!({ "id": id }),
                ));
            }
        }

        let deleted = self.links.delete(id).await?.ok_or_else(|| link_not_found(id))?;
        info!(link_id = id, "Link deleted");

        Ok(deleted)
    }

    /// Returns a user with all of their links.
    ///
    /// # Errors
    ///
    /// [`AppError::NotFound`] for an unknown user.
    pub async fn user_links(&self, email: &str) -> Result<UserWithLinks, AppError> {
        let user = self.require_user(email).await?;
        let links = self.links.list_by_user(user.id).await?;

        Ok(UserWithLinks { user, links })
    }

    /// Latest response times per monitored URL, newest first.
    ///
    /// `limit` defaults to 5 and is clamped to 1..=100.
    pub async fn response_times(
        &self,
        email: &str,
        limit: Option<i64>,
    ) -> Result<Vec<(Link, Vec<Ping>)>, AppError> {
        let limit = limit
            .unwrap_or(DEFAULT_RESPONSE_TIME_LIMIT)
            .clamp(1, MAX_RESPONSE_TIME_LIMIT);

        let user = self.require_user(email).await?;
        let links = self.links.list_by_user(user.id).await?;
        let ids: Vec<i64> = links.iter().map(|l| l.id).collect();

        let mut by_link: HashMap<i64, Vec<Ping>> = HashMap::new();
        for ping in self.pings.latest_for_links(&ids, limit).await? {
            by_link.entry(ping.link_id).or_default().push(ping);
        }

        Ok(links
            .into_iter()
            .map(|link| {
                let pings = by_link.remove(&link.id).unwrap_or_default();
                (link, pings)
            })
            .collect())
    }

    async fn require_user(&self, email: &str) -> Result<User, AppError> {
        require_email(email)?;

        self.users
            .find_by_email(email)
            .await?
            .ok_or_else(|| AppError::not_found("User not found", json!({ "email": email })))
    }
}

fn link_not_found(id: i64) -> AppError {
    AppError::not_found("Link not found", json!({ "id": id }))
}
