//! DTOs for user, registration and plan endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::api::dto::link::LinkDto;
use crate::application::services::Registration;
use crate::domain::entities::{User, UserWithLinks};

/// Request body for `POST /api/users/auth`.
#[derive(Debug, Deserialize, Validate)]
pub struct AuthRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i64,
    pub email: String,
    pub credit: i64,
    pub plan: &'static str,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            credit: user.credit,
            plan: user.plan.as_str(),
            created_at: user.created_at,
        }
    }
}

/// User plus every monitored link; returned after link mutations and by
/// `GET /api/user/{email}/links`.
#[derive(Debug, Serialize)]
pub struct UserLinksResponse {
    pub user: UserDto,
    pub links: Vec<LinkDto>,
    pub total_links: usize,
    pub total_pings: i64,
}

impl From<UserWithLinks> for UserLinksResponse {
    fn from(snapshot: UserWithLinks) -> Self {
        let total_pings = snapshot.total_pings();
        let links: Vec<LinkDto> = snapshot.links.into_iter().map(LinkDto::from).collect();

        Self {
            user: snapshot.user.into(),
            total_links: links.len(),
            total_pings,
            links,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserDto,
    pub links: Vec<LinkDto>,
    pub is_new_user: bool,
    pub user_count: i64,
}

impl From<Registration> for AuthResponse {
    fn from(reg: Registration) -> Self {
        Self {
            user: reg.snapshot.user.into(),
            links: reg.snapshot.links.into_iter().map(LinkDto::from).collect(),
            is_new_user: reg.is_new_user,
            user_count: reg.user_count,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PlanResponse {
    pub plan: &'static str,
    pub subscription_status: &'static str,
    pub subscription_id: Option<String>,
}

impl From<User> for PlanResponse {
    fn from(user: User) -> Self {
        Self {
            plan: user.plan.as_str(),
            subscription_status: user.subscription_status.as_str(),
            subscription_id: user.subscription_id,
        }
    }
}
