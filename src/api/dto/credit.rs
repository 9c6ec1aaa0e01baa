//! DTOs for credit balance endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::application::services::CreditAdded;
use crate::domain::entities::User;

/// Request body for `POST /api/credit/add`.
#[derive(Debug, Deserialize, Validate)]
pub struct AddCreditRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email is required"))]
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct CreditResponse {
    pub email: String,
    pub credit: i64,
    pub created_at: DateTime<Utc>,
}

impl From<User> for CreditResponse {
    fn from(user: User) -> Self {
        Self {
            email: user.email,
            credit: user.credit,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CreditAddedResponse {
    pub email: String,
    pub previous_credit: i64,
    pub added_credit: i64,
    pub new_credit: i64,
    pub created_at: DateTime<Utc>,
    pub email_sent: bool,
    pub remaining_capacity: i64,
}

impl From<CreditAdded> for CreditAddedResponse {
    fn from(added: CreditAdded) -> Self {
        Self {
            email: added.email,
            previous_credit: added.previous_credit,
            added_credit: added.added_credit,
            new_credit: added.new_credit,
            created_at: added.created_at,
            email_sent: added.email_sent,
            remaining_capacity: added.remaining_capacity,
        }
    }
}
