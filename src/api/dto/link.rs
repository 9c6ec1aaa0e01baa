//! DTOs for monitored link endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::entities::{Link, Ping};
use crate::utils::validation::validate_link;

/// Request body for `POST /api/urls`.
#[derive(Debug, Deserialize, Validate)]
pub struct AddUrlRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Email and link are required"))]
    pub email: String,

    #[serde(default)]
    #[validate(custom(function = "validate_link"))]
    pub link: String,
}

/// Optional body of `DELETE /api/links/{id}`.
///
/// When `email` is present the link must belong to that user.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteLinkRequest {
    pub email: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct LinkDto {
    pub id: i64,
    pub url: String,
    pub ping_count: i64,
    pub last_ping: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Link> for LinkDto {
    fn from(link: Link) -> Self {
        Self {
            id: link.id,
            url: link.url,
            ping_count: link.ping_count,
            last_ping: link.last_ping,
            created_at: link.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedLink {
    pub id: i64,
    pub url: String,
    pub ping_count: i64,
    pub last_ping: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
pub struct DeleteLinkResponse {
    pub deleted_link: DeletedLink,
}

impl From<Link> for DeleteLinkResponse {
    fn from(link: Link) -> Self {
        Self {
            deleted_link: DeletedLink {
                id: link.id,
                url: link.url,
                ping_count: link.ping_count,
                last_ping: link.last_ping,
            },
        }
    }
}

/// Query string of `GET /api/user/{email}/response-times`.
#[derive(Debug, Deserialize)]
pub struct ResponseTimesQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ResponseTimeDto {
    pub response_time: i32,
    pub timestamp: DateTime<Utc>,
}

impl From<Ping> for ResponseTimeDto {
    fn from(ping: Ping) -> Self {
        Self {
            response_time: ping.response_time,
            timestamp: ping.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_url_validation() {
        let ok: AddUrlRequest =
            serde_json::from_str(r#"{"email":"a@b.com","link":"https://x.onrender.com"}"#).unwrap();
        assert!(ok.validate().is_ok());

        let bad: AddUrlRequest =
            serde_json::from_str(r#"{"email":"a@b.com","link":"not a url"}"#).unwrap();
        let errors = bad.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("link"));

        let missing: AddUrlRequest = serde_json::from_str(r#"{"link":"https://x.com"}"#).unwrap();
        assert!(missing.validate().is_err());
    }

    #[test]
    fn test_deleted_link_shape() {
        let link = Link {
            id: 4,
            user_id: 1,
            url: "https://x.com".to_string(),
            ping_count: 12,
            last_ping: None,
            created_at: Utc::now(),
        };

        let value = serde_json::to_value(DeleteLinkResponse::from(link)).unwrap();

        assert_eq!(value["deleted_link"]["id"], 4);
        assert_eq!(value["deleted_link"]["ping_count"], 12);
        assert!(value["deleted_link"]["last_ping"].is_null());
        assert!(value["deleted_link"].get("created_at").is_none());
    }
}
