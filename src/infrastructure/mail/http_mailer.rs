//! Transactional mail over a JSON HTTP API.
//!
//! Posts `{from, to, subject, html}` with a bearer key, the request shape
//! accepted by Resend and compatible services.

use askama::Template;
use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::gateways::{CreditNotice, NotificationError, Notifier};
use crate::utils::format::format_thousands;

pub const BRAND: &str = "NapStopper";

#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    /// Sender address; shown with the brand as display name.
    pub from: String,
}

/// Body of the credit top-up e-mail.
#[derive(Template)]
#[template(path = "credit_added.html")]
pub struct CreditAddedEmail<'a> {
    pub brand: &'a str,
    pub email: &'a str,
    pub previous: String,
    pub added: String,
    pub new_balance: String,
}

impl<'a> CreditAddedEmail<'a> {
    pub fn from_notice(notice: &'a CreditNotice) -> Self {
        Self {
            brand: BRAND,
            email: &notice.email,
            previous: format_thousands(notice.previous_credit),
            added: format_thousands(notice.added_credit),
            new_balance: format_thousands(notice.new_credit),
        }
    }
}

pub fn credit_added_subject(added: i64) -> String {
    format!(
        "🎉 {} Credits Added to Your {BRAND} Account!",
        format_thousands(added)
    )
}

#[derive(Debug, Serialize)]
struct OutgoingMessage<'a> {
    from: String,
    to: [&'a str; 1],
    subject: String,
    html: String,
}

#[derive(Debug)]
pub struct HttpMailer {
    http: reqwest::Client,
    config: MailConfig,
}

impl HttpMailer {
    pub fn new(config: MailConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Notifier for HttpMailer {
    async fn send_credit_added(&self, notice: &CreditNotice) -> Result<(), NotificationError> {
        let html = CreditAddedEmail::from_notice(notice)
            .render()
            .map_err(|e| NotificationError::Render(e.to_string()))?;

        let message = OutgoingMessage {
            from: format!("{BRAND} <{}>", self.config.from),
            to: [&notice.email],
            subject: credit_added_subject(notice.added_credit),
            html,
        };

        let response = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&message)
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), email = %notice.email, "Mail API rejected message");
            return Err(NotificationError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        debug!(email = %notice.email, "Credit notification sent");
        Ok(())
    }
}
