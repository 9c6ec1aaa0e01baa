//! Outbound user notifications.

use async_trait::async_trait;
use thiserror::Error;

/// Facts about a completed credit top-up.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditNotice {
    pub email: String,
    pub previous_credit: i64,
    pub added_credit: i64,
    pub new_credit: i64,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("mail delivery is not configured")]
    Disabled,

    #[error("failed to render message: {0}")]
    Render(String),

    #[error("mail API unreachable: {0}")]
    Transport(String),

    #[error("mail API returned {status}: {message}")]
    Rejected { status: u16, message: String },
}

/// Sends notifications after a state change has been committed.
///
/// Failures never roll the change back; callers surface them as a flag.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_credit_added(&self, notice: &CreditNotice) -> Result<(), NotificationError>;
}
