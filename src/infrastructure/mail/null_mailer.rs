//! Notifier used when no mail API is configured.

use async_trait::async_trait;

use crate::domain::gateways::{CreditNotice, NotificationError, Notifier};

/// Sends nothing and reports [`NotificationError::Disabled`], so responses
/// carry `email_sent: false`.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullMailer;

#[async_trait]
impl Notifier for NullMailer {
    async fn send_credit_added(&self, _notice: &CreditNotice) -> Result<(), NotificationError> {
        Err(NotificationError::Disabled)
    }
}
