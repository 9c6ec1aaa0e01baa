//! Outbound e-mail.
//!
//! - [`HttpMailer`] - Renders askama templates and posts them to a mail API
//! - [`NullMailer`] - No-op used when mail is not configured

pub mod http_mailer;
pub mod null_mailer;

pub use http_mailer::{HttpMailer, MailConfig};
pub use null_mailer::NullMailer;
