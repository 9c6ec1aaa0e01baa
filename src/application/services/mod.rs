//! Business logic services for the application layer.

pub mod credit_service;
pub mod link_service;
pub mod subscription_service;
pub mod user_service;
pub mod webhook_service;

pub use credit_service::{CreditAdded, CreditService};
pub use link_service::{AddLinkOutcome, LinkService};
pub use subscription_service::{Cancellation, CheckoutCreated, SubscriptionService};
pub use user_service::{Registration, UserService};
pub use webhook_service::WebhookService;
