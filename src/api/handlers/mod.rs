//! HTTP request handlers for API endpoints.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod credit;
pub mod health;
pub mod links;
pub mod payments;
pub mod users;
pub mod webhooks;

pub use credit::{add_credit_handler, get_credit_handler};
pub use health::health_handler;
pub use links::{add_url_handler, delete_link_handler, response_times_handler, user_links_handler};
pub use payments::{
    cancel_subscription_handler, create_subscription_handler, verify_payment_handler,
};
pub use users::{auth_handler, plan_handler};
pub use webhooks::webhook_handler;
