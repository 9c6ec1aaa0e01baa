use std::sync::Arc;

use crate::application::services::{
    CreditService, LinkService, SubscriptionService, UserService, WebhookService,
};

/// Shared state injected into every handler.
///
/// Services are built once in [`crate::server::run`] and cloned cheaply per
/// request.
#[derive(Clone)]
pub struct AppState {
    pub credit_service: Arc<CreditService>,
    pub link_service: Arc<LinkService>,
    pub user_service: Arc<UserService>,
    pub subscription_service: Arc<SubscriptionService>,
    pub webhook_service: Arc<WebhookService>,
}
