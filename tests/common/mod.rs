#![allow(dead_code)]

//! In-memory fakes for the HTTP tests.
//!
//! All repositories share one [`Store`] so cross-table reads (link owner
//! lookups, snapshots) see the same data. The fakes apply the same guards as
//! the SQL they stand in for.

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex};

use napstopper::api::routes::api_routes;
use napstopper::application::services::{
    CreditService, LinkService, SubscriptionService, UserService, WebhookService,
};
use napstopper::domain::entities::{
    Link, LinkWithOwner, NewLink, NewSubscription, NewUser, PaymentProvider, Ping, Plan,
    SubscriptionRecord, SubscriptionStatus, Transition, User,
};
use napstopper::domain::gateways::{
    CancelOutcome, CheckoutRequest, CreditNotice, GatewayError, NotificationError, Notifier,
    PaymentGateway, ProviderSubscription, WebhookAdapter,
};
use napstopper::domain::ledger::CreditPolicy;
use napstopper::domain::repositories::{
    CreditTopUp, LinkRepository, PingRepository, SubscriptionRepository, UserRepository,
};
use napstopper::error::AppError;
use napstopper::infrastructure::payments::{PaddleWebhook, RazorpayWebhook};
use napstopper::state::AppState;
use serde_json::json;

pub const RAZORPAY_WEBHOOK_SECRET: &str = "rzp_webhook_test_secret";
pub const PADDLE_WEBHOOK_SECRET: &str = "pdl_ntfset_test_secret";

/// Signature accepted by [`FakeGateway::verify_payment_signature`].
pub const VALID_PAYMENT_SIGNATURE: &str = "valid-signature";

/// Id returned by [`FakeGateway::create_subscription`].
pub const CHECKOUT_SUBSCRIPTION_ID: &str = "sub_test_checkout";

#[derive(Default)]
pub struct Store {
    pub users: Vec<User>,
    pub links: Vec<Link>,
    pub pings: Vec<Ping>,
    pub subscriptions: Vec<SubscriptionRecord>,
    /// Makes every user query fail, as if the database were down.
    pub offline: bool,
    next_id: i64,
}

impl Store {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub type SharedStore = Arc<Mutex<Store>>;

fn offline_error() -> AppError {
    AppError::internal("Database error", json!({ "cause": "connection refused" }))
}

// ─── Repositories ────────────────────────────────────────────────────────────

pub struct InMemoryUserRepo(pub SharedStore);

#[async_trait]
impl UserRepository for InMemoryUserRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let store = self.0.lock().unwrap();
        if store.offline {
            return Err(offline_error());
        }
        Ok(store.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut store = self.0.lock().unwrap();
        if store.users.iter().any(|u| u.email == new_user.email) {
            return Err(AppError::conflict("User already exists", json!({})));
        }

        let user = User {
            id: store.next_id(),
            email: new_user.email,
            credit: new_user.credit,
            plan: Plan::Free,
            subscription_status: SubscriptionStatus::None,
            subscription_id: None,
            last_credit_topup_at: None,
            created_at: Utc::now(),
        };
        store.users.push(user.clone());
        Ok(user)
    }

    async fn count(&self) -> Result<i64, AppError> {
        let store = self.0.lock().unwrap();
        if store.offline {
            return Err(offline_error());
        }
        Ok(store.users.len() as i64)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, AppError> {
        let store = self.0.lock().unwrap();
        let mut users = store.users.clone();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn apply_credit_top_up(&self, top_up: CreditTopUp) -> Result<Option<User>, AppError> {
        let mut store = self.0.lock().unwrap();
        let Some(user) = store.users.iter_mut().find(|u| u.email == top_up.email) else {
            return Ok(None);
        };

        let within_ceiling = user.credit + top_up.amount <= top_up.max_credit;
        let cooled_down = match (top_up.cooldown_cutoff, user.last_credit_topup_at) {
            (Some(cutoff), Some(last)) => last <= cutoff,
            _ => true,
        };
        if !within_ceiling || !cooled_down {
            return Ok(None);
        }

        user.credit += top_up.amount;
        if let Some(at) = top_up.recorded_at {
            user.last_credit_topup_at = Some(at);
        }
        Ok(Some(user.clone()))
    }

    async fn apply_transition(
        &self,
        subscription_id: &str,
        transition: Transition,
    ) -> Result<u64, AppError> {
        let mut store = self.0.lock().unwrap();
        let mut updated = 0;
        for user in store
            .users
            .iter_mut()
            .filter(|u| u.subscription_id.as_deref() == Some(subscription_id))
            .filter(|u| transition.applies_to(u.subscription_status))
        {
            if let Some(plan) = transition.plan {
                user.plan = plan;
            }
            user.subscription_status = transition.status;
            updated += 1;
        }
        Ok(updated)
    }

    async fn attach_subscription(
        &self,
        user_id: i64,
        subscription_id: &str,
        status: SubscriptionStatus,
    ) -> Result<(), AppError> {
        let mut store = self.0.lock().unwrap();
        if store
            .users
            .iter()
            .any(|u| u.id != user_id && u.subscription_id.as_deref() == Some(subscription_id))
        {
            return Err(AppError::conflict("Subscription already bound", json!({})));
        }

        if let Some(user) = store.users.iter_mut().find(|u| u.id == user_id) {
            user.subscription_id = Some(subscription_id.to_string());
            user.subscription_status = status;
        }
        Ok(())
    }

    async fn rebind_subscription(
        &self,
        pending_reference: &str,
        subscription_id: &str,
    ) -> Result<u64, AppError> {
        let mut store = self.0.lock().unwrap();
        let mut updated = 0;
        for user in store
            .users
            .iter_mut()
            .filter(|u| u.subscription_id.as_deref() == Some(pending_reference))
        {
            user.subscription_id = Some(subscription_id.to_string());
            updated += 1;
        }
        Ok(updated)
    }

    async fn set_subscription_state(
        &self,
        email: &str,
        plan: Option<Plan>,
        status: SubscriptionStatus,
    ) -> Result<Option<User>, AppError> {
        let mut store = self.0.lock().unwrap();
        let Some(user) = store.users.iter_mut().find(|u| u.email == email) else {
            return Ok(None);
        };

        if let Some(plan) = plan {
            user.plan = plan;
        }
        user.subscription_status = status;
        Ok(Some(user.clone()))
    }

    async fn reset_topup_cooldown(&self, email: &str) -> Result<bool, AppError> {
        let mut store = self.0.lock().unwrap();
        match store.users.iter_mut().find(|u| u.email == email) {
            Some(user) => {
                user.last_credit_topup_at = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

pub struct InMemoryLinkRepo(pub SharedStore);

#[async_trait]
impl LinkRepository for InMemoryLinkRepo {
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Link>, AppError> {
        let store = self.0.lock().unwrap();
        Ok(store
            .links
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let mut store = self.0.lock().unwrap();
        if store
            .links
            .iter()
            .any(|l| l.user_id == new_link.user_id && l.url == new_link.url)
        {
            return Err(AppError::conflict("Link already exists", json!({})));
        }

        let link = Link {
            id: store.next_id(),
            user_id: new_link.user_id,
            url: new_link.url,
            ping_count: 0,
            last_ping: None,
            created_at: Utc::now(),
        };
        store.links.push(link.clone());
        Ok(link)
    }

    async fn find_with_owner(&self, id: i64) -> Result<Option<LinkWithOwner>, AppError> {
        let store = self.0.lock().unwrap();
        let Some(link) = store.links.iter().find(|l| l.id == id).cloned() else {
            return Ok(None);
        };

        Ok(store
            .users
            .iter()
            .find(|u| u.id == link.user_id)
            .map(|owner| LinkWithOwner {
                link,
                owner_email: owner.email.clone(),
            }))
    }

    async fn delete(&self, id: i64) -> Result<Option<Link>, AppError> {
        let mut store = self.0.lock().unwrap();
        let Some(pos) = store.links.iter().position(|l| l.id == id) else {
            return Ok(None);
        };
        store.pings.retain(|p| p.link_id != id);
        Ok(Some(store.links.remove(pos)))
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.0.lock().unwrap().links.len() as i64)
    }
}

pub struct InMemoryPingRepo(pub SharedStore);

#[async_trait]
impl PingRepository for InMemoryPingRepo {
    async fn latest_for_links(
        &self,
        link_ids: &[i64],
        limit: i64,
    ) -> Result<Vec<Ping>, AppError> {
        let store = self.0.lock().unwrap();
        let mut out = Vec::new();

        for id in link_ids {
            let mut pings: Vec<Ping> = store
                .pings
                .iter()
                .filter(|p| p.link_id == *id)
                .cloned()
                .collect();
            pings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            out.extend(pings.into_iter().take(limit as usize));
        }
        Ok(out)
    }
}

pub struct InMemorySubscriptionRepo(pub SharedStore);

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepo {
    async fn create(
        &self,
        new_subscription: NewSubscription,
    ) -> Result<SubscriptionRecord, AppError> {
        let mut store = self.0.lock().unwrap();
        if store
            .subscriptions
            .iter()
            .any(|s| s.external_id == new_subscription.external_id)
        {
            return Err(AppError::conflict("Subscription already recorded", json!({})));
        }

        let now = Utc::now();
        let record = SubscriptionRecord {
            id: store.next_id(),
            user_id: new_subscription.user_id,
            provider: new_subscription.provider,
            external_id: new_subscription.external_id,
            plan_type: new_subscription.plan_type,
            status: SubscriptionStatus::Created,
            created_at: now,
            updated_at: now,
        };
        store.subscriptions.push(record.clone());
        Ok(record)
    }

    async fn update_status(
        &self,
        external_id: &str,
        status: SubscriptionStatus,
    ) -> Result<u64, AppError> {
        let mut store = self.0.lock().unwrap();
        let mut updated = 0;
        for record in store
            .subscriptions
            .iter_mut()
            .filter(|s| s.external_id == external_id)
        {
            record.status = status;
            record.updated_at = Utc::now();
            updated += 1;
        }
        Ok(updated)
    }

    async fn rebind(&self, pending_reference: &str, external_id: &str) -> Result<u64, AppError> {
        let mut store = self.0.lock().unwrap();
        let mut updated = 0;
        for record in store
            .subscriptions
            .iter_mut()
            .filter(|s| s.external_id == pending_reference)
        {
            record.external_id = external_id.to_string();
            updated += 1;
        }
        Ok(updated)
    }

    async fn find_latest_for_user(
        &self,
        user_id: i64,
    ) -> Result<Option<SubscriptionRecord>, AppError> {
        let store = self.0.lock().unwrap();
        Ok(store
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id)
            .max_by_key(|s| s.id)
            .cloned())
    }
}

// ─── External collaborators ──────────────────────────────────────────────────

/// Records every notice; optionally fails delivery.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<CreditNotice>>,
    pub fail: bool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_credit_added(&self, notice: &CreditNotice) -> Result<(), NotificationError> {
        if self.fail {
            return Err(NotificationError::Rejected {
                status: 500,
                message: "mail API down".to_string(),
            });
        }
        self.sent.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

/// Razorpay-flavoured gateway that never leaves the process.
pub struct FakeGateway {
    pub cancel_outcome: Result<CancelOutcome, String>,
    pub cancelled: Mutex<Vec<String>>,
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    fn provider(&self) -> PaymentProvider {
        PaymentProvider::Razorpay
    }

    async fn create_subscription(
        &self,
        _request: CheckoutRequest,
    ) -> Result<ProviderSubscription, GatewayError> {
        Ok(ProviderSubscription {
            id: CHECKOUT_SUBSCRIPTION_ID.to_string(),
            status: "created".to_string(),
            checkout_url: Some("https://rzp.io/i/test".to_string()),
        })
    }

    async fn cancel_at_cycle_end(
        &self,
        subscription_id: &str,
    ) -> Result<CancelOutcome, GatewayError> {
        self.cancelled
            .lock()
            .unwrap()
            .push(subscription_id.to_string());
        self.cancel_outcome.clone().map_err(|message| GatewayError::Api {
            status: 400,
            message,
        })
    }

    fn verify_payment_signature(
        &self,
        _subscription_id: &str,
        _payment_id: &str,
        signature: &str,
    ) -> Result<bool, GatewayError> {
        Ok(signature == VALID_PAYMENT_SIGNATURE)
    }
}

// ─── Test application ────────────────────────────────────────────────────────

pub struct TestSettings {
    pub policy: CreditPolicy,
    pub free_link_limit: i64,
    pub max_users: i64,
    pub mail_fails: bool,
    pub cancel_outcome: Result<CancelOutcome, String>,
    pub with_gateway: bool,
}

impl Default for TestSettings {
    fn default() -> Self {
        Self {
            policy: CreditPolicy::default(),
            free_link_limit: 3,
            max_users: 100,
            mail_fails: false,
            cancel_outcome: Ok(CancelOutcome::Scheduled {
                effective_at: Some("2026-11-18T00:00:00+00:00".to_string()),
            }),
            with_gateway: true,
        }
    }
}

pub struct TestApp {
    pub server: TestServer,
    pub store: SharedStore,
    pub notifier: Arc<RecordingNotifier>,
    pub gateway: Arc<FakeGateway>,
}

pub fn create_test_state(
    store: SharedStore,
    settings: TestSettings,
) -> (AppState, Arc<RecordingNotifier>, Arc<FakeGateway>) {
    let users: Arc<dyn UserRepository> = Arc::new(InMemoryUserRepo(store.clone()));
    let links: Arc<dyn LinkRepository> = Arc::new(InMemoryLinkRepo(store.clone()));
    let pings: Arc<dyn PingRepository> = Arc::new(InMemoryPingRepo(store.clone()));
    let subscriptions: Arc<dyn SubscriptionRepository> =
        Arc::new(InMemorySubscriptionRepo(store));

    let notifier = Arc::new(RecordingNotifier {
        sent: Mutex::new(Vec::new()),
        fail: settings.mail_fails,
    });
    let gateway = Arc::new(FakeGateway {
        cancel_outcome: settings.cancel_outcome,
        cancelled: Mutex::new(Vec::new()),
    });

    let gateways: Vec<Arc<dyn PaymentGateway>> = if settings.with_gateway {
        vec![gateway.clone()]
    } else {
        Vec::new()
    };
    let adapters: Vec<Arc<dyn WebhookAdapter>> = vec![
        Arc::new(RazorpayWebhook::new(RAZORPAY_WEBHOOK_SECRET)),
        Arc::new(PaddleWebhook::new(PADDLE_WEBHOOK_SECRET)),
    ];

    let state = AppState {
        credit_service: Arc::new(CreditService::new(
            users.clone(),
            notifier.clone(),
            settings.policy,
        )),
        link_service: Arc::new(LinkService::new(
            users.clone(),
            links.clone(),
            pings,
            settings.policy.starting_credit,
            settings.free_link_limit,
        )),
        user_service: Arc::new(UserService::new(
            users.clone(),
            links,
            settings.policy.starting_credit,
            settings.max_users,
        )),
        subscription_service: Arc::new(SubscriptionService::new(
            users.clone(),
            subscriptions.clone(),
            gateways,
            Some(PaymentProvider::Razorpay),
        )),
        webhook_service: Arc::new(WebhookService::new(users, subscriptions, adapters)),
    };

    (state, notifier, gateway)
}

/// Builds the `/api` router over fresh in-memory storage.
pub fn spawn_app(settings: TestSettings) -> TestApp {
    let store = SharedStore::default();
    let (state, notifier, gateway) = create_test_state(store.clone(), settings);

    let app = Router::new().nest("/api", api_routes()).with_state(state);

    TestApp {
        server: TestServer::new(app).unwrap(),
        store,
        notifier,
        gateway,
    }
}

pub fn test_app() -> TestApp {
    spawn_app(TestSettings::default())
}

impl TestApp {
    pub fn seed_user(&self, email: &str, credit: i64) -> User {
        let mut store = self.store.lock().unwrap();
        let user = User {
            id: store.next_id(),
            email: email.to_string(),
            credit,
            plan: Plan::Free,
            subscription_status: SubscriptionStatus::None,
            subscription_id: None,
            last_credit_topup_at: None,
            created_at: Utc::now() - Duration::days(3),
        };
        store.users.push(user.clone());
        user
    }

    pub fn update_user(&self, email: &str, f: impl FnOnce(&mut User)) {
        let mut store = self.store.lock().unwrap();
        let user = store
            .users
            .iter_mut()
            .find(|u| u.email == email)
            .expect("seeded user");
        f(user);
    }

    pub fn seed_link(&self, user_id: i64, url: &str) -> Link {
        let mut store = self.store.lock().unwrap();
        let link = Link {
            id: store.next_id(),
            user_id,
            url: url.to_string(),
            ping_count: 0,
            last_ping: None,
            created_at: Utc::now(),
        };
        store.links.push(link.clone());
        link
    }

    pub fn seed_ping(&self, link_id: i64, response_time: i32, at: DateTime<Utc>) {
        let mut store = self.store.lock().unwrap();
        store.pings.push(Ping {
            link_id,
            response_time,
            created_at: at,
        });
        if let Some(link) = store.links.iter_mut().find(|l| l.id == link_id) {
            link.ping_count += 1;
            link.last_ping = Some(link.last_ping.map_or(at, |prev| prev.max(at)));
        }
    }

    pub fn user(&self, email: &str) -> Option<User> {
        let store = self.store.lock().unwrap();
        store.users.iter().find(|u| u.email == email).cloned()
    }

    pub fn link_count(&self) -> usize {
        self.store.lock().unwrap().links.len()
    }

    pub fn user_count(&self) -> usize {
        self.store.lock().unwrap().users.len()
    }

    pub fn subscriptions(&self) -> Vec<SubscriptionRecord> {
        self.store.lock().unwrap().subscriptions.clone()
    }

    pub fn go_offline(&self) {
        self.store.lock().unwrap().offline = true;
    }
}
