//! HTTP server initialization and runtime setup.
//!
//! Handles database connections, migrations, wiring of repositories, payment
//! providers and the mailer into services, and the Axum server lifecycle.

use crate::application::services::{
    CreditService, LinkService, SubscriptionService, UserService, WebhookService,
};
use crate::config::Config;
use crate::domain::gateways::{Notifier, PaymentGateway, WebhookAdapter};
use crate::infrastructure::mail::{HttpMailer, NullMailer};
use crate::infrastructure::payments::{
    PaddleClient, PaddleWebhook, RazorpayClient, RazorpayWebhook,
};
use crate::infrastructure::persistence::{
    PgLinkRepository, PgPingRepository, PgSubscriptionRepository, PgUserRepository,
};
use crate::routes::{RouterOptions, app_router};
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - PostgreSQL connection pool
/// - Apply migrations
/// - Payment gateways and webhook adapters for every configured provider
/// - Mailer (or NullMailer fallback)
/// - Axum HTTP server with graceful shutdown on Ctrl+C
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    tracing::info!("Connected to database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to migrate")?;

    let state = build_state(&config, pool);

    let app = app_router(
        state,
        RouterOptions {
            behind_proxy: config.behind_proxy,
            cors_allowed_origin: config.cors_allowed_origin.clone(),
        },
    );

    let addr: SocketAddr = config.listen_addr.parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Wires repositories and external clients into the services.
pub fn build_state(config: &Config, pool: PgPool) -> AppState {
    let pool = Arc::new(pool);
    let users = Arc::new(PgUserRepository::new(pool.clone()));
    let links = Arc::new(PgLinkRepository::new(pool.clone()));
    let pings = Arc::new(PgPingRepository::new(pool.clone()));
    let subscriptions = Arc::new(PgSubscriptionRepository::new(pool));

    let notifier: Arc<dyn Notifier> = match &config.mail {
        Some(mail) => {
            tracing::info!("Credit notifications enabled");
            Arc::new(HttpMailer::new(mail.clone()))
        }
        None => {
            tracing::info!("Mail not configured, credit notifications disabled");
            Arc::new(NullMailer)
        }
    };

    let mut gateways: Vec<Arc<dyn PaymentGateway>> = Vec::new();
    if let Some(rp) = &config.razorpay {
        gateways.push(Arc::new(RazorpayClient::new(rp.clone())));
    }
    if let Some(paddle) = &config.paddle {
        gateways.push(Arc::new(PaddleClient::new(paddle.clone())));
    }

    let mut adapters: Vec<Arc<dyn WebhookAdapter>> = Vec::new();
    if let Some(secret) = &config.razorpay_webhook_secret {
        adapters.push(Arc::new(RazorpayWebhook::new(secret.clone())));
    }
    if let Some(secret) = &config.paddle_webhook_secret {
        adapters.push(Arc::new(
            PaddleWebhook::new(secret.clone()).with_max_age(config.paddle_webhook_max_age()),
        ));
    }

    let policy = config.credit_policy();

    AppState {
        credit_service: Arc::new(CreditService::new(users.clone(), notifier, policy)),
        link_service: Arc::new(LinkService::new(
            users.clone(),
            links.clone(),
            pings,
            config.starting_credit,
            config.free_link_limit,
        )),
        user_service: Arc::new(UserService::new(
            users.clone(),
            links,
            config.starting_credit,
            config.max_users,
        )),
        subscription_service: Arc::new(SubscriptionService::new(
            users.clone(),
            subscriptions.clone(),
            gateways,
            config.payment_provider,
        )),
        webhook_service: Arc::new(WebhookService::new(users, subscriptions, adapters)),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
