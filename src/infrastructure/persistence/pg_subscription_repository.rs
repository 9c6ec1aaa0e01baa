//! PostgreSQL implementation of the subscription history repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewSubscription, SubscriptionRecord, SubscriptionStatus};
use crate::domain::repositories::SubscriptionRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct SubscriptionRow {
    id: i64,
    user_id: i64,
    provider: String,
    external_id: String,
    plan_type: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for SubscriptionRecord {
    type Error = AppError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let corrupt =
            |e: String| AppError::internal("Corrupt subscription row", json!({ "cause": e }));

        Ok(SubscriptionRecord {
            id: row.id,
            user_id: row.user_id,
            provider: row.provider.parse().map_err(corrupt)?,
            external_id: row.external_id,
            plan_type: row.plan_type,
            status: row.status.parse().map_err(corrupt)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct PgSubscriptionRepository {
    pool: Arc<PgPool>,
}

impl PgSubscriptionRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubscriptionRepository for PgSubscriptionRepository {
    async fn create(
        &self,
        new_subscription: NewSubscription,
    ) -> Result<SubscriptionRecord, AppError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            INSERT INTO subscriptions (user_id, provider, external_id, plan_type, status)
            VALUES ($1, $2, $3, $4, 'created')
            RETURNING id, user_id, provider, external_id, plan_type, status,
                      created_at, updated_at
            "#,
        )
        .bind(new_subscription.user_id)
        .bind(new_subscription.provider.as_str())
        .bind(&new_subscription.external_id)
        .bind(&new_subscription.plan_type)
        .fetch_one(self.pool.as_ref())
        .await?;

        row.try_into()
    }

    async fn update_status(
        &self,
        external_id: &str,
        status: SubscriptionStatus,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE subscriptions SET status = $2, updated_at = now() WHERE external_id = $1",
        )
        .bind(external_id)
        .bind(status.as_str())
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }

    async fn rebind(&self, pending_reference: &str, external_id: &str) -> Result<u64, AppError> {
        let result = sqlx::query(
            "UPDATE subscriptions SET external_id = $2, updated_at = now() WHERE external_id = $1",
        )
        .bind(pending_reference)
        .bind(external_id)
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }

    async fn find_latest_for_user(
        &self,
        user_id: i64,
    ) -> Result<Option<SubscriptionRecord>, AppError> {
        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, user_id, provider, external_id, plan_type, status, created_at, updated_at
            FROM subscriptions
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(SubscriptionRecord::try_from).transpose()
    }
}
