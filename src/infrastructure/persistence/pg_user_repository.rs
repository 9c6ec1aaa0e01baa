//! PostgreSQL implementation of the user repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{NewUser, Plan, SubscriptionStatus, Transition, User};
use crate::domain::repositories::{CreditTopUp, UserRepository};
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    email: String,
    credit: i64,
    plan: String,
    subscription_status: String,
    subscription_id: Option<String>,
    last_credit_topup_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = AppError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let plan = row
            .plan
            .parse()
            .map_err(|e: String| AppError::internal("Corrupt user row", json!({ "cause": e })))?;
        let subscription_status = row
            .subscription_status
            .parse()
            .map_err(|e: String| AppError::internal("Corrupt user row", json!({ "cause": e })))?;

        Ok(User {
            id: row.id,
            email: row.email,
            credit: row.credit,
            plan,
            subscription_status,
            subscription_id: row.subscription_id,
            last_credit_topup_at: row.last_credit_topup_at,
            created_at: row.created_at,
        })
    }
}

/// PostgreSQL repository for users.
///
/// Credit and plan mutations are single statements keyed by a unique column.
pub struct PgUserRepository {
    pool: Arc<PgPool>,
}

impl PgUserRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, credit, plan, subscription_status, subscription_id,
                   last_credit_topup_at, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            INSERT INTO users (email, credit)
            VALUES ($1, $2)
            RETURNING id, email, credit, plan, subscription_status, subscription_id,
                      last_credit_topup_at, created_at
            "#,
        )
        .bind(&new_user.email)
        .bind(new_user.credit)
        .fetch_one(self.pool.as_ref())
        .await?;

        row.try_into()
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, credit, plan, subscription_status, subscription_id,
                   last_credit_topup_at, created_at
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        rows.into_iter().map(User::try_from).collect()
    }

    async fn apply_credit_top_up(&self, top_up: CreditTopUp) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET credit = credit + $2,
                last_credit_topup_at = COALESCE($4, last_credit_topup_at)
            WHERE email = $1
              AND credit + $2 <= $3
              AND ($5::timestamptz IS NULL
                   OR last_credit_topup_at IS NULL
                   OR last_credit_topup_at <= $5)
            RETURNING id, email, credit, plan, subscription_status, subscription_id,
                      last_credit_topup_at, created_at
            "#,
        )
        .bind(&top_up.email)
        .bind(top_up.amount)
        .bind(top_up.max_credit)
        .bind(top_up.recorded_at)
        .bind(top_up.cooldown_cutoff)
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn apply_transition(
        &self,
        subscription_id: &str,
        transition: Transition,
    ) -> Result<u64, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET plan = COALESCE($2, plan),
                subscription_status = $3
            WHERE subscription_id = $1
              AND (subscription_status NOT IN ('cancelled', 'completed')
                   OR $3 IN ('cancelled', 'completed'))
            "#,
        )
        .bind(subscription_id)
        .bind(transition.plan.map(|p| p.as_str()))
        .bind(transition.status.as_str())
        .execute(self.pool.as_ref())
        .await?;

        Ok(result.rows_affected())
    }

    async fn attach_subscription(
        &self,
        user_id: i64,
        subscription_id: &str,
        status: SubscriptionStatus,
    ) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET subscription_id = $2, subscription_status = $3 WHERE id = $1",
        )
        .bind(user_id)
        .bind(subscription_id)
        .bind(status.as_str())
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(
                "User not found",
                json!({ "user_id": user_id }),
            ));
        }

        Ok(())
    }

    async fn rebind_subscription(
        &self,
        pending_reference: &str,
        subscription_id: &str,
    ) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE users SET subscription_id = $2 WHERE subscription_id = $1")
            .bind(pending_reference)
            .bind(subscription_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    async fn set_subscription_state(
        &self,
        email: &str,
        plan: Option<Plan>,
        status: SubscriptionStatus,
    ) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            UPDATE users
            SET plan = COALESCE($2, plan),
                subscription_status = $3
            WHERE email = $1
            RETURNING id, email, credit, plan, subscription_status, subscription_id,
                      last_credit_topup_at, created_at
            "#,
        )
        .bind(email)
        .bind(plan.map(|p| p.as_str()))
        .bind(status.as_str())
        .fetch_optional(self.pool.as_ref())
        .await?;

        row.map(User::try_from).transpose()
    }

    async fn reset_topup_cooldown(&self, email: &str) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE users SET last_credit_topup_at = NULL WHERE email = $1")
            .bind(email)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
