//! PostgreSQL implementation of the link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{Link, LinkWithOwner, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: i64,
    user_id: i64,
    url: String,
    ping_count: i64,
    last_ping: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<LinkRow> for Link {
    fn from(row: LinkRow) -> Self {
        Link {
            id: row.id,
            user_id: row.user_id,
            url: row.url,
            ping_count: row.ping_count,
            last_ping: row.last_ping,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LinkOwnerRow {
    #[sqlx(flatten)]
    link: LinkRow,
    owner_email: String,
}

/// PostgreSQL repository for monitored links.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Link>, AppError> {
        let rows = sqlx::query_as::<_, LinkRow>(
            r#"
            SELECT id, user_id, url, ping_count, last_ping, created_at
            FROM links
            WHERE user_id = $1
            ORDER BY created_at, id
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Link::from).collect())
    }

    async fn create(&self, new_link: NewLink) -> Result<Link, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            INSERT INTO links (user_id, url)
            VALUES ($1, $2)
            RETURNING id, user_id, url, ping_count, last_ping, created_at
            "#,
        )
        .bind(new_link.user_id)
        .bind(&new_link.url)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn find_with_owner(&self, id: i64) -> Result<Option<LinkWithOwner>, AppError> {
        let row = sqlx::query_as::<_, LinkOwnerRow>(
            r#"
            SELECT l.id, l.user_id, l.url, l.ping_count, l.last_ping, l.created_at,
                   u.email AS owner_email
            FROM links l
            JOIN users u ON u.id = l.user_id
            WHERE l.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(|r| LinkWithOwner {
            link: r.link.into(),
            owner_email: r.owner_email,
        }))
    }

    async fn delete(&self, id: i64) -> Result<Option<Link>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(
            r#"
            DELETE FROM links
            WHERE id = $1
            RETURNING id, user_id, url, ping_count, last_ping, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Link::from))
    }

    async fn count(&self) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM links")
            .fetch_one(self.pool.as_ref())
            .await?;

        Ok(count)
    }
}
