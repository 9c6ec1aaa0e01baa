//! PostgreSQL implementation of the ping repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::Ping;
use crate::domain::repositories::PingRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct PingRow {
    link_id: i64,
    response_time: i32,
    created_at: DateTime<Utc>,
}

pub struct PgPingRepository {
    pool: Arc<PgPool>,
}

impl PgPingRepository {
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PingRepository for PgPingRepository {
    async fn latest_for_links(
        &self,
        link_ids: &[i64],
        limit: i64,
    ) -> Result<Vec<Ping>, AppError> {
        if link_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, PingRow>(
            r#"
            SELECT link_id, response_time, created_at
            FROM (
                SELECT link_id, response_time, created_at,
                       ROW_NUMBER() OVER (PARTITION BY link_id ORDER BY created_at DESC) AS rn
                FROM pings
                WHERE link_id = ANY($1)
            ) ranked
            WHERE rn <= $2
            ORDER BY link_id, created_at DESC
            "#,
        )
        .bind(link_ids)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| Ping {
                link_id: r.link_id,
                response_time: r.response_time,
                created_at: r.created_at,
            })
            .collect())
    }
}
