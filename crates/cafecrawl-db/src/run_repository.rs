use cafecrawl_core::error::AppError;
use cafecrawl_core::models::{CrawlRun, CrawlSummary};
use cafecrawl_core::traits::RunLog;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Pool, Postgres};
use uuid::Uuid;

use crate::cafe_repository::sql_limit;

/// PostgreSQL-backed log of finished crawl runs.
#[derive(Clone)]
pub struct CrawlRunRepository {
    pool: Pool<Postgres>,
}

impl CrawlRunRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct CrawlRunRow {
    id: Uuid,
    job_name: String,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    total_fetched: i32,
    inserted: i32,
    updated: i32,
    failed_zones: Json<Vec<String>>,
    elapsed_seconds: f64,
    cancelled: bool,
}

impl From<CrawlRunRow> for CrawlRun {
    fn from(row: CrawlRunRow) -> Self {
        CrawlRun {
            id: row.id,
            job_name: row.job_name,
            started_at: row.started_at,
            finished_at: row.finished_at,
            total_fetched: row.total_fetched.max(0) as usize,
            inserted: row.inserted.max(0) as usize,
            updated: row.updated.max(0) as usize,
            failed_zones: row.failed_zones.0,
            elapsed_seconds: row.elapsed_seconds,
            cancelled: row.cancelled,
        }
    }
}

impl RunLog for CrawlRunRepository {
    async fn record_run(&self, job_name: &str, summary: &CrawlSummary) -> Result<CrawlRun, AppError> {
        let row = sqlx::query_as::<_, CrawlRunRow>(
            r#"
            INSERT INTO crawl_runs (
                job_name, started_at, finished_at, total_fetched, inserted, updated,
                failed_zones, elapsed_seconds, cancelled
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(job_name)
        .bind(summary.started_at)
        .bind(summary.finished_at)
        .bind(summary.total_fetched as i32)
        .bind(summary.inserted as i32)
        .bind(summary.updated as i32)
        .bind(Json(&summary.failed_zones))
        .bind(summary.elapsed_seconds)
        .bind(summary.cancelled)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.into())
    }

    async fn recent_runs(&self, job_name: &str, limit: usize) -> Result<Vec<CrawlRun>, AppError> {
        let rows = sqlx::query_as::<_, CrawlRunRow>(
            r#"
            SELECT * FROM crawl_runs
            WHERE job_name = $1
            ORDER BY started_at DESC
            LIMIT $2
            "#,
        )
        .bind(job_name)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}
