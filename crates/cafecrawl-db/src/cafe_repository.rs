use cafecrawl_core::error::AppError;
use cafecrawl_core::models::{Cafe, NewCafe, UpsertOutcome};
use cafecrawl_core::traits::CafeStore;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Pool, Postgres};

const CAFE_COLUMNS: &str = "external_id, name, category_code, category_name, address, \
     road_address, phone, longitude, latitude, detail_url, zone, source, updated_at, first_seen_at";

/// Repository for café persistence in PostgreSQL.
#[derive(Clone)]
pub struct CafeRepository {
    pool: Pool<Postgres>,
}

impl CafeRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Total number of stored cafés.
    pub async fn count(&self) -> Result<i64, AppError> {
        let (count,): (i64,) = sqlx::query_as(r#"SELECT COUNT(*) FROM cafes"#)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(count)
    }

    /// Every stored café, optionally restricted to one zone, ordered by external id.
    pub async fn list_all(&self, zone: Option<&str>) -> Result<Vec<Cafe>, AppError> {
        let rows = if let Some(zone) = zone {
            sqlx::query_as::<_, CafeRow>(&format!(
                "SELECT {CAFE_COLUMNS} FROM cafes WHERE zone = $1 ORDER BY external_id"
            ))
            .bind(zone)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, CafeRow>(&format!(
                "SELECT {CAFE_COLUMNS} FROM cafes ORDER BY external_id"
            ))
            .fetch_all(&self.pool)
            .await
        }
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(e.to_string()))?;
        Ok(())
    }
}

// -- Internal row type for sqlx deserialization --

#[derive(sqlx::FromRow)]
struct CafeRow {
    external_id: String,
    name: String,
    category_code: String,
    category_name: String,
    address: String,
    road_address: String,
    phone: String,
    longitude: f64,
    latitude: f64,
    detail_url: String,
    zone: String,
    source: String,
    updated_at: DateTime<Utc>,
    first_seen_at: DateTime<Utc>,
}

impl From<CafeRow> for Cafe {
    fn from(row: CafeRow) -> Self {
        Cafe {
            external_id: row.external_id,
            name: row.name,
            category_code: row.category_code,
            category_name: row.category_name,
            address: row.address,
            road_address: row.road_address,
            phone: row.phone,
            longitude: row.longitude,
            latitude: row.latitude,
            detail_url: row.detail_url,
            zone: row.zone,
            source: row.source,
            updated_at: row.updated_at,
            first_seen_at: row.first_seen_at,
        }
    }
}

impl CafeStore for CafeRepository {
    async fn upsert(&self, cafe: &NewCafe) -> Result<UpsertOutcome, AppError> {
        // xmax is 0 only for a freshly inserted tuple.
        let (inserted,): (bool,) = sqlx::query_as(
            r#"
            INSERT INTO cafes (
                external_id, name, category_code, category_name, address, road_address,
                phone, longitude, latitude, detail_url, zone, source, updated_at, first_seen_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $13)
            ON CONFLICT (external_id) DO UPDATE SET
                name = EXCLUDED.name,
                category_code = EXCLUDED.category_code,
                category_name = EXCLUDED.category_name,
                address = EXCLUDED.address,
                road_address = EXCLUDED.road_address,
                phone = EXCLUDED.phone,
                longitude = EXCLUDED.longitude,
                latitude = EXCLUDED.latitude,
                detail_url = EXCLUDED.detail_url,
                zone = EXCLUDED.zone,
                source = EXCLUDED.source,
                updated_at = EXCLUDED.updated_at
            RETURNING (xmax = 0) AS inserted
            "#,
        )
        .bind(&cafe.external_id)
        .bind(&cafe.name)
        .bind(&cafe.category_code)
        .bind(&cafe.category_name)
        .bind(&cafe.address)
        .bind(&cafe.road_address)
        .bind(&cafe.phone)
        .bind(cafe.longitude)
        .bind(cafe.latitude)
        .bind(&cafe.detail_url)
        .bind(&cafe.zone)
        .bind(&cafe.source)
        .bind(cafe.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(if inserted {
            UpsertOutcome::Inserted
        } else {
            UpsertOutcome::Updated
        })
    }

    async fn get(&self, external_id: &str) -> Result<Option<Cafe>, AppError> {
        let row = sqlx::query_as::<_, CafeRow>(&format!(
            "SELECT {CAFE_COLUMNS} FROM cafes WHERE external_id = $1"
        ))
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(row.map(Into::into))
    }

    async fn list_by_zone(&self, zone: &str, limit: usize) -> Result<Vec<Cafe>, AppError> {
        let rows = sqlx::query_as::<_, CafeRow>(&format!(
            "SELECT {CAFE_COLUMNS} FROM cafes WHERE zone = $1 \
             ORDER BY updated_at DESC, external_id LIMIT $2"
        ))
        .bind(zone)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Cafe>, AppError> {
        let rows = sqlx::query_as::<_, CafeRow>(&format!(
            "SELECT {CAFE_COLUMNS} FROM cafes ORDER BY updated_at DESC, external_id LIMIT $1"
        ))
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

/// Convert a row limit to the `BIGINT` Postgres expects, saturating at `i64::MAX`.
pub(crate) fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
