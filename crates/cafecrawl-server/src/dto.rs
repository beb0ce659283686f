use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use cafecrawl_core::models::{Cafe, CrawlRun, CrawlSummary};

// ---------------------------------------------------------------------------
// Crawls
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CrawlSummaryResponse {
    /// Unique cafés collected across all zones, each counted once per run.
    pub total_fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    pub total_saved: usize,
    /// Zones that failed, in catalog order.
    pub failed_zones: Vec<String>,
    pub elapsed_seconds: f64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub cancelled: bool,
    /// Id of the run log entry, absent if recording the run failed.
    pub run_id: Option<Uuid>,
}

impl CrawlSummaryResponse {
    pub fn new(summary: CrawlSummary, run_id: Option<Uuid>) -> Self {
        Self {
            total_fetched: summary.total_fetched,
            inserted: summary.inserted,
            updated: summary.updated,
            total_saved: summary.total_saved(),
            failed_zones: summary.failed_zones,
            elapsed_seconds: summary.elapsed_seconds,
            started_at: summary.started_at,
            finished_at: summary.finished_at,
            cancelled: summary.cancelled,
            run_id,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CrawlRunResponse {
    pub id: Uuid,
    pub job_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    pub failed_zones: Vec<String>,
    pub elapsed_seconds: f64,
    pub cancelled: bool,
}

impl From<CrawlRun> for CrawlRunResponse {
    fn from(run: CrawlRun) -> Self {
        Self {
            id: run.id,
            job_name: run.job_name,
            started_at: run.started_at,
            finished_at: run.finished_at,
            total_fetched: run.total_fetched,
            inserted: run.inserted,
            updated: run.updated,
            failed_zones: run.failed_zones,
            elapsed_seconds: run.elapsed_seconds,
            cancelled: run.cancelled,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListRunsQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CrawlRunListResponse {
    pub runs: Vec<CrawlRunResponse>,
    pub total: usize,
}

// ---------------------------------------------------------------------------
// Cafés
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CafeResponse {
    pub external_id: String,
    pub name: String,
    pub category_code: String,
    pub category_name: String,
    pub address: String,
    pub road_address: String,
    pub phone: String,
    pub longitude: f64,
    pub latitude: f64,
    pub detail_url: String,
    pub zone: String,
    pub source: String,
    pub updated_at: DateTime<Utc>,
    pub first_seen_at: DateTime<Utc>,
}

impl From<Cafe> for CafeResponse {
    fn from(c: Cafe) -> Self {
        Self {
            external_id: c.external_id,
            name: c.name,
            category_code: c.category_code,
            category_name: c.category_name,
            address: c.address,
            road_address: c.road_address,
            phone: c.phone,
            longitude: c.longitude,
            latitude: c.latitude,
            detail_url: c.detail_url,
            zone: c.zone,
            source: c.source,
            updated_at: c.updated_at,
            first_seen_at: c.first_seen_at,
        }
    }
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
pub struct ListCafesQuery {
    /// Only cafés attributed to this zone.
    pub zone: Option<String>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct CafeListResponse {
    pub cafes: Vec<CafeResponse>,
    pub total: usize,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
