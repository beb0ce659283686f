use std::future::Future;

use crate::error::AppError;
use crate::models::{Cafe, CrawlRun, CrawlSummary, NewCafe, PageQuery, SearchPage, UpsertOutcome};

/// Fetches one page of places around a center from the geosearch API.
pub trait PlaceSearch: Send + Sync + Clone {
    /// Issue a single request. Implementations must not retry internally.
    fn search_page(
        &self,
        query: &PageQuery,
    ) -> impl Future<Output = Result<SearchPage, AppError>> + Send;
}

/// Persists cafés keyed by their external id.
pub trait CafeStore: Send + Sync + Clone {
    /// Insert the café if its external id is unknown, otherwise overwrite every
    /// field except `first_seen_at`. Must be atomic per external id.
    fn upsert(&self, cafe: &NewCafe) -> impl Future<Output = Result<UpsertOutcome, AppError>> + Send;

    fn get(&self, external_id: &str)
    -> impl Future<Output = Result<Option<Cafe>, AppError>> + Send;

    /// Cafés attributed to a zone, most recently updated first.
    fn list_by_zone(
        &self,
        zone: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<Cafe>, AppError>> + Send;

    /// Most recently updated cafés across all zones.
    fn list_recent(&self, limit: usize) -> impl Future<Output = Result<Vec<Cafe>, AppError>> + Send;
}

/// Records finished crawl runs.
pub trait RunLog: Send + Sync + Clone {
    fn record_run(
        &self,
        job_name: &str,
        summary: &CrawlSummary,
    ) -> impl Future<Output = Result<CrawlRun, AppError>> + Send;

    /// Most recent runs for a job, newest first.
    fn recent_runs(
        &self,
        job_name: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<CrawlRun>, AppError>> + Send;
}
