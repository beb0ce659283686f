//! Test utilities: mock implementations of the core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::crawl::{CrawlEvent, CrawlReporter};
use crate::error::AppError;
use crate::models::{
    Cafe, CrawlRun, CrawlSummary, NewCafe, PageQuery, RawPlace, SearchPage, UpsertOutcome,
};
use crate::traits::{CafeStore, PlaceSearch, RunLog};
use crate::zone::Zone;

// ---------------------------------------------------------------------------
// MockSearch
// ---------------------------------------------------------------------------

type ScriptedPages = HashMap<String, Vec<Result<SearchPage, AppError>>>;

/// Mock search API with scripted pages per zone center.
///
/// Each call for a center pops the next scripted response. Once a center's
/// script is exhausted (or was never set) an empty last page is returned.
#[derive(Clone, Default)]
pub struct MockSearch {
    pages: Arc<Mutex<ScriptedPages>>,
    calls: Arc<Mutex<Vec<PageQuery>>>,
}

impl MockSearch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zone(self, zone: &Zone, responses: Vec<Result<SearchPage, AppError>>) -> Self {
        self.pages
            .lock()
            .unwrap()
            .insert(center_key(zone.longitude, zone.latitude), responses);
        self
    }

    /// Every query received so far, in order.
    pub fn calls(&self) -> Vec<PageQuery> {
        self.calls.lock().unwrap().clone()
    }
}

fn center_key(longitude: f64, latitude: f64) -> String {
    format!("{longitude},{latitude}")
}

impl PlaceSearch for MockSearch {
    async fn search_page(&self, query: &PageQuery) -> Result<SearchPage, AppError> {
        self.calls.lock().unwrap().push(*query);

        let mut pages = self.pages.lock().unwrap();
        match pages.get_mut(&center_key(query.longitude, query.latitude)) {
            Some(script) if !script.is_empty() => script.remove(0),
            _ => Ok(SearchPage {
                places: vec![],
                is_end: true,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory café store with the same set-on-insert semantics as the database.
#[derive(Clone, Default)]
pub struct MemoryStore {
    cafes: Arc<Mutex<HashMap<String, Cafe>>>,
    reject_id: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that fails every upsert for the given external id.
    pub fn rejecting(mut self, external_id: &str) -> Self {
        self.reject_id = Some(external_id.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.cafes.lock().unwrap().len()
    }

    pub fn get_cafe(&self, external_id: &str) -> Option<Cafe> {
        self.cafes.lock().unwrap().get(external_id).cloned()
    }

    /// All stored rows sorted by external id.
    pub fn snapshot(&self) -> Vec<Cafe> {
        let mut rows: Vec<Cafe> = self.cafes.lock().unwrap().values().cloned().collect();
        rows.sort_by(|a, b| a.external_id.cmp(&b.external_id));
        rows
    }
}

impl CafeStore for MemoryStore {
    async fn upsert(&self, cafe: &NewCafe) -> Result<UpsertOutcome, AppError> {
        if self.reject_id.as_deref() == Some(cafe.external_id.as_str()) {
            return Err(AppError::DatabaseError(format!(
                "write rejected for {}",
                cafe.external_id
            )));
        }

        let mut cafes = self.cafes.lock().unwrap();
        let first_seen = cafes.get(&cafe.external_id).map(|c| c.first_seen_at);
        let (row, outcome) = match first_seen {
            Some(first_seen_at) => (
                Cafe::with_first_seen(cafe.clone(), first_seen_at),
                UpsertOutcome::Updated,
            ),
            None => (Cafe::inserted(cafe.clone()), UpsertOutcome::Inserted),
        };
        cafes.insert(cafe.external_id.clone(), row);
        Ok(outcome)
    }

    async fn get(&self, external_id: &str) -> Result<Option<Cafe>, AppError> {
        Ok(self.get_cafe(external_id))
    }

    async fn list_by_zone(&self, zone: &str, limit: usize) -> Result<Vec<Cafe>, AppError> {
        let mut rows: Vec<Cafe> = self
            .snapshot()
            .into_iter()
            .filter(|c| c.zone == zone)
            .collect();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<Cafe>, AppError> {
        let mut rows = self.snapshot();
        rows.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        rows.truncate(limit);
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// MockRunLog
// ---------------------------------------------------------------------------

/// Run log that keeps runs in memory, optionally failing every write.
#[derive(Clone, Default)]
pub struct MockRunLog {
    pub runs: Arc<Mutex<Vec<CrawlRun>>>,
    fail_writes: bool,
}

impl MockRunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }
}

impl RunLog for MockRunLog {
    async fn record_run(&self, job_name: &str, summary: &CrawlSummary) -> Result<CrawlRun, AppError> {
        if self.fail_writes {
            return Err(AppError::DatabaseError("run log unavailable".into()));
        }
        let run = CrawlRun {
            id: Uuid::new_v4(),
            job_name: job_name.to_string(),
            started_at: summary.started_at,
            finished_at: summary.finished_at,
            total_fetched: summary.total_fetched,
            inserted: summary.inserted,
            updated: summary.updated,
            failed_zones: summary.failed_zones.clone(),
            elapsed_seconds: summary.elapsed_seconds,
            cancelled: summary.cancelled,
        };
        self.runs.lock().unwrap().push(run.clone());
        Ok(run)
    }

    async fn recent_runs(&self, job_name: &str, limit: usize) -> Result<Vec<CrawlRun>, AppError> {
        let runs = self.runs.lock().unwrap();
        Ok(runs
            .iter()
            .rev()
            .filter(|r| r.job_name == job_name)
            .take(limit)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// MockReporter
// ---------------------------------------------------------------------------

/// Mock crawl reporter that records event labels.
#[derive(Default)]
pub struct MockReporter {
    pub events: Arc<Mutex<Vec<String>>>,
    truncated: Arc<Mutex<Vec<String>>>,
}

impl MockReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    /// Zones that completed with truncated pagination.
    pub fn truncated_zones(&self) -> Vec<String> {
        self.truncated.lock().unwrap().clone()
    }
}

impl CrawlReporter for MockReporter {
    fn report(&self, event: CrawlEvent<'_>) {
        let label = match &event {
            CrawlEvent::RunStarted { .. } => "RunStarted",
            CrawlEvent::ZoneStarted { .. } => "ZoneStarted",
            CrawlEvent::ZoneCompleted { zone, outcome } => {
                if outcome.truncated {
                    self.truncated.lock().unwrap().push(zone.to_string());
                }
                "ZoneCompleted"
            }
            CrawlEvent::ZoneFailed { .. } => "ZoneFailed",
            CrawlEvent::Cancelled { .. } => "Cancelled",
            CrawlEvent::RunFinished { .. } => "RunFinished",
        };
        self.events.lock().unwrap().push(label.to_string());
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// A raw place named "Cafe {id}" in 강남구.
pub fn raw_place(id: &str) -> RawPlace {
    raw_place_named(id, &format!("Cafe {id}"))
}

pub fn raw_place_named(id: &str, name: &str) -> RawPlace {
    RawPlace {
        id: id.to_string(),
        place_name: name.to_string(),
        category_name: "음식점 > 카페".to_string(),
        category_group_code: "CE7".to_string(),
        address_name: "서울 강남구 역삼동 1".to_string(),
        road_address_name: String::new(),
        phone: String::new(),
        x: "127.0495".to_string(),
        y: "37.5172".to_string(),
        place_url: format!("http://place.map.kakao.com/{id}"),
    }
}

/// A page holding one raw place per id.
pub fn page(ids: &[&str], is_end: bool) -> SearchPage {
    SearchPage {
        places: ids.iter().map(|id| raw_place(id)).collect(),
        is_end,
    }
}

/// A normalized café for reconciliation tests.
pub fn new_cafe(external_id: &str, zone: &str, updated_at: DateTime<Utc>) -> NewCafe {
    NewCafe {
        external_id: external_id.to_string(),
        name: format!("Cafe {external_id}"),
        category_code: "CE7".to_string(),
        category_name: "음식점 > 카페".to_string(),
        address: "서울 강남구 역삼동 1".to_string(),
        road_address: String::new(),
        phone: String::new(),
        longitude: 127.0495,
        latitude: 37.5172,
        detail_url: format!("http://place.map.kakao.com/{external_id}"),
        zone: zone.to_string(),
        source: "kakao".to_string(),
        updated_at,
    }
}
