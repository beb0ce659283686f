use std::ops::{Add, AddAssign};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kakao category group code for cafés.
pub const CAFE_CATEGORY_CODE: &str = "CE7";

/// Provider tag stamped on every stored record.
pub const SOURCE_TAG: &str = "kakao";

/// Search radius around each zone center, in metres.
pub const SEARCH_RADIUS_M: u32 = 2000;

/// Fixed page size of the category search endpoint.
pub const PAGE_SIZE: u32 = 15;

/// Hard page limit of the category search endpoint.
pub const MAX_PAGE: u32 = 45;

/// One place as returned by the category search API.
///
/// Coordinates arrive as strings; everything except the id, name and
/// coordinates may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawPlace {
    pub id: String,
    pub place_name: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub category_group_code: String,
    #[serde(default)]
    pub address_name: String,
    #[serde(default)]
    pub road_address_name: String,
    #[serde(default)]
    pub phone: String,
    /// Longitude.
    pub x: String,
    /// Latitude.
    pub y: String,
    #[serde(default)]
    pub place_url: String,
}

/// A single page of search results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    pub places: Vec<RawPlace>,
    /// True when the API reports there are no further pages.
    pub is_end: bool,
}

/// Parameters for one page request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageQuery {
    pub longitude: f64,
    pub latitude: f64,
    pub radius: u32,
    /// 1-based page cursor, at most [`MAX_PAGE`].
    pub page: u32,
    pub page_size: u32,
}

impl PageQuery {
    /// Query for `page` around the given center using the fixed radius and page size.
    pub fn new(longitude: f64, latitude: f64, page: u32) -> Self {
        Self {
            longitude,
            latitude,
            radius: SEARCH_RADIUS_M,
            page,
            page_size: PAGE_SIZE,
        }
    }
}

/// A normalized café ready to be reconciled into the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCafe {
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
    /// Zone under which the café was discovered in this run.
    pub zone: String,
    pub source: String,
    pub updated_at: DateTime<Utc>,
}

/// A café as stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cafe {
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
    /// Set when the row was first inserted, never overwritten.
    pub first_seen_at: DateTime<Utc>,
}

impl Cafe {
    /// Build the stored form of a freshly inserted café.
    pub fn inserted(cafe: NewCafe) -> Self {
        let first_seen_at = cafe.updated_at;
        Self::with_first_seen(cafe, first_seen_at)
    }

    /// Build the stored form of a café, keeping an existing first-seen timestamp.
    pub fn with_first_seen(cafe: NewCafe, first_seen_at: DateTime<Utc>) -> Self {
        Self {
            external_id: cafe.external_id,
            name: cafe.name,
            category_code: cafe.category_code,
            category_name: cafe.category_name,
            address: cafe.address,
            road_address: cafe.road_address,
            phone: cafe.phone,
            longitude: cafe.longitude,
            latitude: cafe.latitude,
            detail_url: cafe.detail_url,
            zone: cafe.zone,
            source: cafe.source,
            updated_at: cafe.updated_at,
            first_seen_at,
        }
    }
}

/// Whether an upsert created a row or overwrote an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
}

/// Insert/update tally for a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileCounts {
    pub inserted: usize,
    pub updated: usize,
}

impl ReconcileCounts {
    pub fn record(&mut self, outcome: UpsertOutcome) {
        match outcome {
            UpsertOutcome::Inserted => self.inserted += 1,
            UpsertOutcome::Updated => self.updated += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.inserted + self.updated
    }
}

impl Add for ReconcileCounts {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            inserted: self.inserted + rhs.inserted,
            updated: self.updated + rhs.updated,
        }
    }
}

impl AddAssign for ReconcileCounts {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Result of one full crawl over the zone catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrawlSummary {
    pub total_fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Zones whose collection or reconciliation failed, in catalog order.
    pub failed_zones: Vec<String>,
    pub elapsed_seconds: f64,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// True when the run stopped early on cancellation.
    pub cancelled: bool,
}

impl CrawlSummary {
    pub fn total_saved(&self) -> usize {
        self.inserted + self.updated
    }

    pub fn has_failures(&self) -> bool {
        !self.failed_zones.is_empty()
    }
}

/// A persisted crawl run (the batch log).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrawlRun {
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
