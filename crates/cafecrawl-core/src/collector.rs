use std::collections::HashSet;

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::models::{CAFE_CATEGORY_CODE, MAX_PAGE, NewCafe, PageQuery, RawPlace, SOURCE_TAG};
use crate::pacing::Pacer;
use crate::traits::PlaceSearch;
use crate::zone::Zone;

/// The cleaned output of collecting one zone.
#[derive(Debug, Clone)]
pub struct ZoneBatch {
    pub zone: String,
    /// Unique cafés in fetch order, all stamped with the same `updated_at`.
    pub cafes: Vec<NewCafe>,
    pub pages_fetched: u32,
    /// Pagination stopped early on a fetch failure.
    pub truncated: bool,
}

impl ZoneBatch {
    pub fn len(&self) -> usize {
        self.cafes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cafes.is_empty()
    }

    /// Drop cafés whose id is already in `claimed`, claiming the rest.
    ///
    /// Returns how many were dropped.
    pub fn retain_unclaimed(&mut self, claimed: &mut HashSet<String>) -> usize {
        let before = self.cafes.len();
        self.cafes.retain(|c| claimed.insert(c.external_id.clone()));
        before - self.cafes.len()
    }
}

/// Walks every result page for a zone and produces a deduplicated batch.
#[derive(Clone)]
pub struct ZoneCollector<P: PlaceSearch> {
    search: P,
    pacer: Pacer,
}

impl<P: PlaceSearch> ZoneCollector<P> {
    pub fn new(search: P, pacer: Pacer) -> Self {
        Self { search, pacer }
    }

    /// Collect all pages for `zone`.
    ///
    /// Pagination stops at the end flag, at [`MAX_PAGE`], or at the first fetch
    /// failure. A fetch failure after at least one good page keeps the partial
    /// result; a failure on the first page, or any error that is not a fetch
    /// error, is returned as an error.
    pub async fn collect(&self, zone: &Zone) -> Result<ZoneBatch, AppError> {
        let updated_at = Utc::now();
        let mut places: Vec<RawPlace> = Vec::new();
        let mut pages_fetched = 0;
        let mut truncated = false;

        for page in 1..=MAX_PAGE {
            let query = PageQuery::new(zone.longitude, zone.latitude, page);
            match self.search.search_page(&query).await {
                Ok(result) => {
                    pages_fetched += 1;
                    let count = result.places.len();
                    places.extend(result.places);
                    tracing::debug!(
                        zone = %zone.name,
                        page,
                        count,
                        accumulated = places.len(),
                        "Fetched page"
                    );
                    if result.is_end {
                        break;
                    }
                    if page < MAX_PAGE {
                        self.pacer.wait().await;
                    }
                }
                Err(e) if pages_fetched == 0 => {
                    tracing::warn!(zone = %zone.name, page, error = %e, "First page failed");
                    return Err(e);
                }
                Err(e) if !e.is_fetch_error() => {
                    tracing::warn!(zone = %zone.name, page, error = %e, "Zone failed mid-pagination");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        zone = %zone.name,
                        page,
                        error = %e,
                        rate_limited = e.is_rate_limited(),
                        "Page request failed, keeping {} places",
                        places.len()
                    );
                    truncated = true;
                    break;
                }
            }
        }

        let cafes = normalize_batch(places, &zone.name, updated_at)?;
        tracing::info!(zone = %zone.name, cafes = cafes.len(), pages = pages_fetched, "Collected zone");

        Ok(ZoneBatch {
            zone: zone.name.clone(),
            cafes,
            pages_fetched,
            truncated,
        })
    }
}

/// Drop repeated external ids (first occurrence wins) and normalize the rest.
pub fn normalize_batch(
    places: Vec<RawPlace>,
    zone: &str,
    updated_at: DateTime<Utc>,
) -> Result<Vec<NewCafe>, AppError> {
    let mut seen = HashSet::new();
    places
        .into_iter()
        .filter(|p| seen.insert(p.id.clone()))
        .map(|p| normalize_place(p, zone, updated_at))
        .collect()
}

/// Convert a raw API place into a [`NewCafe`].
pub fn normalize_place(
    place: RawPlace,
    zone: &str,
    updated_at: DateTime<Utc>,
) -> Result<NewCafe, AppError> {
    let longitude = parse_coordinate(&place.id, "x", &place.x)?;
    let latitude = parse_coordinate(&place.id, "y", &place.y)?;

    Ok(NewCafe {
        external_id: place.id,
        name: place.place_name,
        category_code: CAFE_CATEGORY_CODE.to_string(),
        category_name: place.category_name,
        address: place.address_name,
        road_address: place.road_address_name,
        phone: place.phone,
        longitude,
        latitude,
        detail_url: place.place_url,
        zone: zone.to_string(),
        source: SOURCE_TAG.to_string(),
        updated_at,
    })
}

fn parse_coordinate(external_id: &str, field: &str, raw: &str) -> Result<f64, AppError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| AppError::InvalidRecord {
            external_id: external_id.to_string(),
            reason: format!("{field} is not a coordinate: '{raw}'"),
        })
}
