//! Zone catalog: the fixed search centers a crawl walks through.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A named search center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl Zone {
    pub fn new(name: impl Into<String>, longitude: f64, latitude: f64) -> Self {
        Self {
            name: name.into(),
            longitude,
            latitude,
        }
    }
}

/// District centers of Seoul as (name, longitude, latitude).
const SEOUL_DISTRICTS: &[(&str, f64, f64)] = &[
    ("강남구", 127.0495, 37.5172),
    ("강동구", 127.1238, 37.5301),
    ("강북구", 127.0256, 37.6396),
    ("강서구", 126.8495, 37.5509),
    ("관악구", 126.9515, 37.4784),
    ("광진구", 127.0823, 37.5385),
    ("구로구", 126.8876, 37.4954),
    ("금천구", 126.8956, 37.4569),
    ("노원구", 127.0568, 37.6541),
    ("도봉구", 127.0471, 37.6688),
    ("동대문구", 127.0401, 37.5744),
    ("동작구", 126.9397, 37.5124),
    ("마포구", 126.9024, 37.5637),
    ("서대문구", 126.9368, 37.5791),
    ("서초구", 127.0325, 37.4836),
    ("성동구", 127.0369, 37.5636),
    ("성북구", 127.0176, 37.5894),
    ("송파구", 127.1067, 37.5145),
    ("양천구", 126.8687, 37.5170),
    ("영등포구", 126.8963, 37.5264),
    ("용산구", 126.9644, 37.5324),
    ("은평구", 126.9228, 37.6027),
    ("종로구", 126.9784, 37.5730),
    ("중구", 126.9979, 37.5638),
    ("중랑구", 127.0927, 37.6063),
];

/// The built-in catalog: the 25 districts of Seoul.
pub fn seoul_districts() -> Vec<Zone> {
    SEOUL_DISTRICTS
        .iter()
        .map(|&(name, longitude, latitude)| Zone::new(name, longitude, latitude))
        .collect()
}

/// Load a zone catalog from a JSON file containing an array of zones.
pub fn load_zones(path: &Path) -> Result<Vec<Zone>, AppError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        AppError::ConfigError(format!("Failed to read zone file {}: {e}", path.display()))
    })?;
    let zones: Vec<Zone> = serde_json::from_str(&raw)?;
    validate_catalog(&zones)?;
    Ok(zones)
}

/// Check that a catalog is non-empty, has unique names and finite coordinates.
pub fn validate_catalog(zones: &[Zone]) -> Result<(), AppError> {
    if zones.is_empty() {
        return Err(AppError::ConfigError("Zone catalog is empty".into()));
    }

    let mut seen = HashSet::new();
    for zone in zones {
        if !seen.insert(zone.name.as_str()) {
            return Err(AppError::ConfigError(format!(
                "Duplicate zone name '{}'",
                zone.name
            )));
        }
        if !zone.longitude.is_finite() || !zone.latitude.is_finite() {
            return Err(AppError::ConfigError(format!(
                "Zone '{}' has non-finite coordinates",
                zone.name
            )));
        }
    }
    Ok(())
}

/// Restrict a catalog to the named zones, keeping catalog order.
///
/// An empty `names` slice returns the whole catalog.
pub fn select_zones(catalog: Vec<Zone>, names: &[String]) -> Result<Vec<Zone>, AppError> {
    if names.is_empty() {
        return Ok(catalog);
    }

    if let Some(unknown) = names
        .iter()
        .find(|name| !catalog.iter().any(|z| &z.name == *name))
    {
        return Err(AppError::ConfigError(format!("Unknown zone '{unknown}'")));
    }

    Ok(catalog
        .into_iter()
        .filter(|z| names.contains(&z.name))
        .collect())
}
