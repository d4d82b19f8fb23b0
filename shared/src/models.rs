use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Event as returned by the events API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub start_date: NaiveDateTime,
    pub end_date: NaiveDateTime,
    #[serde(default)]
    pub weather_data: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Page envelope used by every list endpoint.
///
/// The server also sends `pageable` and `sort` blocks; nothing here reads
/// them, so they are left to serde's unknown-field handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub total_elements: u64,
    pub total_pages: u32,
    /// Zero-based page index
    pub number: u32,
    #[serde(default)]
    pub size: u32,
    #[serde(default)]
    pub number_of_elements: u32,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
    #[serde(default)]
    pub empty: bool,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.number + 1 < self.total_pages
    }

    pub fn has_previous(&self) -> bool {
        self.number > 0
    }
}

/// Geocoded place returned by the location search endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Place {
    pub display_name: String,
    pub lat: String,
    pub lon: String,
}

impl Place {
    /// Stable identity of the place; two results at the same coordinates are the same place.
    pub fn key(&self) -> String {
        format!("{},{}", self.lat, self.lon)
    }

    /// Leading part of the label, usually the locality.
    pub fn name(&self) -> &str {
        self.display_name
            .split(',')
            .next()
            .unwrap_or_default()
            .trim()
    }

    /// Everything after the first comma of the label.
    pub fn region(&self) -> &str {
        match self.display_name.split_once(',') {
            Some((_, rest)) => rest.trim(),
            None => "",
        }
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat = self.lat.trim().parse::<f64>().ok()?;
        let lon = self.lon.trim().parse::<f64>().ok()?;
        Some((lat, lon))
    }
}
