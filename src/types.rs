//! Reply and option types for grid queries.
//!
//! Success payloads carry `success: true` and serialize to the JSON shapes
//! the enclosing HTTP layer emits verbatim; the failure side lives in
//! [`crate::error::QueryFailure`].

use crate::category::AqiCategory;
use serde::{Deserialize, Serialize};

/// Label attached to every reply identifying where the samples come from.
pub const DATA_SOURCE: &str = "NASA TEMPO NO2 Satellite Data";

/// Radius used by callers that do not specify one, in kilometres.
pub const DEFAULT_RADIUS_KM: f64 = 25.0;

/// Default cap on the number of points returned by an area query.
pub const DEFAULT_AREA_LIMIT: usize = 50;

/// Hard ceiling on the area result cap, whatever the caller asks for.
pub const MAX_AREA_LIMIT: usize = 100;

/// A latitude/longitude pair in the reply shape shared across the system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Successful nearest-point lookup.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestMatch {
    /// Always `true`.
    pub success: bool,
    /// The matched sample's own coordinates, not the query point.
    pub coordinates: Coordinates,
    pub aqi: i64,
    /// Category as stored in the source data.
    pub category: String,
    pub color: String,
    pub source: &'static str,
    /// Great-circle distance from the query point, rounded to 2 decimals.
    pub distance_km: f64,
    /// Dataset collection time, when the source provides one.
    pub timestamp: Option<String>,
}

/// One qualifying point in an area reply, decorated with its distance from
/// the query center.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaPoint {
    pub coordinates: Coordinates,
    pub aqi: i64,
    pub category: String,
    pub color: String,
    pub distance_km: f64,
}

/// Aggregate statistics over an area query.
///
/// `avg_aqi`/`min_aqi`/`max_aqi` and `category` always describe the full
/// radius-qualifying set. `total_points` counts the points that survived the
/// attribute filters (which is the radius-qualifying count when no filters
/// are set), `displayed_points` counts what made it into `data_points` after
/// the cap, and `filtered` records whether attribute filters removed
/// anything.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaSummary {
    pub center_coordinates: Coordinates,
    pub radius_km: f64,
    pub total_points: usize,
    pub displayed_points: usize,
    pub filtered: bool,
    pub avg_aqi: i64,
    pub min_aqi: i64,
    pub max_aqi: i64,
    /// Category of the average AQI.
    pub category: AqiCategory,
}

/// Successful area query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AreaReport {
    /// Always `true`.
    pub success: bool,
    pub area_summary: AreaSummary,
    pub data_points: Vec<AreaPoint>,
    pub source: &'static str,
    pub timestamp: Option<String>,
}

/// Sort key for area results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Dataset scan order, the default. Deterministic for a given file.
    #[default]
    ScanOrder,
    /// Ascending/descending by AQI.
    Aqi,
    /// Ascending/descending by distance from the query center.
    Distance,
}

/// Sort direction for area results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Post-processing options for [`crate::TempoGrid::area_filtered`].
///
/// Filters, sorting, and the cap all operate on the full radius-qualifying
/// set, so `total_points` stays exact no matter how the results are sorted
/// or limited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaOptions {
    /// Keep only points with `aqi >= min_aqi`.
    pub min_aqi: Option<i64>,
    /// Keep only points with `aqi <= max_aqi`.
    pub max_aqi: Option<i64>,
    /// Keep only points whose stored category name matches exactly.
    pub category: Option<String>,
    pub sort_by: SortBy,
    pub order: SortOrder,
    /// Result cap; clamped to [`MAX_AREA_LIMIT`].
    pub limit: usize,
}

impl Default for AreaOptions {
    fn default() -> Self {
        Self {
            min_aqi: None,
            max_aqi: None,
            category: None,
            sort_by: SortBy::default(),
            order: SortOrder::default(),
            limit: DEFAULT_AREA_LIMIT,
        }
    }
}

impl AreaOptions {
    pub fn with_min_aqi(mut self, min_aqi: i64) -> Self {
        self.min_aqi = Some(min_aqi);
        self
    }

    pub fn with_max_aqi(mut self, max_aqi: i64) -> Self {
        self.max_aqi = Some(max_aqi);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_sort(mut self, sort_by: SortBy, order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.order = order;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Effective result cap after clamping.
    pub fn effective_limit(&self) -> usize {
        self.limit.min(MAX_AREA_LIMIT)
    }
}
