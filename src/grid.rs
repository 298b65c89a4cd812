//! Query engine over the sample grid.
//!
//! Both query types are linear scans over the cached dataset: the grid is
//! small (low thousands of points) and static, so a spatial index would buy
//! nothing measurable. Queries are pure computations over an immutable
//! snapshot and run concurrently without coordination; failures cross the
//! boundary as [`QueryFailure`] values, never as panics.

use crate::builder::GridBuilder;
use crate::category::AqiCategory;
use crate::dataset::{Dataset, SamplePoint};
use crate::error::{FailureKind, QueryFailure, QueryResult, Result};
use crate::spatial::{haversine_km, round_km};
use crate::store::DatasetStore;
use crate::types::{
    AreaOptions, AreaPoint, AreaReport, AreaSummary, Coordinates, DATA_SOURCE, NearestMatch,
    SortBy, SortOrder,
};
use geo::Point;
use std::path::Path;
use std::sync::Arc;

/// The spatial query engine.
///
/// Owns a [`DatasetStore`] and answers nearest-point and radius-bounded
/// area queries over it.
///
/// # Examples
///
/// ```rust
/// use tempo_grid::{Dataset, SamplePoint, TempoGrid};
///
/// let dataset = Dataset::new(
///     vec![SamplePoint {
///         latitude: 40.0,
///         longitude: -74.0,
///         aqi: 40,
///         category: "Good".into(),
///         color: "#00E400".into(),
///     }],
///     Some("2025-10-05T12:00:28Z".into()),
/// )?;
///
/// let grid = TempoGrid::from_dataset(dataset);
/// let reply = grid.nearest(40.0, -74.0).unwrap();
/// assert_eq!(reply.distance_km, 0.0);
/// assert_eq!(reply.category, "Good");
/// # Ok::<(), tempo_grid::GridError>(())
/// ```
pub struct TempoGrid {
    store: DatasetStore,
}

impl TempoGrid {
    /// Start building a grid with explicit configuration.
    pub fn builder() -> GridBuilder {
        GridBuilder::new()
    }

    /// Open a grid backed by a GeoJSON file, loading it eagerly so that
    /// startup fails fast on a bad file.
    ///
    /// # Errors
    ///
    /// Any loader error: missing/unreadable file, invalid GeoJSON, or an
    /// empty collection.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        GridBuilder::new().data_path(path.as_ref()).eager().build()
    }

    /// Grid over an already-built dataset. Never touches storage.
    pub fn from_dataset(dataset: Dataset) -> Self {
        Self {
            store: DatasetStore::fixed(dataset),
        }
    }

    pub(crate) fn with_store(store: DatasetStore) -> Self {
        Self { store }
    }

    /// Whether the dataset cache is populated.
    pub fn is_warm(&self) -> bool {
        self.store.is_warm()
    }

    /// Re-read the backing storage and swap the cached dataset.
    ///
    /// # Errors
    ///
    /// Loader errors; on failure the previous cache stays in place.
    pub fn reload(&self) -> Result<()> {
        self.store.reload()?;
        Ok(())
    }

    /// Find the single closest sample to the given coordinate.
    ///
    /// Scans in dataset order keeping a running minimum under strict `<`,
    /// so the first point wins ties and results are deterministic for a
    /// given file. Coordinate range validation is the caller's job.
    pub fn nearest(&self, lat: f64, lon: f64) -> QueryResult<NearestMatch> {
        let dataset = self.snapshot()?;
        let center = Point::new(lon, lat);

        let mut best: Option<(&SamplePoint, f64)> = None;
        for point in &dataset.points {
            let distance = haversine_km(&center, &point.position());
            if best.as_ref().is_none_or(|(_, min)| distance < *min) {
                best = Some((point, distance));
            }
        }

        // Dataset::new rejects empty collections, so this only trips on a
        // store handed an empty snapshot through some future code path.
        let Some((point, distance)) = best else {
            return Err(QueryFailure::new(
                FailureKind::NoData,
                "No sample data found for this location.",
            ));
        };

        Ok(NearestMatch {
            success: true,
            coordinates: Coordinates {
                latitude: point.latitude,
                longitude: point.longitude,
            },
            aqi: point.aqi,
            category: point.category.clone(),
            color: point.color.clone(),
            source: DATA_SOURCE,
            distance_km: round_km(distance),
            timestamp: dataset.timestamp.clone(),
        })
    }

    /// All samples within `radius_km` of the coordinate, plus aggregate
    /// statistics, with default post-processing (scan order, capped at 50).
    pub fn area(&self, lat: f64, lon: f64, radius_km: f64) -> QueryResult<AreaReport> {
        self.area_filtered(lat, lon, radius_km, &AreaOptions::default())
    }

    /// Area query with attribute filters, sorting, and a caller-chosen cap.
    ///
    /// The radius filter is inclusive (`distance <= radius_km`). Summary
    /// statistics (`avg_aqi`, `min_aqi`, `max_aqi`, `category`) always
    /// describe the full radius-qualifying set; attribute filters, sorting,
    /// and the cap are applied to that set afterwards, so `total_points`
    /// counts every point the filters kept, not just the displayed ones.
    pub fn area_filtered(
        &self,
        lat: f64,
        lon: f64,
        radius_km: f64,
        opts: &AreaOptions,
    ) -> QueryResult<AreaReport> {
        let dataset = self.snapshot()?;
        let center = Point::new(lon, lat);

        let mut qualifying = Vec::new();
        for point in &dataset.points {
            let distance = haversine_km(&center, &point.position());
            if distance <= radius_km {
                qualifying.push(AreaPoint {
                    coordinates: Coordinates {
                        latitude: point.latitude,
                        longitude: point.longitude,
                    },
                    aqi: point.aqi,
                    category: point.category.clone(),
                    color: point.color.clone(),
                    distance_km: round_km(distance),
                });
            }
        }

        if qualifying.is_empty() {
            return Err(QueryFailure::new(
                FailureKind::NoPointsInRadius,
                format!(
                    "No sample data found within {}km of this location. Try a larger radius.",
                    radius_km
                ),
            ));
        }

        // Statistics over the full radius-qualifying set, before any
        // attribute filter narrows it.
        let sum: i64 = qualifying.iter().map(|p| p.aqi).sum();
        let avg_aqi = (sum as f64 / qualifying.len() as f64).round() as i64;
        let min_aqi = qualifying.iter().map(|p| p.aqi).min().unwrap_or(0);
        let max_aqi = qualifying.iter().map(|p| p.aqi).max().unwrap_or(0);

        let qualifying_count = qualifying.len();
        let mut filtered: Vec<AreaPoint> = qualifying
            .into_iter()
            .filter(|p| opts.min_aqi.is_none_or(|min| p.aqi >= min))
            .filter(|p| opts.max_aqi.is_none_or(|max| p.aqi <= max))
            .filter(|p| {
                opts.category
                    .as_deref()
                    .is_none_or(|category| p.category == category)
            })
            .collect();
        let was_filtered = filtered.len() != qualifying_count;

        match opts.sort_by {
            SortBy::ScanOrder => {}
            SortBy::Aqi => filtered.sort_by_key(|p| p.aqi),
            SortBy::Distance => filtered.sort_by(|a, b| {
                a.distance_km
                    .partial_cmp(&b.distance_km)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
        }
        if opts.sort_by != SortBy::ScanOrder && opts.order == SortOrder::Desc {
            filtered.reverse();
        }

        let total_points = filtered.len();
        filtered.truncate(opts.effective_limit());

        Ok(AreaReport {
            success: true,
            area_summary: AreaSummary {
                center_coordinates: Coordinates {
                    latitude: lat,
                    longitude: lon,
                },
                radius_km,
                total_points,
                displayed_points: filtered.len(),
                filtered: was_filtered,
                avg_aqi,
                min_aqi,
                max_aqi,
                category: AqiCategory::from_aqi(avg_aqi),
            },
            data_points: filtered,
            source: DATA_SOURCE,
            timestamp: dataset.timestamp.clone(),
        })
    }

    fn snapshot(&self) -> QueryResult<Arc<Dataset>> {
        self.store
            .snapshot()
            .map_err(|e| QueryFailure::unavailable(&e))
    }
}

impl std::fmt::Debug for TempoGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TempoGrid").field("store", &self.store).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    fn sample(lat: f64, lon: f64, aqi: i64) -> SamplePoint {
        SamplePoint {
            latitude: lat,
            longitude: lon,
            aqi,
            category: AqiCategory::from_aqi(aqi).name().into(),
            color: AqiCategory::from_aqi(aqi).default_color().into(),
        }
    }

    fn two_point_grid() -> TempoGrid {
        let dataset = Dataset::new(
            vec![sample(40.0, -74.0, 40), sample(41.0, -75.0, 160)],
            Some("2025-10-05T12:00:28Z".into()),
        )
        .unwrap();
        TempoGrid::from_dataset(dataset)
    }

    #[test]
    fn test_nearest_exact_hit() {
        let grid = two_point_grid();
        let reply = grid.nearest(40.0, -74.0).unwrap();

        assert!(reply.success);
        assert_eq!(reply.coordinates.latitude, 40.0);
        assert_eq!(reply.coordinates.longitude, -74.0);
        assert_eq!(reply.aqi, 40);
        assert_eq!(reply.category, "Good");
        assert_eq!(reply.distance_km, 0.0);
        assert_eq!(reply.timestamp.as_deref(), Some("2025-10-05T12:00:28Z"));
    }

    #[test]
    fn test_nearest_single_point_always_wins() {
        let dataset = Dataset::new(vec![sample(40.0, -74.0, 40)], None).unwrap();
        let grid = TempoGrid::from_dataset(dataset);

        let reply = grid.nearest(-33.0, 151.0).unwrap();
        assert_eq!(reply.coordinates.latitude, 40.0);

        let expected = haversine_km(&Point::new(151.0, -33.0), &Point::new(-74.0, 40.0));
        assert_eq!(reply.distance_km, round_km(expected));
    }

    #[test]
    fn test_nearest_tie_prefers_first_point() {
        // Two points equidistant from the origin; the scan must keep the
        // first under strict less-than.
        let dataset = Dataset::new(
            vec![sample(1.0, 0.0, 40), sample(-1.0, 0.0, 160)],
            None,
        )
        .unwrap();
        let grid = TempoGrid::from_dataset(dataset);

        let reply = grid.nearest(0.0, 0.0).unwrap();
        assert_eq!(reply.coordinates.latitude, 1.0);
        assert_eq!(reply.aqi, 40);
    }

    #[test]
    fn test_area_two_points_qualify() {
        let grid = two_point_grid();
        let reply = grid.area(40.5, -74.5, 200.0).unwrap();

        let summary = &reply.area_summary;
        assert_eq!(summary.total_points, 2);
        assert_eq!(summary.displayed_points, 2);
        assert_eq!(summary.avg_aqi, 100);
        assert_eq!(summary.min_aqi, 40);
        assert_eq!(summary.max_aqi, 160);
        assert_eq!(summary.category, AqiCategory::Moderate);
        assert!(!summary.filtered);
        assert_eq!(reply.data_points.len(), 2);

        // Both distances are ~70km from the midpoint, well under 200km.
        for point in &reply.data_points {
            assert!(point.distance_km <= 200.0);
        }
    }

    #[test]
    fn test_area_empty_radius_is_no_points_failure() {
        let grid = two_point_grid();
        let failure = grid.area(0.0, 0.0, 10.0).unwrap_err();

        assert_eq!(failure.kind, FailureKind::NoPointsInRadius);
        assert!(failure.message.contains("10km"));
    }

    #[test]
    fn test_area_radius_boundary_is_inclusive() {
        let center_lat = 0.0;
        let center_lon = 0.0;
        let point = sample(0.0, 1.0, 40);
        let exact =
            haversine_km(&Point::new(center_lon, center_lat), &point.position());

        let dataset = Dataset::new(vec![point], None).unwrap();
        let grid = TempoGrid::from_dataset(dataset);

        assert!(grid.area(center_lat, center_lon, exact).is_ok());
        assert!(grid.area(center_lat, center_lon, exact - 0.01).is_err());
    }

    #[test]
    fn test_area_preserves_scan_order() {
        let dataset = Dataset::new(
            vec![
                sample(40.2, -74.0, 90), // further from center
                sample(40.0, -74.0, 40), // center itself
                sample(40.1, -74.0, 60),
            ],
            None,
        )
        .unwrap();
        let grid = TempoGrid::from_dataset(dataset);

        let reply = grid.area(40.0, -74.0, 100.0).unwrap();
        let aqis: Vec<i64> = reply.data_points.iter().map(|p| p.aqi).collect();
        assert_eq!(aqis, vec![90, 40, 60]);
    }

    #[test]
    fn test_area_caps_at_fifty_but_counts_all() {
        // 60 points in a tight cluster around the center.
        let points: Vec<SamplePoint> = (0..60)
            .map(|i| sample(40.0 + i as f64 * 0.001, -74.0, 50 + i))
            .collect();
        let dataset = Dataset::new(points, None).unwrap();
        let grid = TempoGrid::from_dataset(dataset);

        let reply = grid.area(40.0, -74.0, 50.0).unwrap();
        assert_eq!(reply.area_summary.total_points, 60);
        assert_eq!(reply.area_summary.displayed_points, 50);
        assert_eq!(reply.data_points.len(), 50);

        // First 50 in scan order.
        assert_eq!(reply.data_points[0].aqi, 50);
        assert_eq!(reply.data_points[49].aqi, 99);
    }

    #[test]
    fn test_area_filtered_sorts_before_truncating() {
        // Scan order puts the highest AQI last; a descending AQI sort with
        // a small limit must still surface it.
        let points: Vec<SamplePoint> = (0..10)
            .map(|i| sample(40.0 + i as f64 * 0.001, -74.0, 50 + i))
            .collect();
        let dataset = Dataset::new(points, None).unwrap();
        let grid = TempoGrid::from_dataset(dataset);

        let opts = AreaOptions::default()
            .with_sort(SortBy::Aqi, SortOrder::Desc)
            .with_limit(3);
        let reply = grid.area_filtered(40.0, -74.0, 50.0, &opts).unwrap();

        let aqis: Vec<i64> = reply.data_points.iter().map(|p| p.aqi).collect();
        assert_eq!(aqis, vec![59, 58, 57]);
        assert_eq!(reply.area_summary.total_points, 10);
        assert_eq!(reply.area_summary.displayed_points, 3);
    }

    #[test]
    fn test_area_filtered_sort_by_distance() {
        let dataset = Dataset::new(
            vec![
                sample(40.2, -74.0, 90),
                sample(40.0, -74.0, 40),
                sample(40.1, -74.0, 60),
            ],
            None,
        )
        .unwrap();
        let grid = TempoGrid::from_dataset(dataset);

        let opts = AreaOptions::default().with_sort(SortBy::Distance, SortOrder::Asc);
        let reply = grid.area_filtered(40.0, -74.0, 100.0, &opts).unwrap();

        let aqis: Vec<i64> = reply.data_points.iter().map(|p| p.aqi).collect();
        assert_eq!(aqis, vec![40, 60, 90]);
    }

    #[test]
    fn test_area_filtered_attribute_filters() {
        let grid = two_point_grid();

        let opts = AreaOptions::default().with_min_aqi(100);
        let reply = grid.area_filtered(40.5, -74.5, 200.0, &opts).unwrap();

        assert_eq!(reply.area_summary.total_points, 1);
        assert!(reply.area_summary.filtered);
        assert_eq!(reply.data_points[0].aqi, 160);
        // Statistics still describe the whole radius-qualifying set.
        assert_eq!(reply.area_summary.avg_aqi, 100);
        assert_eq!(reply.area_summary.min_aqi, 40);
    }

    #[test]
    fn test_area_filtered_category_filter() {
        let grid = two_point_grid();

        let opts = AreaOptions::default().with_category("Unhealthy");
        let reply = grid.area_filtered(40.5, -74.5, 200.0, &opts).unwrap();

        assert_eq!(reply.area_summary.total_points, 1);
        assert_eq!(reply.data_points[0].category, "Unhealthy");
    }

    #[test]
    fn test_area_filtered_limit_clamped_to_hundred() {
        let points: Vec<SamplePoint> = (0..150)
            .map(|i| sample(40.0 + i as f64 * 0.0001, -74.0, 50))
            .collect();
        let dataset = Dataset::new(points, None).unwrap();
        let grid = TempoGrid::from_dataset(dataset);

        let opts = AreaOptions::default().with_limit(10_000);
        let reply = grid.area_filtered(40.0, -74.0, 50.0, &opts).unwrap();

        assert_eq!(reply.area_summary.total_points, 150);
        assert_eq!(reply.data_points.len(), 100);
    }

    #[test]
    fn test_queries_fail_softly_when_storage_missing() {
        let grid = TempoGrid::with_store(DatasetStore::file("/nope/missing.geojson"));

        let nearest = grid.nearest(40.0, -74.0).unwrap_err();
        assert_eq!(nearest.kind, FailureKind::DataUnavailable);
        assert!(nearest.error.is_some());

        let area = grid.area(40.0, -74.0, 25.0).unwrap_err();
        assert_eq!(area.kind, FailureKind::DataUnavailable);
    }

    #[test]
    fn test_repeated_queries_are_deterministic() {
        let grid = two_point_grid();

        let a = grid.area(40.5, -74.5, 200.0).unwrap();
        let b = grid.area(40.5, -74.5, 200.0).unwrap();
        assert_eq!(a, b);

        let n1 = grid.nearest(40.9, -74.9).unwrap();
        let n2 = grid.nearest(40.9, -74.9).unwrap();
        assert_eq!(n1, n2);
    }

    #[test]
    fn test_avg_rounds_half_up() {
        // (40 + 45) / 2 = 42.5 -> 43
        let dataset = Dataset::new(
            vec![sample(40.0, -74.0, 40), sample(40.001, -74.0, 45)],
            None,
        )
        .unwrap();
        let grid = TempoGrid::from_dataset(dataset);

        let reply = grid.area(40.0, -74.0, 10.0).unwrap();
        assert_eq!(reply.area_summary.avg_aqi, 43);
    }
}
