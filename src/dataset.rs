//! Dataset model and GeoJSON loader.
//!
//! The engine works over a static FeatureCollection of point features, each
//! carrying `aqi`, `category`, and `color` properties, with an optional
//! top-level `metadata.timestamp` foreign member recording collection time.
//! The parsed representation is immutable: queries receive shared read-only
//! views and nothing mutates a [`Dataset`] after load.

use crate::category::AqiCategory;
use crate::error::{GridError, Result};
use geo::Point;
use geojson::{FeatureCollection, GeoJson, Value};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One geotagged air-quality sample.
///
/// `category` and `color` are stored exactly as provided by the source data
/// and are never reconciled against `aqi`; they are only derived when the
/// source omits them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplePoint {
    pub latitude: f64,
    pub longitude: f64,
    pub aqi: i64,
    pub category: String,
    pub color: String,
}

impl SamplePoint {
    /// Position as a `geo` point (x = longitude, y = latitude).
    pub fn position(&self) -> Point {
        Point::new(self.longitude, self.latitude)
    }
}

/// An ordered, immutable collection of sample points plus collection-time
/// metadata. Iteration order is the source file's feature order; query
/// tie-breaking and truncation are defined against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub points: Vec<SamplePoint>,
    pub timestamp: Option<String>,
}

impl Dataset {
    /// Build a dataset directly from points, mainly for tests and embedding
    /// callers that source data elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::EmptyDataset`] when `points` is empty.
    pub fn new(points: Vec<SamplePoint>, timestamp: Option<String>) -> Result<Self> {
        if points.is_empty() {
            return Err(GridError::EmptyDataset);
        }
        Ok(Self { points, timestamp })
    }

    /// Number of sample points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Parse a GeoJSON FeatureCollection.
    ///
    /// Features without point geometry are skipped, as are features missing
    /// an integer `aqi` property. A missing `category` is derived from the
    /// AQI; a missing `color` falls back to the derived category's standard
    /// color.
    ///
    /// # Errors
    ///
    /// - [`GridError::InvalidGeoJson`] when the input is not a
    ///   FeatureCollection.
    /// - [`GridError::EmptyDataset`] when no usable point survives parsing.
    pub fn from_geojson_str(input: &str) -> Result<Self> {
        let geojson: GeoJson = input
            .parse()
            .map_err(|e| GridError::InvalidGeoJson(format!("failed to parse GeoJSON: {}", e)))?;

        let collection = match geojson {
            GeoJson::FeatureCollection(fc) => fc,
            other => {
                return Err(GridError::InvalidGeoJson(format!(
                    "expected a FeatureCollection, got {:?}",
                    other_kind(&other)
                )));
            }
        };

        let timestamp = collection_timestamp(&collection);

        let mut points = Vec::with_capacity(collection.features.len());
        let mut skipped = 0usize;

        for feature in &collection.features {
            let Some(geometry) = &feature.geometry else {
                skipped += 1;
                continue;
            };
            let Value::Point(coords) = &geometry.value else {
                skipped += 1;
                continue;
            };
            if coords.len() < 2 {
                skipped += 1;
                continue;
            }
            let (longitude, latitude) = (coords[0], coords[1]);

            let Some(aqi) = feature
                .properties
                .as_ref()
                .and_then(|p| p.get("aqi"))
                .and_then(|v| v.as_i64())
            else {
                skipped += 1;
                continue;
            };

            let category = feature
                .properties
                .as_ref()
                .and_then(|p| p.get("category"))
                .and_then(|v| v.as_str())
                .map(str::to_owned)
                .unwrap_or_else(|| AqiCategory::from_aqi(aqi).name().to_owned());

            let color = feature
                .properties
                .as_ref()
                .and_then(|p| p.get("color"))
                .and_then(|v| v.as_str())
                .map(str::to_owned)
                .unwrap_or_else(|| AqiCategory::from_aqi(aqi).default_color().to_owned());

            points.push(SamplePoint {
                latitude,
                longitude,
                aqi,
                category,
                color,
            });
        }

        if skipped > 0 {
            log::warn!(
                "skipped {} feature(s) without point geometry or aqi property",
                skipped
            );
        }

        Dataset::new(points, timestamp)
    }

    /// Read and parse a GeoJSON file.
    ///
    /// # Errors
    ///
    /// [`GridError::Io`] when the file is missing or unreadable, plus the
    /// parse errors of [`Dataset::from_geojson_str`].
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let dataset = Self::from_geojson_str(&contents)?;
        log::info!(
            "loaded {} sample points from {} (timestamp: {})",
            dataset.len(),
            path.as_ref().display(),
            dataset.timestamp.as_deref().unwrap_or("none"),
        );
        Ok(dataset)
    }
}

/// Collection time, read from the `metadata.timestamp` foreign member with
/// a plain top-level `timestamp` accepted as a fallback.
fn collection_timestamp(collection: &FeatureCollection) -> Option<String> {
    let members = collection.foreign_members.as_ref()?;

    members
        .get("metadata")
        .and_then(|m| m.get("timestamp"))
        .or_else(|| members.get("timestamp"))
        .and_then(|v| v.as_str())
        .map(str::to_owned)
}

fn other_kind(geojson: &GeoJson) -> &'static str {
    match geojson {
        GeoJson::Geometry(_) => "Geometry",
        GeoJson::Feature(_) => "Feature",
        GeoJson::FeatureCollection(_) => "FeatureCollection",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(lon: f64, lat: f64, aqi: i64) -> String {
        format!(
            r##"{{"type":"Feature","geometry":{{"type":"Point","coordinates":[{},{}]}},"properties":{{"aqi":{},"category":"{}","color":"#00E400"}}}}"##,
            lon,
            lat,
            aqi,
            AqiCategory::from_aqi(aqi).name()
        )
    }

    fn collection(features: &[String]) -> String {
        format!(
            r#"{{"type":"FeatureCollection","metadata":{{"timestamp":"2025-10-05T12:00:28Z"}},"features":[{}]}}"#,
            features.join(",")
        )
    }

    #[test]
    fn test_parse_feature_collection() {
        let input = collection(&[feature(-74.0, 40.0, 40), feature(-75.0, 41.0, 160)]);
        let dataset = Dataset::from_geojson_str(&input).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.points[0].longitude, -74.0);
        assert_eq!(dataset.points[0].latitude, 40.0);
        assert_eq!(dataset.points[0].aqi, 40);
        assert_eq!(dataset.points[0].category, "Good");
        assert_eq!(
            dataset.timestamp.as_deref(),
            Some("2025-10-05T12:00:28Z")
        );
    }

    #[test]
    fn test_category_and_color_taken_as_provided() {
        // Source disagrees with the AQI on purpose; the loader must not
        // reconcile.
        let input = r##"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[-74.0,40.0]},
             "properties":{"aqi":40,"category":"Hazardous","color":"#123456"}}
        ]}"##;
        let dataset = Dataset::from_geojson_str(input).unwrap();

        assert_eq!(dataset.points[0].category, "Hazardous");
        assert_eq!(dataset.points[0].color, "#123456");
    }

    #[test]
    fn test_missing_category_and_color_derived_from_aqi() {
        let input = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[-74.0,40.0]},
             "properties":{"aqi":120}}
        ]}"#;
        let dataset = Dataset::from_geojson_str(input).unwrap();

        assert_eq!(dataset.points[0].category, "Unhealthy for Sensitive Groups");
        assert_eq!(dataset.points[0].color, "#FF7E00");
    }

    #[test]
    fn test_features_without_point_geometry_are_skipped() {
        let input = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":null,"properties":{"aqi":40}},
            {"type":"Feature","geometry":{"type":"LineString","coordinates":[[0,0],[1,1]]},"properties":{"aqi":40}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[-74.0,40.0]},"properties":{"aqi":40}}
        ]}"#;
        let dataset = Dataset::from_geojson_str(input).unwrap();

        assert_eq!(dataset.len(), 1);
    }

    #[test]
    fn test_features_without_aqi_are_skipped() {
        let input = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[-74.0,40.0]},"properties":{"category":"Good"}},
            {"type":"Feature","geometry":{"type":"Point","coordinates":[-75.0,41.0]},"properties":{"aqi":55}}
        ]}"#;
        let dataset = Dataset::from_geojson_str(input).unwrap();

        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.points[0].aqi, 55);
    }

    #[test]
    fn test_empty_collection_is_an_error() {
        let input = r#"{"type":"FeatureCollection","features":[]}"#;
        assert!(matches!(
            Dataset::from_geojson_str(input),
            Err(GridError::EmptyDataset)
        ));
    }

    #[test]
    fn test_not_a_feature_collection() {
        let input = r#"{"type":"Point","coordinates":[-74.0,40.0]}"#;
        assert!(matches!(
            Dataset::from_geojson_str(input),
            Err(GridError::InvalidGeoJson(_))
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            Dataset::from_geojson_str("not geojson at all"),
            Err(GridError::InvalidGeoJson(_))
        ));
    }

    #[test]
    fn test_top_level_timestamp_fallback() {
        let input = r#"{"type":"FeatureCollection","timestamp":"2025-10-03T09:10:00Z","features":[
            {"type":"Feature","geometry":{"type":"Point","coordinates":[-74.0,40.0]},"properties":{"aqi":40}}
        ]}"#;
        let dataset = Dataset::from_geojson_str(input).unwrap();
        assert_eq!(dataset.timestamp.as_deref(), Some("2025-10-03T09:10:00Z"));
    }

    #[test]
    fn test_new_rejects_empty() {
        assert!(matches!(
            Dataset::new(Vec::new(), None),
            Err(GridError::EmptyDataset)
        ));
    }

    #[test]
    fn test_position_uses_lon_lat_order() {
        let point = SamplePoint {
            latitude: 40.0,
            longitude: -74.0,
            aqi: 40,
            category: "Good".into(),
            color: "#00E400".into(),
        };
        let pos = point.position();
        assert_eq!(pos.x(), -74.0);
        assert_eq!(pos.y(), 40.0);
    }
}
