//! Embedded spatial query engine for satellite-derived air-quality grids.
//!
//! Loads a static GeoJSON collection of geotagged AQI samples once per
//! process and answers two query types over it: nearest-point lookup and
//! radius-bounded area aggregation with statistics.
//!
//! ```rust
//! use tempo_grid::{Dataset, SamplePoint, TempoGrid};
//!
//! let dataset = Dataset::new(
//!     vec![
//!         SamplePoint {
//!             latitude: 40.0,
//!             longitude: -74.0,
//!             aqi: 40,
//!             category: "Good".into(),
//!             color: "#00E400".into(),
//!         },
//!         SamplePoint {
//!             latitude: 41.0,
//!             longitude: -75.0,
//!             aqi: 160,
//!             category: "Unhealthy".into(),
//!             color: "#FF0000".into(),
//!         },
//!     ],
//!     None,
//! )?;
//!
//! let grid = TempoGrid::from_dataset(dataset);
//!
//! let nearest = grid.nearest(40.0, -74.0).unwrap();
//! assert_eq!(nearest.aqi, 40);
//!
//! let area = grid.area(40.5, -74.5, 200.0).unwrap();
//! assert_eq!(area.area_summary.avg_aqi, 100);
//! # Ok::<(), tempo_grid::GridError>(())
//! ```
//!
//! Queries never panic across the component boundary: expected failures
//! ("no points in radius", "data unavailable") come back as structured
//! [`QueryFailure`] values that callers branch on exhaustively.

pub mod builder;
pub mod category;
pub mod dataset;
pub mod error;
pub mod grid;
pub mod spatial;
pub mod store;
pub mod types;

pub use builder::GridBuilder;
pub use category::AqiCategory;
pub use dataset::{Dataset, SamplePoint};
pub use error::{FailureKind, GridError, QueryFailure, QueryResult, Result};
pub use grid::TempoGrid;
pub use store::DatasetStore;
pub use types::{
    AreaOptions, AreaPoint, AreaReport, AreaSummary, Coordinates, NearestMatch, SortBy, SortOrder,
    DATA_SOURCE, DEFAULT_AREA_LIMIT, DEFAULT_RADIUS_KM, MAX_AREA_LIMIT,
};

pub use spatial::{haversine_km, round_km, EARTH_RADIUS_KM};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Common imports
pub mod prelude {

    pub use crate::{GridBuilder, QueryResult, Result, TempoGrid};

    pub use crate::{AqiCategory, Dataset, SamplePoint};

    pub use crate::{AreaOptions, SortBy, SortOrder};

    pub use crate::spatial::{haversine_km, round_km};

    pub use crate::{FailureKind, GridError, QueryFailure};
}
