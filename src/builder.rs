//! Builder for flexible grid construction.

use crate::dataset::Dataset;
use crate::error::{GridError, Result};
use crate::grid::TempoGrid;
use crate::store::DatasetStore;
use std::path::PathBuf;

/// Builder for [`TempoGrid`] with a choice of data source and load timing.
///
/// # Examples
///
/// ```rust,no_run
/// use tempo_grid::TempoGrid;
///
/// // Lazy: first query pays for the load.
/// let grid = TempoGrid::builder()
///     .data_path("data/skyaware_aqi.geojson")
///     .build()?;
///
/// // Eager: build() fails fast on a bad file.
/// let grid = TempoGrid::builder()
///     .data_path("data/skyaware_aqi.geojson")
///     .eager()
///     .build()?;
/// # Ok::<(), tempo_grid::GridError>(())
/// ```
#[derive(Debug, Default)]
pub struct GridBuilder {
    data_path: Option<PathBuf>,
    dataset: Option<Dataset>,
    eager: bool,
}

impl GridBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Back the grid with a GeoJSON file.
    pub fn data_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_path = Some(path.into());
        self
    }

    /// Back the grid with an in-memory dataset; takes precedence over
    /// `data_path`.
    pub fn dataset(mut self, dataset: Dataset) -> Self {
        self.dataset = Some(dataset);
        self
    }

    /// Load at build time instead of on first query.
    pub fn eager(mut self) -> Self {
        self.eager = true;
        self
    }

    /// Build the grid.
    ///
    /// # Errors
    ///
    /// - [`GridError::InvalidInput`] when neither a path nor a dataset was
    ///   configured.
    /// - Loader errors when `eager` is set and the file cannot be loaded.
    pub fn build(self) -> Result<TempoGrid> {
        let store = if let Some(dataset) = self.dataset {
            DatasetStore::fixed(dataset)
        } else if let Some(path) = self.data_path {
            DatasetStore::file(path)
        } else {
            return Err(GridError::InvalidInput(
                "no data source configured; set data_path() or dataset()".to_string(),
            ));
        };

        if self.eager {
            store.snapshot()?;
        }

        Ok(TempoGrid::with_store(store))
    }
}
