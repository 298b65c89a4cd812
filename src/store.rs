//! Cached dataset loading.
//!
//! The source file is static and rarely updated, so it is read at most once
//! per process and held behind a process-wide cache with no TTL. The cache
//! is an explicit service object owned by the engine rather than ambient
//! global state, which keeps test isolation a matter of constructing a
//! store around an in-memory dataset.

use crate::dataset::Dataset;
use crate::error::Result;
use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;

enum Source {
    /// Read from a GeoJSON file, lazily on first use.
    File(PathBuf),
    /// Pre-built dataset, always warm. Used for dependency substitution.
    Fixed(Arc<Dataset>),
}

/// Owns the in-memory dataset and its load lifecycle.
///
/// Cold until the first successful load, warm afterwards. `reload` and
/// `invalidate` are the only cache controls; there is no TTL. Concurrent
/// first access is safe: the load runs under the write lock and later
/// arrivals reuse the populated cache.
pub struct DatasetStore {
    source: Source,
    cache: RwLock<Option<Arc<Dataset>>>,
}

impl DatasetStore {
    /// Store backed by a GeoJSON file. No I/O happens until the first
    /// [`snapshot`](Self::snapshot) or an explicit [`reload`](Self::reload).
    pub fn file<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            source: Source::File(path.into()),
            cache: RwLock::new(None),
        }
    }

    /// Store wrapping an already-built dataset.
    pub fn fixed(dataset: Dataset) -> Self {
        let dataset = Arc::new(dataset);
        Self {
            cache: RwLock::new(Some(dataset.clone())),
            source: Source::Fixed(dataset),
        }
    }

    /// Whether the cache is populated.
    pub fn is_warm(&self) -> bool {
        self.cache.read().is_some()
    }

    /// A shared view of the dataset, loading it on first use.
    ///
    /// # Errors
    ///
    /// Propagates loader errors ([`crate::GridError`]) when the backing file
    /// is missing, unreadable, unparseable, or empty. A failed load leaves
    /// the store cold, so a later call retries.
    pub fn snapshot(&self) -> Result<Arc<Dataset>> {
        if let Some(dataset) = self.cache.read().as_ref() {
            return Ok(dataset.clone());
        }

        let mut cache = self.cache.write();
        // Another thread may have loaded while we waited on the lock.
        if let Some(dataset) = cache.as_ref() {
            return Ok(dataset.clone());
        }

        let dataset = Arc::new(self.load()?);
        *cache = Some(dataset.clone());
        Ok(dataset)
    }

    /// Re-read the source and replace the cache.
    ///
    /// For a fixed store this re-installs the original dataset.
    pub fn reload(&self) -> Result<Arc<Dataset>> {
        let dataset = Arc::new(self.load()?);
        *self.cache.write() = Some(dataset.clone());
        log::info!("dataset reloaded ({} points)", dataset.len());
        Ok(dataset)
    }

    /// Drop the cache; the next query loads cold.
    pub fn invalidate(&self) {
        *self.cache.write() = None;
    }

    fn load(&self) -> Result<Dataset> {
        match &self.source {
            Source::File(path) => Dataset::from_file(path),
            Source::Fixed(dataset) => Ok(dataset.as_ref().clone()),
        }
    }
}

impl std::fmt::Debug for DatasetStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let source = match &self.source {
            Source::File(path) => format!("file:{}", path.display()),
            Source::Fixed(_) => "fixed".to_string(),
        };
        f.debug_struct("DatasetStore")
            .field("source", &source)
            .field("warm", &self.is_warm())
            .finish()
    }
}
