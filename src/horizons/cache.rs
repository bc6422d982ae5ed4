//! On-disk cache for ephemeris rows
//!
//! Each query is stored as a JSON array of rows under the cache directory,
//! keyed by body, window and step. Files are written to a temporary name and
//! renamed so an interrupted run never leaves a truncated entry behind.

use std::env;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use super::{EphemerisQuery, EphemerisSource, VectorRow};
use crate::Result;

/// Get the cache directory path
pub fn get_cache_dir() -> PathBuf {
    let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(".cache").join("orrery")
}

/// Check if a file exists and is not empty
fn file_exists_and_not_empty<P: AsRef<Path>>(path: P) -> bool {
    match fs::metadata(path) {
        Ok(metadata) => metadata.is_file() && metadata.len() > 0,
        Err(_) => false,
    }
}

/// Wraps a source and remembers its answers on disk
#[derive(Debug, Clone)]
pub struct CachedSource<S> {
    inner: S,
    dir: PathBuf,
}

impl<S: EphemerisSource> CachedSource<S> {
    /// Cache under `$HOME/.cache/orrery`
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            dir: get_cache_dir(),
        }
    }

    /// Set a custom cache directory
    pub fn with_cache_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.dir = path.as_ref().to_path_buf();
        self
    }

    pub fn cache_dir(&self) -> &Path {
        &self.dir
    }

    /// File holding the rows for `query`
    pub fn cache_path(&self, query: &EphemerisQuery) -> PathBuf {
        self.dir.join(format!(
            "{}_{}_{}_{}d.json",
            query.body.id(),
            query.start.format("%Y-%m-%d"),
            query.stop.format("%Y-%m-%d"),
            query.step_days
        ))
    }

    fn load(&self, path: &Path) -> Option<Vec<VectorRow>> {
        if !file_exists_and_not_empty(path) {
            return None;
        }

        let parsed: std::result::Result<Vec<VectorRow>, String> = fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|text| serde_json::from_str(&text).map_err(|e| e.to_string()));

        match parsed {
            Ok(rows) => Some(rows),
            Err(e) => {
                warn!("Ignoring unreadable cache file {}: {}", path.display(), e);
                None
            }
        }
    }

    fn store(&self, path: &Path, rows: &[VectorRow]) -> Result<()> {
        fs::create_dir_all(&self.dir)?;

        let temp_path = path.with_extension("tmp");
        let mut file = BufWriter::new(File::create(&temp_path)?);
        serde_json::to_writer(&mut file, rows)?;
        file.flush()?;
        drop(file);

        fs::rename(temp_path, path)?;
        Ok(())
    }
}

impl<S: EphemerisSource> EphemerisSource for CachedSource<S> {
    fn vectors(&self, query: &EphemerisQuery) -> Result<Vec<VectorRow>> {
        let path = self.cache_path(query);

        if let Some(rows) = self.load(&path) {
            info!("Using cached {} vectors from {}", query.body, path.display());
            return Ok(rows);
        }

        let rows = self.inner.vectors(query)?;
        match self.store(&path, &rows) {
            Ok(()) => debug!("Cached {} rows at {}", rows.len(), path.display()),
            Err(e) => warn!(
                "Could not cache {} vectors at {}: {}",
                query.body,
                path.display(),
                e
            ),
        }
        Ok(rows)
    }
}
