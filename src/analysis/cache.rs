//! File-backed cache of column analyses.
//!
//! One JSON file per `(table, source basename)` pair lives in the cache
//! directory. An entry is fresh while its own modification time is not older
//! than the source file's; anything else (missing, stale, unreadable, malformed)
//! is a miss and triggers exactly one re-analysis followed by an overwrite.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::{AnalysisResult, ColumnAnalyzer};
use crate::error::{QueryError, Result};

/// Cache file name for `table` analysed from `source`: `<table>@<basename>.json`,
/// with path separators in the table name replaced by `_`.
pub fn cache_file_name(table: &str, source: &Path) -> String {
    let safe_table = table.replace(['/', '\\'], "_");
    let basename = source
        .file_name()
        .map_or_else(|| "source".into(), |n| n.to_string_lossy());
    format!("{safe_table}@{basename}.json")
}

/// Read-through, write-through cache around another [`ColumnAnalyzer`].
#[derive(Debug)]
pub struct AnalysisCache<A> {
    inner: A,
    source: PathBuf,
    cache_dir: PathBuf,
}

impl<A: ColumnAnalyzer> AnalysisCache<A> {
    /// Wrap `inner`, caching results for data read from `source`.
    ///
    /// # Errors
    ///
    /// `CacheIo` if the cache directory cannot be created. A cache that can never
    /// be written is a misconfiguration, so it fails here rather than degrading
    /// quietly to uncached operation.
    pub fn new(inner: A, source: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir).map_err(|e| QueryError::cache_io(&cache_dir, e))?;

        Ok(Self {
            inner,
            source: source.into(),
            cache_dir,
        })
    }

    pub fn inner(&self) -> &A {
        &self.inner
    }

    pub fn entry_path(&self, table: &str) -> PathBuf {
        self.cache_dir.join(cache_file_name(table, &self.source))
    }

    /// The cached analysis for `table`, if present, fresh and intact.
    pub fn lookup(&self, table: &str) -> Option<AnalysisResult> {
        let path = self.entry_path(table);

        match self.is_fresh(&path) {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!("Analysis cache entry {} is stale", path.display());
                return None;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("Cannot stat analysis cache entry {}: {e}", path.display());
                return None;
            }
        }

        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) => {
                tracing::warn!("Failed to read analysis cache {}: {e}", path.display());
                return None;
            }
        };

        match serde_json::from_str::<AnalysisResult>(&contents) {
            Ok(result) if result.is_well_formed() => Some(result),
            Ok(_) => {
                tracing::warn!("Ignoring malformed analysis cache {}", path.display());
                None
            }
            Err(e) => {
                tracing::warn!("Ignoring corrupt analysis cache {}: {e}", path.display());
                None
            }
        }
    }

    /// When the entry for `table` was last written, if it exists.
    pub fn written_at(&self, table: &str) -> Option<SystemTime> {
        fs::metadata(self.entry_path(table))
            .and_then(|m| m.modified())
            .ok()
    }

    /// Entry mtime ≥ source mtime. A source that cannot be stat'ed counts as
    /// changed.
    fn is_fresh(&self, entry: &Path) -> io::Result<bool> {
        let entry_mtime = fs::metadata(entry)?.modified()?;
        let source_mtime = match fs::metadata(&self.source).and_then(|m| m.modified()) {
            Ok(t) => t,
            Err(e) => {
                tracing::debug!("Cannot stat source {}: {e}", self.source.display());
                return Ok(false);
            }
        };
        Ok(entry_mtime >= source_mtime)
    }

    /// Write the full result, replacing any previous entry. The data goes to a
    /// sibling temp file first so readers never see a half-written entry.
    fn store(&self, table: &str, result: &AnalysisResult) -> Result<PathBuf> {
        let path = self.entry_path(table);
        let tmp = path.with_extension("json.tmp");

        let json = serde_json::to_string_pretty(result)?;
        fs::write(&tmp, json).map_err(|e| QueryError::cache_io(&tmp, e))?;
        if let Err(e) = fs::rename(&tmp, &path) {
            if let Err(cleanup) = fs::remove_file(&tmp) {
                tracing::warn!("Failed to remove {}: {cleanup}", tmp.display());
            }
            return Err(QueryError::cache_io(&path, e));
        }
        Ok(path)
    }
}

impl<A: ColumnAnalyzer> ColumnAnalyzer for AnalysisCache<A> {
    async fn analyze(&self, table: &str) -> Result<AnalysisResult> {
        if let Some(cached) = self.lookup(table) {
            tracing::debug!(table, "Analysis cache hit");
            return Ok(cached);
        }

        let fresh = self.inner.analyze(table).await?;

        match self.store(table, &fresh) {
            Ok(path) => tracing::info!("Cached analysis of '{table}' at {}", path.display()),
            Err(e) => tracing::error!("Failed to write analysis cache for '{table}': {e}"),
        }
        Ok(fresh)
    }
}
