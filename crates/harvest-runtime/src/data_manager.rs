//! TTL-cached access to the harvest sheet.
//!
//! Wraps a [`RecordSource`] with a configurable time-to-live cache and retry
//! logic. Callers use [`DataManager::get_rows`] to obtain a fresh-or-cached
//! snapshot of the raw rows; on fetch failure the previous snapshot is served
//! and the error is recorded.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use harvest_core::models::SheetRow;
use harvest_data::reader::{RecordSource, SourceMeta};

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Maximum number of fetch attempts before falling back to stale rows.
const MAX_RETRY_ATTEMPTS: u32 = 3;

// ── DataManager ───────────────────────────────────────────────────────────────

/// TTL-cached wrapper around a [`RecordSource`].
///
/// # Example
/// ```no_run
/// use std::path::Path;
/// use harvest_runtime::data_manager::DataManager;
/// use harvest_data::reader::open_source;
///
/// let source = open_source(Path::new("panen.csv"), "auto").unwrap();
/// let mut mgr = DataManager::new(source, 30);
/// if let Some(rows) = mgr.get_rows(false) {
///     println!("rows: {}", rows.len());
/// }
/// ```
pub struct DataManager {
    source: Box<dyn RecordSource>,
    /// Maximum age of cached rows before they are considered stale.
    cache_ttl: Duration,
    /// Most recently fetched rows.
    cache: Option<Arc<Vec<SheetRow>>>,
    /// When the cache was last populated.
    cache_timestamp: Option<Instant>,
    /// Description of the last error encountered.
    last_error: Option<String>,
    /// When the last successful fetch completed.
    last_successful_fetch: Option<Instant>,
}

impl DataManager {
    pub fn new(source: Box<dyn RecordSource>, cache_ttl_secs: u64) -> Self {
        Self {
            source,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
            cache: None,
            cache_timestamp: None,
            last_error: None,
            last_successful_fetch: None,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return the sheet rows, using the cache while it is still valid.
    ///
    /// `force_refresh` bypasses the cache. On fetch failure the previous
    /// rows (if any) are returned even when stale; `None` means nothing has
    /// ever been fetched successfully.
    ///
    /// The fetch is retried up to [`MAX_RETRY_ATTEMPTS`] times with back-off
    /// (0 ms → 100 ms → 200 ms).
    pub fn get_rows(&mut self, force_refresh: bool) -> Option<Arc<Vec<SheetRow>>> {
        if !force_refresh && self.is_cache_valid() {
            tracing::debug!("returning cached sheet rows");
            return self.cache.clone();
        }

        match self.fetch_with_retry() {
            Ok(rows) => {
                tracing::debug!(rows = rows.len(), "sheet cache updated");
                let now = Instant::now();
                self.cache = Some(Arc::new(rows));
                self.cache_timestamp = Some(now);
                self.last_successful_fetch = Some(now);
                self.last_error = None;
                self.cache.clone()
            }
            Err(e) => {
                tracing::warn!(error = %e, "fetch failed; falling back to cached rows");
                self.last_error = Some(e);
                self.cache.clone()
            }
        }
    }

    /// Discard the current cache, forcing the next [`get_rows`](Self::get_rows)
    /// call to fetch.
    pub fn invalidate_cache(&mut self) {
        self.cache = None;
        self.cache_timestamp = None;
        tracing::debug!("cache invalidated");
    }

    /// Age of the current cache entry, or `None` if nothing is cached.
    pub fn cache_age(&self) -> Option<Duration> {
        self.cache_timestamp.map(|ts| ts.elapsed())
    }

    /// Time since the last successful fetch.
    pub fn since_last_success(&self) -> Option<Duration> {
        self.last_successful_fetch.map(|ts| ts.elapsed())
    }

    /// Description of the last fetch error, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Describe the underlying source, bypassing the cache.
    pub fn describe_source(&self) -> harvest_core::Result<SourceMeta> {
        self.source.describe()
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn is_cache_valid(&self) -> bool {
        match (self.cache.as_ref(), self.cache_timestamp) {
            (Some(_), Some(ts)) => ts.elapsed() < self.cache_ttl,
            _ => false,
        }
    }

    fn fetch_with_retry(&self) -> Result<Vec<SheetRow>, String> {
        let mut last_err = String::new();

        for attempt in 0..MAX_RETRY_ATTEMPTS {
            if attempt > 0 {
                let sleep_ms = (attempt as u64) * 100;
                tracing::debug!(attempt, sleep_ms, "retrying fetch after back-off");
                thread::sleep(Duration::from_millis(sleep_ms));
            }

            match self.source.fetch_rows() {
                Ok(rows) => return Ok(rows),
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "fetch attempt failed");
                    last_err = e.to_string();
                }
            }
        }

        Err(last_err)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
