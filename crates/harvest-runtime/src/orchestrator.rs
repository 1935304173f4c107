//! Async refresh loop for the terminal dashboard.
//!
//! Runs the [`DataManager`] in a tokio task, aggregates every fetched
//! snapshot into a [`DashboardService`] and sends it through an `mpsc`
//! channel so the TUI event loop never blocks on I/O.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use harvest_core::models::{ColumnBindings, DateOrder};
use tokio::sync::mpsc;
use tokio::time;

use crate::dashboard::DashboardService;
use crate::data_manager::DataManager;

// ── Public types ──────────────────────────────────────────────────────────────

/// One refresh result forwarded to the TUI layer.
#[derive(Debug, Clone)]
pub struct DashboardUpdate {
    /// Aggregated view of the latest usable rows; `None` when no rows were
    /// ever loaded or they could not be aggregated.
    pub service: Option<Arc<DashboardService>>,
    /// Fetch or aggregation error from this refresh, if any.
    pub error: Option<String>,
    /// Number of raw rows behind `service`.
    pub rows: usize,
    pub refreshed_at: DateTime<Local>,
}

/// How rows are interpreted on every refresh.
#[derive(Debug, Clone, Default)]
pub struct AggregationConfig {
    pub bindings: ColumnBindings,
    pub order: DateOrder,
    pub sections: Vec<String>,
}

// ── DashboardOrchestrator ─────────────────────────────────────────────────────

/// Background refresh coordinator.
///
/// Call [`DashboardOrchestrator::start`] to spin up the loop in a tokio task
/// and receive a channel of [`DashboardUpdate`]s.
pub struct DashboardOrchestrator {
    refresh_interval: Duration,
    data_manager: DataManager,
    config: AggregationConfig,
}

impl DashboardOrchestrator {
    pub fn new(refresh_secs: u64, data_manager: DataManager, config: AggregationConfig) -> Self {
        Self {
            refresh_interval: Duration::from_secs(refresh_secs.max(1)),
            data_manager,
            config,
        }
    }

    /// Start the refresh loop.
    ///
    /// Returns the update receiver and a [`DashboardHandle`] used to request
    /// an immediate refresh or abort the loop.
    pub fn start(self) -> (mpsc::Receiver<DashboardUpdate>, DashboardHandle) {
        let (tx, rx) = mpsc::channel(16);
        let (refresh_tx, refresh_rx) = mpsc::channel(4);

        let handle = tokio::spawn(async move {
            self.refresh_loop(tx, refresh_rx).await;
        });

        (rx, DashboardHandle { handle, refresh_tx })
    }

    // ── Private implementation ────────────────────────────────────────────

    /// Fetch immediately, then on every tick or refresh request. Exits when
    /// the receiver side of the update channel is closed.
    async fn refresh_loop(
        mut self,
        tx: mpsc::Sender<DashboardUpdate>,
        mut refresh_rx: mpsc::Receiver<()>,
    ) {
        self.fetch_and_send(&tx, true).await;

        let mut interval = time::interval(self.refresh_interval);
        // The first tick fires immediately; we already fetched above.
        interval.tick().await;

        loop {
            let force = tokio::select! {
                _ = interval.tick() => false,
                Some(()) = refresh_rx.recv() => true,
            };

            if tx.is_closed() {
                tracing::debug!("dashboard channel closed; exiting loop");
                break;
            }

            self.fetch_and_send(&tx, force).await;
        }
    }

    async fn fetch_and_send(&mut self, tx: &mpsc::Sender<DashboardUpdate>, force: bool) {
        let update = self.refresh(force);
        if let Err(e) = tx.send(update).await {
            tracing::warn!(error = %e, "failed to send dashboard update; receiver dropped");
        }
    }

    /// Fetch rows (cached unless `force`) and aggregate them.
    fn refresh(&mut self, force: bool) -> DashboardUpdate {
        let rows = self.data_manager.get_rows(force);
        let mut error = self.data_manager.last_error().map(str::to_string);

        let (service, row_count) = match rows {
            Some(rows) => match DashboardService::from_rows(
                &rows,
                &self.config.bindings,
                self.config.order,
                &self.config.sections,
            ) {
                Ok(service) => (Some(Arc::new(service)), rows.len()),
                Err(e) => {
                    tracing::warn!(error = %e, "could not aggregate sheet rows");
                    error = Some(e.to_string());
                    (None, rows.len())
                }
            },
            None => (None, 0),
        };

        DashboardUpdate {
            service,
            error,
            rows: row_count,
            refreshed_at: Local::now(),
        }
    }
}

// ── DashboardHandle ───────────────────────────────────────────────────────────

/// Handle to the background refresh task.
pub struct DashboardHandle {
    handle: tokio::task::JoinHandle<()>,
    refresh_tx: mpsc::Sender<()>,
}

impl DashboardHandle {
    /// Ask the loop to bypass the cache and refresh now. Requests made while
    /// one is already pending are dropped.
    pub fn request_refresh(&self) {
        if self.refresh_tx.try_send(()).is_err() {
            tracing::debug!("refresh already pending");
        }
    }

    /// Immediately abort the refresh loop.
    pub fn abort(&self) {
        self.handle.abort();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
