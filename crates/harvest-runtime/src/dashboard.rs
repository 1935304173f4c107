//! Dashboard payloads built on top of an [`Aggregator`].
//!
//! These are the shapes the terminal dashboard and the JSON views consume:
//! the day snapshot, per-section chart series, and health/diagnostic reports.

use chrono::{Datelike, Local, NaiveDate};
use harvest_core::error::{HarvestError, Result};
use harvest_core::models::{ColumnBindings, DateOrder, SheetRow};
use harvest_data::aggregator::{Aggregator, SectionBreakdown, SectionTotal, SeriesPoint};
use harvest_data::reader::SourceMeta;
use serde::Serialize;

/// Number of dates included in [`Diagnostics::dates_sample`].
const DATES_SAMPLE_LEN: usize = 5;

// ── Payloads ──────────────────────────────────────────────────────────────────

/// Everything needed to render one day of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    /// All dates with data, newest first.
    pub available_dates: Vec<NaiveDate>,
    /// The requested date when it has data, otherwise the newest date.
    pub selected_date: Option<NaiveDate>,
    pub total: f64,
    pub per_section: Vec<SectionTotal>,
    pub tables: Vec<SectionBreakdown>,
    /// Year and month the chart views open on.
    pub default_year: i32,
    pub default_month: u32,
}

/// One bar of a chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: String,
    pub y: f64,
}

impl From<SeriesPoint> for ChartPoint {
    fn from(p: SeriesPoint) -> Self {
        Self {
            x: p.key,
            y: p.quantity,
        }
    }
}

/// A section's daily or monthly series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPayload {
    pub ok: bool,
    pub section: String,
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    pub data: Vec<ChartPoint>,
}

/// Whether the sheet could be read and aggregated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthReport {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Source and binding details for troubleshooting a sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostics {
    pub ok: bool,
    pub dates_sample: Vec<NaiveDate>,
    pub columns: ColumnBindings,
    pub date_order: DateOrder,
    pub sections: Vec<String>,
    pub entries: usize,
    pub source: SourceMeta,
}

// ── DashboardService ──────────────────────────────────────────────────────────

/// Read-only view over one aggregated snapshot of the sheet.
#[derive(Debug, Clone)]
pub struct DashboardService {
    aggregator: Aggregator,
    bindings: ColumnBindings,
    order: DateOrder,
    today: NaiveDate,
}

impl DashboardService {
    pub fn new(aggregator: Aggregator, bindings: ColumnBindings, order: DateOrder) -> Self {
        Self {
            aggregator,
            bindings,
            order,
            today: Local::now().date_naive(),
        }
    }

    /// Aggregate `rows` and wrap the result.
    pub fn from_rows(
        rows: &[SheetRow],
        bindings: &ColumnBindings,
        order: DateOrder,
        preferred_sections: &[String],
    ) -> Result<Self> {
        let aggregator = Aggregator::new(rows, bindings, order, preferred_sections)?;
        Ok(Self::new(aggregator, bindings.clone(), order))
    }

    /// Pin "today" (used for the default chart period).
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn sections(&self) -> &[String] {
        self.aggregator.sections()
    }

    /// Dates with data, newest first.
    pub fn available_dates(&self) -> Vec<NaiveDate> {
        let mut dates = self.aggregator.all_dates();
        dates.reverse();
        dates
    }

    /// The day view for `requested`, falling back to the newest date.
    pub fn snapshot(&self, requested: Option<NaiveDate>) -> DashboardSnapshot {
        let available_dates = self.available_dates();
        let selected_date = requested
            .filter(|d| available_dates.contains(d))
            .or_else(|| available_dates.first().copied());

        let (total, per_section, tables) = match selected_date {
            Some(date) => {
                let totals = self.aggregator.totals_for_date(date);
                (
                    totals.total,
                    totals.per_section,
                    self.aggregator.breakdown_for_date(date),
                )
            }
            None => (
                0.0,
                self.sections()
                    .iter()
                    .map(|s| SectionTotal {
                        section: s.clone(),
                        quantity: 0.0,
                    })
                    .collect(),
                self.sections()
                    .iter()
                    .map(|s| SectionBreakdown {
                        section: s.clone(),
                        workers: Vec::new(),
                    })
                    .collect(),
            ),
        };

        DashboardSnapshot {
            available_dates,
            selected_date,
            total,
            per_section,
            tables,
            default_year: self.today.year(),
            default_month: self.today.month(),
        }
    }

    /// Daily series of `section` for one month.
    pub fn monthly_chart(&self, section: &str, year: i32, month: u32) -> ChartPayload {
        ChartPayload {
            ok: true,
            section: section.to_string(),
            year,
            month: Some(month),
            data: self
                .aggregator
                .daily_series(section, year, month)
                .into_iter()
                .map(ChartPoint::from)
                .collect(),
        }
    }

    /// Monthly series of `section` for one year.
    pub fn yearly_chart(&self, section: &str, year: i32) -> ChartPayload {
        ChartPayload {
            ok: true,
            section: section.to_string(),
            year,
            month: None,
            data: self
                .aggregator
                .monthly_series(section, year)
                .into_iter()
                .map(ChartPoint::from)
                .collect(),
        }
    }

    /// Summarize whether loading the sheet succeeded.
    pub fn health<T>(result: &std::result::Result<T, HarvestError>) -> HealthReport {
        match result {
            Ok(_) => HealthReport {
                ok: true,
                msg: Some("healthy".to_string()),
                error: None,
            },
            Err(e) => HealthReport {
                ok: false,
                msg: None,
                error: Some(e.to_string()),
            },
        }
    }

    /// Troubleshooting details: oldest dates, bindings and source metadata.
    pub fn diagnostics(&self, source: SourceMeta) -> Diagnostics {
        Diagnostics {
            ok: true,
            dates_sample: self
                .aggregator
                .all_dates()
                .into_iter()
                .take(DATES_SAMPLE_LEN)
                .collect(),
            columns: self.bindings.clone(),
            date_order: self.order,
            sections: self.sections().to_vec(),
            entries: self.aggregator.len(),
            source,
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
