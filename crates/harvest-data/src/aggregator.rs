//! Harvest aggregation by date, section and worker.
//!
//! An [`Aggregator`] normalizes a snapshot of sheet rows once and answers the
//! dashboard's queries over the resulting entries. Rows that cannot be
//! normalized (no parseable date, blank section or worker) are skipped.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate};
use harvest_core::error::{HarvestError, Result};
use harvest_core::models::{ColumnBindings, DateOrder, NormalizedEntry, SheetRow};
use serde::Serialize;
use tracing::debug;

// ── Result types ──────────────────────────────────────────────────────────────

/// Sum of quantities for one section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionTotal {
    pub section: String,
    pub quantity: f64,
}

/// Totals for a single date, overall and per known section.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayTotals {
    pub date: NaiveDate,
    pub total: f64,
    /// One entry per known section, in display order, zero when absent.
    pub per_section: Vec<SectionTotal>,
}

impl DayTotals {
    /// Total for `section`, or `None` when it is not a known section.
    pub fn section(&self, section: &str) -> Option<f64> {
        self.per_section
            .iter()
            .find(|s| s.section == section)
            .map(|s| s.quantity)
    }
}

/// Sum of quantities for one worker.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerQuantity {
    pub worker: String,
    pub quantity: f64,
}

/// Per-worker breakdown of one section on one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionBreakdown {
    pub section: String,
    /// Workers with a positive total, sorted by name.
    pub workers: Vec<WorkerQuantity>,
}

impl SectionBreakdown {
    pub fn total(&self) -> f64 {
        self.workers.iter().map(|w| w.quantity).sum()
    }
}

/// One point of a time series: `YYYY-MM-DD` (daily) or `YYYY-MM` (monthly).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub key: String,
    pub quantity: f64,
}

// ── Aggregator ────────────────────────────────────────────────────────────────

/// Query engine over one normalized snapshot of the harvest sheet.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    entries: Vec<NormalizedEntry>,
    sections: Vec<String>,
}

impl Aggregator {
    /// Normalize `rows` through `bindings`.
    ///
    /// Fails when a binding is empty, or when the data is non-empty and a
    /// bound column appears in none of its rows. An empty dataset is not an
    /// error; every query then returns empty or zero results.
    pub fn new(
        rows: &[SheetRow],
        bindings: &ColumnBindings,
        order: DateOrder,
        preferred_sections: &[String],
    ) -> Result<Self> {
        bindings.validate()?;

        if !rows.is_empty() {
            for (role, column) in bindings.pairs() {
                let key = column.trim();
                if !rows.iter().any(|row| row.contains_key(key)) {
                    return Err(HarvestError::MissingColumn {
                        role,
                        column: column.to_string(),
                    });
                }
            }
        }

        let entries: Vec<NormalizedEntry> = rows
            .iter()
            .filter_map(|row| bindings.resolve(row).normalize(order))
            .collect();

        debug!(
            "Normalized {} of {} rows ({} skipped)",
            entries.len(),
            rows.len(),
            rows.len() - entries.len()
        );

        Ok(Self::from_entries(entries, preferred_sections))
    }

    /// Build directly from already normalized entries.
    pub fn from_entries(entries: Vec<NormalizedEntry>, preferred_sections: &[String]) -> Self {
        let mut sections: Vec<String> = Vec::new();
        for s in preferred_sections {
            if !sections.contains(s) {
                sections.push(s.clone());
            }
        }

        let extra: BTreeSet<&str> = entries
            .iter()
            .map(|e| e.section.as_str())
            .filter(|s| !sections.iter().any(|known| known == s))
            .collect();
        sections.extend(extra.into_iter().map(str::to_string));

        Self { entries, sections }
    }

    pub fn entries(&self) -> &[NormalizedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Known sections: preferred ones first, then any others seen in the
    /// data in alphabetical order.
    pub fn sections(&self) -> &[String] {
        &self.sections
    }

    /// Distinct dates present in the data, ascending.
    pub fn all_dates(&self) -> Vec<NaiveDate> {
        let dates: BTreeSet<NaiveDate> = self.entries.iter().map(|e| e.date).collect();
        dates.into_iter().collect()
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.entries.iter().map(|e| e.date).max()
    }

    /// Overall and per-section totals for `date`.
    pub fn totals_for_date(&self, date: NaiveDate) -> DayTotals {
        let mut by_section: HashMap<&str, f64> = HashMap::new();
        let mut total = 0.0;
        for entry in self.entries.iter().filter(|e| e.date == date) {
            total += entry.quantity;
            *by_section.entry(entry.section.as_str()).or_insert(0.0) += entry.quantity;
        }

        let per_section = self
            .sections
            .iter()
            .map(|section| SectionTotal {
                section: section.clone(),
                quantity: by_section.get(section.as_str()).copied().unwrap_or(0.0),
            })
            .collect();

        DayTotals {
            date,
            total,
            per_section,
        }
    }

    /// Per-worker totals of each known section for `date`.
    ///
    /// Workers whose total is zero are left out. Names sort case-insensitively
    /// with the exact name as tie-breaker.
    pub fn breakdown_for_date(&self, date: NaiveDate) -> Vec<SectionBreakdown> {
        let mut grouped: HashMap<&str, HashMap<&str, f64>> = HashMap::new();
        for entry in self.entries.iter().filter(|e| e.date == date) {
            *grouped
                .entry(entry.section.as_str())
                .or_default()
                .entry(entry.worker.as_str())
                .or_insert(0.0) += entry.quantity;
        }

        self.sections
            .iter()
            .map(|section| {
                let mut workers: Vec<WorkerQuantity> = grouped
                    .get(section.as_str())
                    .map(|by_worker| {
                        by_worker
                            .iter()
                            .filter(|(_, q)| **q > 0.0)
                            .map(|(w, q)| WorkerQuantity {
                                worker: w.to_string(),
                                quantity: *q,
                            })
                            .collect()
                    })
                    .unwrap_or_default();

                workers.sort_by(|a, b| {
                    a.worker
                        .to_lowercase()
                        .cmp(&b.worker.to_lowercase())
                        .then_with(|| a.worker.cmp(&b.worker))
                });

                SectionBreakdown {
                    section: section.clone(),
                    workers,
                }
            })
            .collect()
    }

    /// One point per calendar day of `year`-`month` for `section`.
    ///
    /// An impossible month yields an empty series.
    pub fn daily_series(&self, section: &str, year: i32, month: u32) -> Vec<SeriesPoint> {
        let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
            return Vec::new();
        };

        let sums = self.bucket_totals(section, |d| {
            (d.year() == year && d.month() == month).then_some(d.day())
        });

        first
            .iter_days()
            .take_while(|d| d.month() == month)
            .map(|d| SeriesPoint {
                key: d.format("%Y-%m-%d").to_string(),
                quantity: sums.get(&d.day()).copied().unwrap_or(0.0),
            })
            .collect()
    }

    /// Twelve monthly points of `year` for `section`.
    pub fn monthly_series(&self, section: &str, year: i32) -> Vec<SeriesPoint> {
        let sums = self.bucket_totals(section, |d| (d.year() == year).then_some(d.month()));

        (1..=12u32)
            .map(|month| SeriesPoint {
                key: format!("{year:04}-{month:02}"),
                quantity: sums.get(&month).copied().unwrap_or(0.0),
            })
            .collect()
    }

    /// Sum the quantities of `section` into buckets chosen by `key_fn`;
    /// entries for which it returns `None` are ignored.
    fn bucket_totals<F>(&self, section: &str, key_fn: F) -> BTreeMap<u32, f64>
    where
        F: Fn(NaiveDate) -> Option<u32>,
    {
        let mut sums: BTreeMap<u32, f64> = BTreeMap::new();
        for entry in self.entries.iter().filter(|e| e.section == section) {
            if let Some(key) = key_fn(entry.date) {
                *sums.entry(key).or_insert(0.0) += entry.quantity;
            }
        }
        sums
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
