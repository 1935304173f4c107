use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use crate::dates::normalize_date;
use crate::error::{HarvestError, Result};
use crate::quantity::normalize_quantity;

/// Sheet header used for the harvest date.
pub const COL_DATE: &str = "Tanggal";
/// Sheet header used for the section (plot / block).
pub const COL_SECTION: &str = "Seksi";
/// Sheet header used for the harvester's name.
pub const COL_WORKER: &str = "Nama Pemanen";
/// Sheet header used for the bunch count.
pub const COL_QUANTITY: &str = "Jumlah Janjang";

/// Display order of the estate's sections.
pub const DEFAULT_SECTIONS: [&str; 4] = ["A III", "B III", "C II", "D I"];

// ── CellValue ─────────────────────────────────────────────────────────────────

/// A single raw spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Build a cell from exported text; blank text becomes [`CellValue::Empty`].
    pub fn from_text(s: &str) -> Self {
        if s.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(s.to_string())
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Render the cell as a trimmed label, or `None` when it is blank.
    ///
    /// Integral numbers render without a fractional part so that numeric
    /// worker codes read as `"12"`, not `"12.0"`.
    pub fn as_label(&self) -> Option<Cow<'_, str>> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Cow::Borrowed(trimmed))
                }
            }
            CellValue::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                Some(Cow::Owned(format!("{}", *n as i64)))
            }
            CellValue::Number(n) => Some(Cow::Owned(n.to_string())),
            CellValue::Date(d) => Some(Cow::Owned(d.format("%Y-%m-%d").to_string())),
            CellValue::DateTime(dt) => Some(Cow::Owned(dt.format("%Y-%m-%d %H:%M:%S").to_string())),
        }
    }
}

impl From<serde_json::Value> for CellValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => CellValue::Empty,
            serde_json::Value::String(s) => CellValue::from_text(&s),
            serde_json::Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or_default(),
            serde_json::Value::Bool(b) => CellValue::Text(b.to_string()),
            other => CellValue::Text(other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for CellValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(CellValue::from)
    }
}

/// One spreadsheet row: column label → raw cell.
pub type SheetRow = BTreeMap<String, CellValue>;

// ── DateOrder ─────────────────────────────────────────────────────────────────

/// Which component comes first in ambiguous `NN/NN/YYYY` dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum DateOrder {
    DayFirst,
    #[default]
    MonthFirst,
}

impl DateOrder {
    /// The opposite order, tried after the configured one fails.
    pub fn alternate(self) -> Self {
        match self {
            DateOrder::DayFirst => DateOrder::MonthFirst,
            DateOrder::MonthFirst => DateOrder::DayFirst,
        }
    }

    pub fn is_day_first(self) -> bool {
        self == DateOrder::DayFirst
    }
}

impl fmt::Display for DateOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateOrder::DayFirst => f.write_str("day-first"),
            DateOrder::MonthFirst => f.write_str("month-first"),
        }
    }
}

impl FromStr for DateOrder {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "day-first" | "dayfirst" | "dmy" => Ok(DateOrder::DayFirst),
            "month-first" | "monthfirst" | "mdy" => Ok(DateOrder::MonthFirst),
            other => Err(HarvestError::Config(format!("unknown date order: {other}"))),
        }
    }
}

// ── ColumnBindings ────────────────────────────────────────────────────────────

/// Which sheet column holds each field of a harvest record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnBindings {
    pub date: String,
    pub section: String,
    pub worker: String,
    pub quantity: String,
}

impl Default for ColumnBindings {
    fn default() -> Self {
        Self {
            date: COL_DATE.to_string(),
            section: COL_SECTION.to_string(),
            worker: COL_WORKER.to_string(),
            quantity: COL_QUANTITY.to_string(),
        }
    }
}

impl ColumnBindings {
    /// `(role, column label)` pairs in a fixed order.
    pub fn pairs(&self) -> [(&'static str, &str); 4] {
        [
            ("date", self.date.as_str()),
            ("section", self.section.as_str()),
            ("worker", self.worker.as_str()),
            ("quantity", self.quantity.as_str()),
        ]
    }

    /// Reject bindings with an empty label.
    pub fn validate(&self) -> Result<()> {
        for (role, column) in self.pairs() {
            if column.trim().is_empty() {
                return Err(HarvestError::EmptyBinding(role));
            }
        }
        Ok(())
    }

    /// Resolve one sheet row into a typed [`RawRecord`].
    pub fn resolve(&self, row: &SheetRow) -> RawRecord {
        let cell = |column: &str| row.get(column.trim()).filter(|c| !c.is_empty()).cloned();
        let label = |column: &str| {
            row.get(column.trim())
                .and_then(CellValue::as_label)
                .map(|s| s.into_owned())
        };

        RawRecord {
            date: cell(&self.date),
            section: label(&self.section),
            worker: label(&self.worker),
            quantity: row.get(self.quantity.trim()).cloned(),
        }
    }
}

// ── RawRecord / NormalizedEntry ───────────────────────────────────────────────

/// A sheet row with its bound columns pulled out, not yet validated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    pub date: Option<CellValue>,
    pub section: Option<String>,
    pub worker: Option<String>,
    /// `None` when the quantity column is absent from the row; an empty cell
    /// is `Some(CellValue::Empty)` and counts as zero.
    pub quantity: Option<CellValue>,
}

impl RawRecord {
    /// Normalize into an entry, or `None` when the record must be skipped.
    pub fn normalize(&self, order: DateOrder) -> Option<NormalizedEntry> {
        let date = normalize_date(self.date.as_ref()?, order)?;
        let section = self.section.clone()?;
        let worker = self.worker.clone()?;
        let quantity = normalize_quantity(self.quantity.as_ref()?);

        Some(NormalizedEntry {
            date,
            section,
            worker,
            quantity,
        })
    }
}

/// One validated harvest record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEntry {
    /// Harvest date, serialized as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub section: String,
    pub worker: String,
    /// Bunch count, never negative.
    pub quantity: f64,
}
