//! Date normalization for spreadsheet cells.
//!
//! Harvest sheets are filled in by hand and through forms, so the date column
//! carries ISO dates, locale-dependent `NN/NN/YYYY` strings, spelled-out
//! month names and occasionally raw spreadsheet serial numbers. Everything is
//! reduced to a [`NaiveDate`] or rejected.

use std::sync::OnceLock;

use chrono::{Days, NaiveDate};
use regex::Regex;

use crate::models::{CellValue, DateOrder};

/// Day zero of spreadsheet serial dates (Lotus/Sheets convention).
const SERIAL_EPOCH: (i32, u32, u32) = (1899, 12, 30);

/// Serial number of 9999-12-31, the last date a spreadsheet can hold.
const MAX_SERIAL: f64 = 2_958_465.0;

const MONTH_NAMES: &[(&str, u32)] = &[
    ("january", 1),
    ("januari", 1),
    ("jan", 1),
    ("february", 2),
    ("februari", 2),
    ("pebruari", 2),
    ("feb", 2),
    ("peb", 2),
    ("march", 3),
    ("maret", 3),
    ("mar", 3),
    ("april", 4),
    ("apr", 4),
    ("may", 5),
    ("mei", 5),
    ("june", 6),
    ("juni", 6),
    ("jun", 6),
    ("july", 7),
    ("juli", 7),
    ("jul", 7),
    ("august", 8),
    ("agustus", 8),
    ("aug", 8),
    ("agu", 8),
    ("agt", 8),
    ("ags", 8),
    ("september", 9),
    ("sept", 9),
    ("sep", 9),
    ("october", 10),
    ("oktober", 10),
    ("oct", 10),
    ("okt", 10),
    ("november", 11),
    ("nopember", 11),
    ("nov", 11),
    ("nop", 11),
    ("december", 12),
    ("desember", 12),
    ("dec", 12),
    ("des", 12),
];

/// Words that may surround a date without changing its meaning.
const NOISE_WORDS: &[&str] = &[
    "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday", "mon", "tue",
    "tues", "wed", "thu", "thur", "thurs", "fri", "sat", "sun", "senin", "selasa", "rabu", "kamis",
    "jumat", "jum", "at", "sabtu", "minggu", "ahad", "of", "st", "nd", "rd", "th", "tgl", "tanggal",
];

fn iso_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4})[-/.](\d{1,2})[-/.](\d{1,2})(?:[ T].*)?$").expect("regex is valid")
    })
}

fn delimited_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{1,2})[-/.](\d{1,2})[-/.](\d{4}|\d{2})(?:[ T,].*)?$")
            .expect("regex is valid")
    })
}

fn time_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b\d{1,2}[:.]\d{2}(?:[:.]\d{2}(?:\.\d+)?)?\s*(?:am|pm)?\b")
            .expect("regex is valid")
    })
}

fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[A-Za-z]+|\d+").expect("regex is valid"))
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Normalize a raw cell into a calendar date.
///
/// Structured date / datetime cells pass through (date portion only), numbers
/// are read as spreadsheet serial days, and text goes through
/// [`parse_date_str`]. Returns `None` for anything unparseable; callers drop
/// the record instead of failing.
pub fn normalize_date(value: &CellValue, order: DateOrder) -> Option<NaiveDate> {
    match value {
        CellValue::Empty => None,
        CellValue::Date(d) => Some(*d),
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Number(n) => from_serial(*n),
        CellValue::Text(s) => parse_date_str(s, order),
    }
}

/// Parse a date string.
///
/// Order of attempts:
/// 1. ISO `YYYY-MM-DD` (any trailing time part is ignored).
/// 2. `NN/NN/YYYY` in the configured `order`.
/// 3. The same pattern in the alternate order.
/// 4. A lenient pass that drops times, understands month names and uses
///    `order` to settle day versus month.
pub fn parse_date_str(s: &str, order: DateOrder) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    parse_iso(s)
        .or_else(|| parse_delimited(s, order))
        .or_else(|| parse_delimited(s, order.alternate()))
        .or_else(|| parse_lenient(s, order))
}

/// Convert a spreadsheet serial day number into a date.
pub fn from_serial(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || !(1.0..=MAX_SERIAL).contains(&serial) {
        return None;
    }
    let (y, m, d) = SERIAL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)?.checked_add_days(Days::new(serial.trunc() as u64))
}

/// Expand a year token; two-digit years pivot at 69 like `strftime("%y")`.
pub fn expand_year(token: &str) -> Option<i32> {
    let value: i32 = token.parse().ok()?;
    match token.len() {
        2 if value <= 68 => Some(2000 + value),
        2 => Some(1900 + value),
        4 => Some(value),
        _ => None,
    }
}

// ── Parsers ───────────────────────────────────────────────────────────────────

fn parse_iso(s: &str) -> Option<NaiveDate> {
    let caps = iso_re().captures(s)?;
    let year: i32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn parse_delimited(s: &str, order: DateOrder) -> Option<NaiveDate> {
    let caps = delimited_re().captures(s)?;
    let first: u32 = caps[1].parse().ok()?;
    let second: u32 = caps[2].parse().ok()?;
    let year = expand_year(&caps[3])?;
    from_parts(year, first, second, order)
}

fn parse_lenient(s: &str, order: DateOrder) -> Option<NaiveDate> {
    let without_time = time_re().replace_all(s, " ");

    let mut month_from_name: Option<u32> = None;
    let mut numbers: Vec<&str> = Vec::new();

    for token in token_re().find_iter(&without_time) {
        let t = token.as_str();
        if t.as_bytes()[0].is_ascii_digit() {
            numbers.push(t);
            continue;
        }
        let lower = t.to_lowercase();
        if let Some(month) = lookup_month(&lower) {
            if month_from_name.replace(month).is_some() {
                return None;
            }
        } else if !NOISE_WORDS.contains(&lower.as_str()) {
            return None;
        }
    }

    match (month_from_name, numbers.as_slice()) {
        (Some(month), [a, b]) => {
            let (day, year) = if a.len() == 4 { (b, a) } else { (a, b) };
            NaiveDate::from_ymd_opt(expand_year(year)?, month, day.parse().ok()?)
        }
        (None, [compact]) if compact.len() == 8 => {
            NaiveDate::parse_from_str(compact, "%Y%m%d").ok()
        }
        (None, [a, b, c]) if a.len() == 4 => {
            NaiveDate::from_ymd_opt(a.parse().ok()?, b.parse().ok()?, c.parse().ok()?)
        }
        (None, [a, b, c]) => {
            let year = expand_year(c)?;
            let first: u32 = a.parse().ok()?;
            let second: u32 = b.parse().ok()?;
            from_parts(year, first, second, order)
                .or_else(|| from_parts(year, first, second, order.alternate()))
        }
        _ => None,
    }
}

/// Build a date from two ambiguous leading components.
fn from_parts(year: i32, first: u32, second: u32, order: DateOrder) -> Option<NaiveDate> {
    let (day, month) = if order.is_day_first() {
        (first, second)
    } else {
        (second, first)
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

fn lookup_month(word: &str) -> Option<u32> {
    MONTH_NAMES
        .iter()
        .find(|(name, _)| *name == word)
        .map(|(_, month)| *month)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    // ── ISO ───────────────────────────────────────────────────────────────────

    #[test]
    fn test_iso_date() {
        assert_eq!(parse_date_str("2025-10-08", DateOrder::DayFirst), Some(ymd(2025, 10, 8)));
        assert_eq!(parse_date_str("2025-10-08", DateOrder::MonthFirst), Some(ymd(2025, 10, 8)));
    }

    #[test]
    fn test_iso_with_time_suffix() {
        assert_eq!(
            parse_date_str("2025-10-08T07:15:00Z", DateOrder::DayFirst),
            Some(ymd(2025, 10, 8))
        );
        assert_eq!(
            parse_date_str("2025/1/5 13:00:00", DateOrder::DayFirst),
            Some(ymd(2025, 1, 5))
        );
    }

    // ── Ambiguous NN/NN/YYYY ──────────────────────────────────────────────────

    #[test]
    fn test_ambiguous_follows_configured_order() {
        assert_eq!(parse_date_str("10/08/2025", DateOrder::MonthFirst), Some(ymd(2025, 10, 8)));
        assert_eq!(parse_date_str("10/08/2025", DateOrder::DayFirst), Some(ymd(2025, 8, 10)));
    }

    #[test]
    fn test_same_day_and_month_is_order_independent() {
        assert_eq!(parse_date_str("07/07/2025", DateOrder::MonthFirst), Some(ymd(2025, 7, 7)));
        assert_eq!(parse_date_str("07/07/2025", DateOrder::DayFirst), Some(ymd(2025, 7, 7)));
    }

    #[test]
    fn test_falls_back_to_alternate_order() {
        // 25 cannot be a month, so month-first gives way to day-first.
        assert_eq!(parse_date_str("25/12/2025", DateOrder::MonthFirst), Some(ymd(2025, 12, 25)));
        assert_eq!(parse_date_str("12/25/2025", DateOrder::DayFirst), Some(ymd(2025, 12, 25)));
    }

    #[test]
    fn test_mixed_delimiters() {
        assert_eq!(parse_date_str("10-08/2025", DateOrder::DayFirst), Some(ymd(2025, 8, 10)));
        assert_eq!(parse_date_str("1.2.2025", DateOrder::DayFirst), Some(ymd(2025, 2, 1)));
    }

    #[test]
    fn test_two_digit_year() {
        assert_eq!(parse_date_str("10/08/25", DateOrder::DayFirst), Some(ymd(2025, 8, 10)));
        assert_eq!(parse_date_str("10/08/99", DateOrder::DayFirst), Some(ymd(1999, 8, 10)));
    }

    #[test]
    fn test_form_timestamp_with_time() {
        assert_eq!(
            parse_date_str("10/8/2025 14:05:33", DateOrder::MonthFirst),
            Some(ymd(2025, 10, 8))
        );
    }

    // ── Lenient ───────────────────────────────────────────────────────────────

    #[test]
    fn test_month_names_english_and_indonesian() {
        assert_eq!(parse_date_str("8 October 2025", DateOrder::MonthFirst), Some(ymd(2025, 10, 8)));
        assert_eq!(parse_date_str("Oct 8, 2025", DateOrder::DayFirst), Some(ymd(2025, 10, 8)));
        assert_eq!(parse_date_str("17 Agustus 2025", DateOrder::MonthFirst), Some(ymd(2025, 8, 17)));
        assert_eq!(parse_date_str("1 Mei 2025", DateOrder::DayFirst), Some(ymd(2025, 5, 1)));
        assert_eq!(parse_date_str("2025 Des 31", DateOrder::DayFirst), Some(ymd(2025, 12, 31)));
    }

    #[test]
    fn test_weekday_and_ordinal_noise_ignored() {
        assert_eq!(
            parse_date_str("Wednesday, 8th of October 2025", DateOrder::MonthFirst),
            Some(ymd(2025, 10, 8))
        );
        assert_eq!(parse_date_str("Rabu, 8 Okt 2025", DateOrder::MonthFirst), Some(ymd(2025, 10, 8)));
    }

    #[test]
    fn test_space_separated_numbers_and_compact() {
        assert_eq!(parse_date_str("08 10 2025", DateOrder::DayFirst), Some(ymd(2025, 10, 8)));
        assert_eq!(parse_date_str("20251008", DateOrder::DayFirst), Some(ymd(2025, 10, 8)));
    }

    #[test]
    fn test_unparseable_inputs() {
        assert_eq!(parse_date_str("not-a-date", DateOrder::DayFirst), None);
        assert_eq!(parse_date_str("", DateOrder::DayFirst), None);
        assert_eq!(parse_date_str("   ", DateOrder::MonthFirst), None);
        assert_eq!(parse_date_str("31/31/2025", DateOrder::DayFirst), None);
        assert_eq!(parse_date_str("Oct 2025", DateOrder::DayFirst), None);
        assert_eq!(parse_date_str("Oct Nov 8 2025", DateOrder::DayFirst), None);
    }

    // ── Cells ─────────────────────────────────────────────────────────────────

    #[test]
    fn test_structured_cells_pass_through() {
        let date = ymd(2025, 3, 4);
        assert_eq!(normalize_date(&CellValue::Date(date), DateOrder::DayFirst), Some(date));

        let dt = date.and_hms_opt(16, 30, 0).unwrap();
        assert_eq!(normalize_date(&CellValue::DateTime(dt), DateOrder::DayFirst), Some(date));
    }

    #[test]
    fn test_serial_numbers() {
        assert_eq!(from_serial(45938.0), Some(ymd(2025, 10, 8)));
        assert_eq!(from_serial(45938.75), Some(ymd(2025, 10, 8)));
        assert_eq!(from_serial(0.0), None);
        assert_eq!(from_serial(-3.0), None);
        assert_eq!(from_serial(f64::NAN), None);
        assert_eq!(
            normalize_date(&CellValue::Number(45938.0), DateOrder::MonthFirst),
            Some(ymd(2025, 10, 8))
        );
    }

    #[test]
    fn test_empty_and_text_cells() {
        assert_eq!(normalize_date(&CellValue::Empty, DateOrder::DayFirst), None);
        assert_eq!(normalize_date(&text("2025-01-31"), DateOrder::DayFirst), Some(ymd(2025, 1, 31)));
    }

    #[test]
    fn test_expand_year() {
        assert_eq!(expand_year("00"), Some(2000));
        assert_eq!(expand_year("68"), Some(2068));
        assert_eq!(expand_year("69"), Some(1969));
        assert_eq!(expand_year("2025"), Some(2025));
        assert_eq!(expand_year("202"), None);
    }
}
