//! Bunch-count normalization.

use crate::models::CellValue;

/// Normalize a raw cell into a non-negative quantity.
///
/// Thousands separators (`,`) and surrounding whitespace are stripped, blank
/// cells count as zero and decimals are accepted. Anything unparseable,
/// non-finite or negative yields `0.0`.
pub fn normalize_quantity(value: &CellValue) -> f64 {
    let parsed = match value {
        CellValue::Number(n) => Some(*n),
        CellValue::Text(s) => parse_quantity_str(s),
        CellValue::Empty | CellValue::Date(_) | CellValue::DateTime(_) => None,
    };

    match parsed {
        Some(q) if q.is_finite() && q > 0.0 => q,
        _ => 0.0,
    }
}

/// Parse a quantity string, returning `None` when it is not a number.
pub fn parse_quantity_str(s: &str) -> Option<f64> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    #[test]
    fn test_plain_integer() {
        assert_eq!(normalize_quantity(&text("12")), 12.0);
    }

    #[test]
    fn test_thousands_separators_stripped() {
        assert_eq!(normalize_quantity(&text("1,234")), 1234.0);
        assert_eq!(normalize_quantity(&text("1,234,567")), 1_234_567.0);
        assert_eq!(normalize_quantity(&text(" 2 500 ")), 2500.0);
    }

    #[test]
    fn test_decimal_point_accepted() {
        assert_eq!(normalize_quantity(&text("12.5")), 12.5);
        assert_eq!(normalize_quantity(&text("1,000.25")), 1000.25);
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(normalize_quantity(&text("")), 0.0);
        assert_eq!(normalize_quantity(&CellValue::Empty), 0.0);
    }

    #[test]
    fn test_unparseable_is_zero() {
        assert_eq!(normalize_quantity(&text("dua belas")), 0.0);
        assert_eq!(normalize_quantity(&text("12 janjang")), 0.0);
        assert_eq!(normalize_quantity(&text("NaN")), 0.0);
        assert_eq!(normalize_quantity(&text("inf")), 0.0);
    }

    #[test]
    fn test_negative_is_zero() {
        assert_eq!(normalize_quantity(&text("-5")), 0.0);
        assert_eq!(normalize_quantity(&CellValue::Number(-1.0)), 0.0);
    }

    #[test]
    fn test_negative_zero_is_positive_zero() {
        for value in [text("-0"), text("-0.0"), CellValue::Number(-0.0)] {
            let q = normalize_quantity(&value);
            assert_eq!(q, 0.0);
            assert!(q.is_sign_positive());
        }
    }

    #[test]
    fn test_numeric_cells() {
        assert_eq!(normalize_quantity(&CellValue::Number(42.0)), 42.0);
        assert_eq!(normalize_quantity(&CellValue::Number(f64::INFINITY)), 0.0);
    }

    #[test]
    fn test_date_cells_are_zero() {
        let date = chrono::NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(normalize_quantity(&CellValue::Date(date)), 0.0);
    }
}
