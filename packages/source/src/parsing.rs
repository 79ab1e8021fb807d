//! Field parsing for the case-count CSV.
//!
//! The published files have been regenerated by different tools over
//! time, so dates and counts are accepted in a few equivalent spellings.

use chrono::{NaiveDate, NaiveDateTime};

/// Column holding the area type.
pub const AREA_TYPE_COLUMN: &str = "Area type";
/// Column holding the area name.
pub const AREA_NAME_COLUMN: &str = "Area name";
/// Column holding the specimen date.
pub const SPECIMEN_DATE_COLUMN: &str = "Specimen date";
/// Column holding the daily confirmed cases.
pub const DAILY_COLUMN: &str = "Daily lab-confirmed cases";
/// Column holding the cumulative confirmed cases.
pub const CUMULATIVE_COLUMN: &str = "Cumulative lab-confirmed cases";

/// Every column the loader needs, in record field order.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    AREA_TYPE_COLUMN,
    AREA_NAME_COLUMN,
    SPECIMEN_DATE_COLUMN,
    DAILY_COLUMN,
    CUMULATIVE_COLUMN,
];

/// Parses a specimen date: `YYYY-MM-DD`, optionally followed by an ISO
/// time which is ignored.
#[must_use]
pub fn parse_specimen_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    None
}

/// Parses a case count. Integral floats such as `"12.0"` are accepted;
/// empty strings and fractional values are not.
#[must_use]
pub fn parse_count(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Some(n);
    }
    let f = s.parse::<f64>().ok()?;
    #[allow(clippy::cast_possible_truncation)]
    let n = f as i64;
    #[allow(clippy::cast_precision_loss)]
    let exact = f.is_finite() && (n as f64 - f).abs() < f64::EPSILON;
    exact.then_some(n)
}
