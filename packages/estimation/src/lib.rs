#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Statistical estimation over per-area case curves.
//!
//! The pipeline runs over an immutable [`CaseTable`] snapshot:
//!
//! 1. [`CaseTable::extract`] builds a date-ordered [`Curve`] for one area
//!    with Poisson errors on every count.
//! 2. [`weekday::weekly_factor`] and [`weekday::correct_weekday_bias`]
//!    optionally remove day-of-week reporting artefacts.
//! 3. [`smooth::smooth_curve`] optionally averages over a
//!    [`SmoothingWindow`].
//! 4. [`reproduction::calc_r`] divides each day's cases by the trailing
//!    infectious-window sum from [`infectious::aggregate_infectious`].
//!
//! Every function is pure; nothing is cached between calls.
//!
//! [`Curve`]: corona_stats_cases_models::Curve
//! [`SmoothingWindow`]: corona_stats_cases_models::SmoothingWindow

pub mod infectious;
pub mod pipeline;
pub mod reproduction;
pub mod smooth;
pub mod table;
pub mod weekday;

use corona_stats_cases_models::{InvalidWindowError, MisalignedCurveError};
use thiserror::Error;

pub use pipeline::{
    AreaEstimate, AreaTypeReport, EstimationSettings, estimate_area, estimate_area_type,
};
pub use table::CaseTable;

/// Errors that can occur during estimation.
///
/// All of them are raised before any partial result is returned.
#[derive(Debug, Error)]
pub enum EstimationError {
    /// No rows matched the requested area.
    #[error("No rows for {}", describe_selection(.area_type, .area_name.as_deref()))]
    EmptySelection {
        /// Requested area type.
        area_type: String,
        /// Requested area name, `None` when a whole area type was requested.
        area_name: Option<String>,
    },

    /// The history cannot support a weekday bias factor: either the weekday
    /// totals sum to zero (or less), or a weekday with samples reported
    /// nothing at all.
    #[error("Degenerate history: {}", describe_degenerate(*.weekday, *.total))]
    DegenerateHistory {
        /// Weekday (Monday = 0) whose bucket is empty, `None` when the grand
        /// total is the problem.
        weekday: Option<u8>,
        /// Total of that weekday's bucket, or over all buckets.
        total: f64,
    },

    /// A parameter was rejected before any computation.
    #[error("Invalid parameter: {message}")]
    InvalidParameter {
        /// Description of what went wrong.
        message: String,
    },

    /// A curve could not be built from the computed series.
    #[error("Misaligned curve: {0}")]
    MisalignedCurve(#[from] MisalignedCurveError),
}

impl From<InvalidWindowError> for EstimationError {
    fn from(e: InvalidWindowError) -> Self {
        Self::InvalidParameter {
            message: e.to_string(),
        }
    }
}

fn describe_selection(area_type: &str, area_name: Option<&str>) -> String {
    area_name.map_or_else(
        || format!("area type '{area_type}'"),
        |name| format!("{area_type} '{name}'"),
    )
}

fn describe_degenerate(weekday: Option<u8>, total: f64) -> String {
    weekday.map_or_else(
        || format!("weekday totals sum to {total}"),
        |day| format!("weekday {day} totals {total}, so its samples cannot be corrected"),
    )
}

/// Rejects slices that are not all the same length as `date_ordinal`.
pub(crate) fn check_aligned(
    date_ordinal: &[f64],
    series: &[(&'static str, &[f64])],
) -> Result<(), EstimationError> {
    for (name, s) in series {
        if s.len() != date_ordinal.len() {
            return Err(EstimationError::InvalidParameter {
                message: format!(
                    "'{name}' has {} entries but there are {} dates",
                    s.len(),
                    date_ordinal.len()
                ),
            });
        }
    }
    Ok(())
}

/// Rejects a date axis that goes backwards.
pub(crate) fn check_sorted(date_ordinal: &[f64]) -> Result<(), EstimationError> {
    if let Some(index) = date_ordinal
        .windows(2)
        .position(|w| w[1].partial_cmp(&w[0]).is_none_or(std::cmp::Ordering::is_lt))
    {
        return Err(EstimationError::InvalidParameter {
            message: format!("date axis is not ascending at index {}", index + 1),
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;
    use corona_stats_cases_models::AreaRecord;

    /// 2020-06-01, a Monday, plus `offset` days.
    pub fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 6, 1).unwrap() + chrono::Duration::days(offset)
    }

    pub fn record(
        area_type: &str,
        area_name: &str,
        offset: i64,
        daily: i64,
        cumulative: i64,
    ) -> AreaRecord {
        AreaRecord {
            area_type: area_type.to_string(),
            area_name: area_name.to_string(),
            specimen_date: day(offset),
            daily_count: daily,
            cumulative_count: cumulative,
        }
    }

    /// Records for one area with consecutive dates and the given daily counts.
    pub fn series(area_type: &str, area_name: &str, daily: &[i64]) -> Vec<AreaRecord> {
        let mut total = 0;
        daily
            .iter()
            .enumerate()
            .map(|(i, &d)| {
                total += d;
                record(area_type, area_name, i64::try_from(i).unwrap(), d, total)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selection_messages() {
        let e = EstimationError::EmptySelection {
            area_type: "Region".to_string(),
            area_name: Some("Atlantis".to_string()),
        };
        assert_eq!(e.to_string(), "No rows for Region 'Atlantis'");

        let e = EstimationError::EmptySelection {
            area_type: "Galaxy".to_string(),
            area_name: None,
        };
        assert_eq!(e.to_string(), "No rows for area type 'Galaxy'");
    }

    #[test]
    fn unsorted_axis_rejected() {
        assert!(check_sorted(&[1.0, 2.0, 2.0, 3.0]).is_ok());
        assert!(check_sorted(&[1.0, 3.0, 2.0]).is_err());
        assert!(check_sorted(&[1.0, f64::NAN]).is_err());
    }
}
