//! End-to-end estimation for one area or every area of a type.

use chrono::NaiveDate;
use corona_stats_cases_models::{Curve, RSeries, SmoothingWindow, WeeklyFactor};
use serde::{Deserialize, Serialize};

use crate::infectious::validate_t_infectious;
use crate::reproduction::calc_r;
use crate::smooth::smooth_curve;
use crate::weekday::{correct_weekday_bias, weekly_factor};
use crate::{CaseTable, EstimationError};

/// Default infectious period in days.
pub const DEFAULT_T_INFECTIOUS: f64 = 7.0;

/// User-facing knobs for a pipeline run.
///
/// Serialized in `camelCase` for the API; the `snake_case` spellings are
/// accepted too so the same struct reads from TOML config files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EstimationSettings {
    /// Days for which a case is assumed infectious.
    #[serde(alias = "t_infectious")]
    pub t_infectious: f64,
    /// Whether to smooth the curve before estimating R.
    pub smooth: bool,
    /// Window used when `smooth` is set.
    #[serde(alias = "smoothing_window")]
    pub smoothing_window: SmoothingWindow,
    /// Whether to divide out the day-of-week reporting bias.
    #[serde(alias = "weekday_correction")]
    pub weekday_correction: bool,
}

impl Default for EstimationSettings {
    fn default() -> Self {
        Self {
            t_infectious: DEFAULT_T_INFECTIOUS,
            smooth: false,
            smoothing_window: SmoothingWindow::TRAILING_WEEK,
            weekday_correction: false,
        }
    }
}

impl EstimationSettings {
    /// Checks the settings before any computation runs.
    ///
    /// # Errors
    ///
    /// Returns [`EstimationError::InvalidParameter`] if `t_infectious` is not
    /// a positive number of days.
    pub fn validate(&self) -> Result<(), EstimationError> {
        validate_t_infectious(self.t_infectious)
    }
}

/// Curve and R for one area.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaEstimate {
    pub area_type: String,
    pub area_name: String,
    /// The curve R was computed from (corrected and smoothed as requested).
    pub curve: Curve,
    /// Weekday factor divided out of `curve`, when correction was on.
    pub weekly_factor: Option<WeeklyFactor>,
    pub r: RSeries,
}

/// Estimates for every area of one type.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaTypeReport {
    pub area_type: String,
    pub settings: EstimationSettings,
    /// One entry per area, sorted by area name.
    pub areas: Vec<AreaEstimate>,
    /// Earliest and latest date over all areas.
    pub date_range: Option<(NaiveDate, NaiveDate)>,
}

/// Runs extract, optional weekday correction, optional smoothing and R
/// estimation for one area.
///
/// The weekday factor is always estimated from the raw curve, before any
/// smoothing.
///
/// # Errors
///
/// * [`EstimationError::InvalidParameter`] for invalid settings.
/// * [`EstimationError::EmptySelection`] if the area has no rows.
/// * [`EstimationError::DegenerateHistory`] if weekday correction is on and
///   the area never reported a case, or never reported on one of the
///   weekdays in its history.
pub fn estimate_area(
    table: &CaseTable,
    area_type: &str,
    area_name: &str,
    settings: &EstimationSettings,
) -> Result<AreaEstimate, EstimationError> {
    settings.validate()?;

    let raw = table.extract(area_type, area_name)?;

    let (curve, factor) = if settings.weekday_correction {
        let factor = weekly_factor(&raw)?;
        (correct_weekday_bias(&raw, &factor)?, Some(factor))
    } else {
        (raw, None)
    };

    let curve = if settings.smooth {
        smooth_curve(&curve, settings.smoothing_window)?
    } else {
        curve
    };

    let r = calc_r(&curve, settings.t_infectious)?;

    Ok(AreaEstimate {
        area_type: area_type.to_string(),
        area_name: area_name.to_string(),
        curve,
        weekly_factor: factor,
        r,
    })
}

/// Runs [`estimate_area`] for every area of `area_type`.
///
/// Any failing area fails the whole report.
///
/// # Errors
///
/// * [`EstimationError::EmptySelection`] if no area has this type.
/// * Any error from [`estimate_area`].
pub fn estimate_area_type(
    table: &CaseTable,
    area_type: &str,
    settings: &EstimationSettings,
) -> Result<AreaTypeReport, EstimationError> {
    settings.validate()?;

    let names = table.list_areas(area_type);
    if names.is_empty() {
        return Err(EstimationError::EmptySelection {
            area_type: area_type.to_string(),
            area_name: None,
        });
    }

    log::info!(
        "Estimating R for {} areas of type '{area_type}' (t_infectious = {}, smooth = {})",
        names.len(),
        settings.t_infectious,
        settings.smooth
    );

    let areas = names
        .iter()
        .map(|name| estimate_area(table, area_type, name, settings))
        .collect::<Result<Vec<_>, _>>()?;

    let date_range = areas
        .iter()
        .filter_map(|a| a.curve.date_range())
        .reduce(|(lo, hi), (a, b)| (lo.min(a), hi.max(b)));

    Ok(AreaTypeReport {
        area_type: area_type.to_string(),
        settings: *settings,
        areas,
        date_range,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{day, series};

    fn table() -> CaseTable {
        let mut records = series("Region", "London", &[10, 12, 15, 11, 9, 14, 13, 16, 18, 20]);
        records.extend(series("Region", "Bristol", &[1, 2, 3]));
        records.extend(series("Nation", "England", &[100, 120, 150]));
        CaseTable::new(records)
    }

    #[test]
    fn defaults() {
        let s = EstimationSettings::default();
        assert!((s.t_infectious - 7.0).abs() < f64::EPSILON);
        assert!(!s.smooth);
        assert!(!s.weekday_correction);
        assert_eq!(s.smoothing_window, SmoothingWindow::TRAILING_WEEK);
    }

    #[test]
    fn settings_deserialize_with_defaults() {
        let s: EstimationSettings =
            serde_json::from_str(r#"{"tInfectious": 14, "smoothingWindow": [-3.5, 3.5]}"#).unwrap();
        assert!((s.t_infectious - 14.0).abs() < f64::EPSILON);
        assert_eq!(s.smoothing_window, SmoothingWindow::CENTERED_WEEK);
        assert!(!s.smooth);
    }

    #[test]
    fn raw_estimate_matches_components() {
        let settings = EstimationSettings::default();
        let estimate = estimate_area(&table(), "Region", "London", &settings).unwrap();
        let curve = table().extract("Region", "London").unwrap();
        assert_eq!(estimate.curve, curve);
        assert_eq!(estimate.r, calc_r(&curve, 7.0).unwrap());
        assert!(estimate.weekly_factor.is_none());
    }

    #[test]
    fn smoothing_is_applied_before_r() {
        let settings = EstimationSettings {
            smooth: true,
            ..EstimationSettings::default()
        };
        let estimate = estimate_area(&table(), "Region", "London", &settings).unwrap();
        let raw = table().extract("Region", "London").unwrap();
        let smoothed = smooth_curve(&raw, SmoothingWindow::TRAILING_WEEK).unwrap();
        assert_eq!(estimate.curve, smoothed);
        assert_eq!(estimate.r, calc_r(&smoothed, 7.0).unwrap());
    }

    #[test]
    fn weekday_correction_reports_factor() {
        let settings = EstimationSettings {
            weekday_correction: true,
            ..EstimationSettings::default()
        };
        let estimate = estimate_area(&table(), "Region", "London", &settings).unwrap();
        let factor = estimate.weekly_factor.unwrap();
        assert!((factor.factor.iter().sum::<f64>() - 7.0).abs() < 1e-12);
        assert_eq!(estimate.curve.len(), 10);
    }

    #[test]
    fn invalid_settings_fail_before_lookup() {
        let settings = EstimationSettings {
            t_infectious: -1.0,
            ..EstimationSettings::default()
        };
        let err = estimate_area(&table(), "Region", "Atlantis", &settings).unwrap_err();
        assert!(matches!(err, EstimationError::InvalidParameter { .. }));
    }

    #[test]
    fn report_covers_every_area() {
        let report = estimate_area_type(&table(), "Region", &EstimationSettings::default()).unwrap();
        let names: Vec<&str> = report.areas.iter().map(|a| a.area_name.as_str()).collect();
        assert_eq!(names, vec!["Bristol", "London"]);
        assert_eq!(report.date_range, Some((day(0), day(9))));
        for area in &report.areas {
            assert_eq!(area.r.len(), area.curve.len());
        }
    }

    #[test]
    fn report_for_unknown_type() {
        let err = estimate_area_type(&table(), "Galaxy", &EstimationSettings::default()).unwrap_err();
        assert!(matches!(
            err,
            EstimationError::EmptySelection { area_name: None, .. }
        ));
    }

    #[test]
    fn degenerate_area_fails_report() {
        let mut records = series("Region", "London", &[1, 2, 3]);
        records.extend(series("Region", "Quiet", &[0, 0, 0]));
        let settings = EstimationSettings {
            weekday_correction: true,
            ..EstimationSettings::default()
        };
        let err = estimate_area_type(&CaseTable::new(records), "Region", &settings).unwrap_err();
        assert!(matches!(err, EstimationError::DegenerateHistory { .. }));
    }

    #[test]
    fn silent_sundays_fail_weekday_correction() {
        let week = [10, 10, 10, 10, 10, 10, 0];
        let daily: Vec<i64> = week.iter().copied().cycle().take(28).collect();
        let table = CaseTable::new(series("Region", "London", &daily));
        let settings = EstimationSettings {
            weekday_correction: true,
            ..EstimationSettings::default()
        };

        let err = estimate_area(&table, "Region", "London", &settings).unwrap_err();
        assert!(matches!(
            err,
            EstimationError::DegenerateHistory {
                weekday: Some(6),
                ..
            }
        ));

        let uncorrected = EstimationSettings {
            weekday_correction: false,
            ..settings
        };
        assert!(estimate_area(&table, "Region", "London", &uncorrected).is_ok());
    }

    #[test]
    fn report_serializes_nan_as_null() {
        let records = series("Region", "Quiet", &[0, 3]);
        let report =
            estimate_area_type(&CaseTable::new(records), "Region", &EstimationSettings::default())
                .unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert!(json["areas"][0]["r"]["r"][0].is_null());
        assert!(json["areas"][0]["r"]["r"][1].is_number());
    }
}
