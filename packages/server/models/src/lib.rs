#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the corona stats server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the estimation types so the API contract can evolve on its own:
//! series are flattened into one object per date, which is what chart
//! renderers consume. Undefined values (`NaN`) serialize as `null`.

use chrono::NaiveDate;
use corona_stats_cases_models::{Curve, RSeries, SmoothingWindow, WeeklyFactor, WindowPreset};
use corona_stats_estimation::{AreaEstimate, AreaTypeReport};
use serde::{Deserialize, Serialize};

/// Weekday names, Monday first, matching the weekday index encoding.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Rows in the current case table snapshot.
    pub records: usize,
}

/// Error body returned with every non-2xx response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
}

/// Areas of one type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAreaList {
    pub area_type: String,
    /// Area names, sorted.
    pub areas: Vec<String>,
}

/// Query parameters shared by the per-area endpoints.
///
/// Unset pipeline options fall back to the server's configured defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaQueryParams {
    /// Area type, e.g. `Region`.
    pub area_type: String,
    /// Area name. Required by every endpoint except `/report`.
    pub area_name: Option<String>,
    /// Infectious period in days.
    pub t_infectious: Option<f64>,
    /// Whether to smooth before estimating.
    pub smooth: Option<bool>,
    /// Smoothing window preset. Implies `smooth=true` when given alone.
    pub window: Option<WindowPreset>,
    /// Whether to divide out the weekday reporting bias.
    pub weekday_correction: Option<bool>,
}

/// Query parameters for `/areas`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaTypeQueryParams {
    pub area_type: String,
}

/// One date of a case curve.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCurvePoint {
    pub date: NaiveDate,
    /// Monday = 0.
    pub weekday: u8,
    pub daily: f64,
    pub daily_err: f64,
    pub cumulative: f64,
    pub cumulative_err: f64,
}

/// A case curve for one area.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCurve {
    pub area_type: String,
    pub area_name: String,
    pub points: Vec<ApiCurvePoint>,
}

impl ApiCurve {
    #[must_use]
    pub fn new(area_type: &str, area_name: &str, curve: &Curve) -> Self {
        let points = (0..curve.len())
            .map(|i| ApiCurvePoint {
                date: curve.dates()[i],
                weekday: curve.weekday()[i],
                daily: curve.daily()[i],
                daily_err: curve.daily_err()[i],
                cumulative: curve.cumulative()[i],
                cumulative_err: curve.cumulative_err()[i],
            })
            .collect();

        Self {
            area_type: area_type.to_string(),
            area_name: area_name.to_string(),
            points,
        }
    }
}

/// One date of an R series, with the daily count it was computed from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRPoint {
    pub date: NaiveDate,
    pub daily: f64,
    pub daily_err: f64,
    /// `None` (`null`) where no cases fell in the infectious window.
    pub r: Option<f64>,
    pub r_err: Option<f64>,
}

/// Reproduction number series for one area.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRSeries {
    pub area_type: String,
    pub area_name: String,
    pub t_infectious: f64,
    pub points: Vec<ApiRPoint>,
}

impl ApiRSeries {
    /// Zips `curve` with the R series computed from it.
    ///
    /// `r` must be index-aligned with `curve`; extra entries on either side
    /// are dropped. Non-finite estimates become `None`.
    #[must_use]
    pub fn new(
        area_type: &str,
        area_name: &str,
        t_infectious: f64,
        curve: &Curve,
        r: &RSeries,
    ) -> Self {
        let points = (0..curve.len())
            .map_while(|i| {
                let estimate = r.get(i)?;
                Some(ApiRPoint {
                    date: curve.dates()[i],
                    daily: curve.daily()[i],
                    daily_err: curve.daily_err()[i],
                    r: defined(estimate.value),
                    r_err: defined(estimate.error),
                })
            })
            .collect();

        Self {
            area_type: area_type.to_string(),
            area_name: area_name.to_string(),
            t_infectious,
            points,
        }
    }
}

fn defined(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

impl ApiRSeries {
    /// Series of one pipeline estimate.
    #[must_use]
    pub fn from_estimate(estimate: &AreaEstimate, t_infectious: f64) -> Self {
        Self::new(
            &estimate.area_type,
            &estimate.area_name,
            t_infectious,
            &estimate.curve,
            &estimate.r,
        )
    }
}

/// Reporting bias of one weekday.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiWeekdayFactor {
    pub weekday: String,
    pub factor: f64,
    pub factor_err: f64,
}

/// Weekday reporting bias for one area.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiWeeklyFactor {
    pub area_type: String,
    pub area_name: String,
    /// Seven entries, Monday first.
    pub factors: Vec<ApiWeekdayFactor>,
}

impl ApiWeeklyFactor {
    #[must_use]
    pub fn new(area_type: &str, area_name: &str, factor: &WeeklyFactor) -> Self {
        let factors = WEEKDAY_NAMES
            .iter()
            .zip(factor.factor.iter().zip(&factor.factor_err))
            .map(|(name, (&f, &err))| ApiWeekdayFactor {
                weekday: (*name).to_string(),
                factor: f,
                factor_err: err,
            })
            .collect();

        Self {
            area_type: area_type.to_string(),
            area_name: area_name.to_string(),
            factors,
        }
    }
}

/// Inclusive date range.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ApiDateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

/// R for every area of one type.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReport {
    pub area_type: String,
    pub t_infectious: f64,
    pub smooth: bool,
    /// Smoothing window as `[lower, upper]` day offsets.
    pub smoothing_window: SmoothingWindow,
    pub weekday_correction: bool,
    pub date_range: Option<ApiDateRange>,
    /// One series per area, sorted by area name.
    pub areas: Vec<ApiRSeries>,
}

impl From<&AreaTypeReport> for ApiReport {
    fn from(report: &AreaTypeReport) -> Self {
        let settings = &report.settings;
        Self {
            area_type: report.area_type.clone(),
            t_infectious: settings.t_infectious,
            smooth: settings.smooth,
            smoothing_window: settings.smoothing_window,
            weekday_correction: settings.weekday_correction,
            date_range: report
                .date_range
                .map(|(from, to)| ApiDateRange { from, to }),
            areas: report
                .areas
                .iter()
                .map(|a| ApiRSeries::from_estimate(a, settings.t_infectious))
                .collect(),
        }
    }
}

/// Result of reloading the case table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRefresh {
    pub records: usize,
    pub area_types: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve() -> Curve {
        let d0 = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
        let dates = vec![d0, d0.succ_opt().unwrap()];
        Curve::from_parts(
            dates,
            vec![4.0, 0.0],
            vec![2.0, 0.0],
            vec![4.0, 4.0],
            vec![2.0, 2.0],
        )
        .unwrap()
    }

    #[test]
    fn curve_points_are_camel_case() {
        let json = serde_json::to_value(ApiCurve::new("Region", "London", &curve())).unwrap();
        assert_eq!(json["areaName"], "London");
        assert_eq!(json["points"][0]["date"], "2020-06-01");
        assert_eq!(json["points"][0]["dailyErr"], 2.0);
        assert_eq!(json["points"][1]["weekday"], 1);
    }

    #[test]
    fn undefined_r_is_null() {
        let r = RSeries {
            r: vec![f64::NAN, 1.5],
            r_err: vec![f64::NAN, 0.5],
        };
        let series = ApiRSeries::new("Region", "London", 7.0, &curve(), &r);
        let json = serde_json::to_value(&series).unwrap();
        assert!(json["points"][0]["r"].is_null());
        assert!(json["points"][0]["rErr"].is_null());
        assert_eq!(json["points"][1]["r"], 1.5);
        assert_eq!(json["tInfectious"], 7.0);
    }

    #[test]
    fn undefined_r_reads_back() {
        let r = RSeries {
            r: vec![f64::NAN, 1.5],
            r_err: vec![f64::NAN, 0.5],
        };
        let series = ApiRSeries::new("Region", "London", 7.0, &curve(), &r);
        let text = serde_json::to_string(&series).unwrap();

        let parsed: ApiRSeries = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed.points.len(), 2);
        assert_eq!(parsed.points[0].r, None);
        assert_eq!(parsed.points[0].r_err, None);
        assert_eq!(parsed.points[1].r, Some(1.5));
        assert_eq!(parsed.points[1].r_err, Some(0.5));
    }

    #[test]
    fn short_r_series_truncates_points() {
        let r = RSeries {
            r: vec![2.0],
            r_err: vec![0.5],
        };
        let series = ApiRSeries::new("Region", "London", 7.0, &curve(), &r);
        assert_eq!(series.points.len(), 1);
    }

    #[test]
    fn weekly_factor_is_labelled() {
        let factor = WeeklyFactor {
            factor: [1.75, 0.875, 0.875, 0.875, 0.875, 0.875, 0.875],
            factor_err: [0.1; 7],
        };
        let api = ApiWeeklyFactor::new("Region", "London", &factor);
        assert_eq!(api.factors.len(), 7);
        assert_eq!(api.factors[0].weekday, "Monday");
        assert!((api.factors[0].factor - 1.75).abs() < f64::EPSILON);
        assert_eq!(api.factors[6].weekday, "Sunday");
    }

    #[test]
    fn query_params_accept_presets() {
        let params: AreaQueryParams = serde_json::from_str(
            r#"{"areaType": "Region", "areaName": "London", "window": "centered", "tInfectious": 5}"#,
        )
        .unwrap();
        assert_eq!(params.window, Some(WindowPreset::Centered));
        assert_eq!(params.t_infectious, Some(5.0));
        assert!(params.smooth.is_none());
    }

    #[test]
    fn report_carries_settings() {
        use corona_stats_cases_models::AreaRecord;
        use corona_stats_estimation::{CaseTable, EstimationSettings, estimate_area_type};

        let d0 = NaiveDate::from_ymd_opt(2020, 6, 1).unwrap();
        let records = ["Bristol", "London"]
            .iter()
            .flat_map(|name| {
                [(d0, 2, 2), (d0.succ_opt().unwrap(), 3, 5)].map(|(date, daily, cumulative)| {
                    AreaRecord {
                        area_type: "Region".to_string(),
                        area_name: (*name).to_string(),
                        specimen_date: date,
                        daily_count: daily,
                        cumulative_count: cumulative,
                    }
                })
            })
            .collect();
        let settings = EstimationSettings {
            t_infectious: 4.0,
            ..EstimationSettings::default()
        };
        let report = estimate_area_type(&CaseTable::new(records), "Region", &settings).unwrap();

        let api = ApiReport::from(&report);
        assert!((api.t_infectious - 4.0).abs() < f64::EPSILON);
        assert_eq!(api.areas.len(), 2);
        assert!((api.areas[1].t_infectious - 4.0).abs() < f64::EPSILON);
        assert_eq!(api.areas[1].points.len(), 2);
        let range = api.date_range.unwrap();
        assert_eq!((range.from, range.to), (d0, d0.succ_opt().unwrap()));
    }
}
