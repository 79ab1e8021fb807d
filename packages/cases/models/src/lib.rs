#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Case-count curve, smoothing window and reproduction-number types.
//!
//! These are the plain data shapes shared by the estimation pipeline, the
//! CSV loader and the HTTP API. Values that carry an uncertainty travel as
//! [`Measurement`]s or as index-aligned `(value, error)` slices on a
//! [`Curve`].

use chrono::{Datelike as _, NaiveDate};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Number of weekday buckets (Monday = 0 ... Sunday = 6).
pub const WEEKDAYS: usize = 7;

/// Encodes a date on the continuous day axis used for windowing: whole days
/// since 1970-01-01.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn date_ordinal(date: NaiveDate) -> f64 {
    date.signed_duration_since(NaiveDate::default()).num_days() as f64
}

/// Weekday index of a date, Monday = 0 through Sunday = 6.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn weekday_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

/// A value with a one-sigma uncertainty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Central value.
    pub value: f64,
    /// Absolute uncertainty (non-negative).
    pub error: f64,
}

impl Measurement {
    /// Creates a measurement from a value and its error.
    #[must_use]
    pub const fn new(value: f64, error: f64) -> Self {
        Self { value, error }
    }

    /// A raw event count with a Poisson error of `sqrt(count)`.
    ///
    /// Negative counts (downward data revisions) keep their value but get
    /// a zero error instead of `NaN`.
    #[must_use]
    pub fn from_count(count: f64) -> Self {
        Self {
            value: count,
            error: count.max(0.0).sqrt(),
        }
    }

    /// Divides two independent measurements, propagating the errors in
    /// quadrature:
    ///
    /// `value = a / b`, `error = sqrt(aerr^2 + (a/b)^2 * berr^2) / |b|`.
    ///
    /// A zero denominator follows IEEE semantics (`inf` or `NaN`); callers
    /// that need a stricter contract handle it themselves.
    #[must_use]
    pub fn divide(self, rhs: Self) -> Self {
        let value = self.value / rhs.value;
        let error = (self.error.mul_add(self.error, value * value * rhs.error * rhs.error)).sqrt()
            / rhs.value.abs();
        Self { value, error }
    }

    /// Scales value and error by a constant.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self {
            value: self.value * factor,
            error: self.error * factor.abs(),
        }
    }
}

/// One row of the source table: a day's counts for one area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaRecord {
    /// Kind of area (e.g. "Nation", "Region", "Upper tier local authority").
    pub area_type: String,
    /// Name of the area within its type (e.g. "London").
    pub area_name: String,
    /// Date the specimen was taken.
    pub specimen_date: NaiveDate,
    /// Lab-confirmed cases on this date. Negative values are revisions.
    pub daily_count: i64,
    /// Lab-confirmed cases up to and including this date.
    pub cumulative_count: i64,
}

/// Error returned when the series handed to [`Curve::from_parts`] do not
/// line up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MisalignedCurveError {
    /// A series does not have one entry per date.
    LengthMismatch {
        /// Name of the offending series.
        field: &'static str,
        /// Number of dates.
        expected: usize,
        /// Length of the offending series.
        actual: usize,
    },
    /// `dates[index]` is not strictly after `dates[index - 1]`.
    UnorderedDates {
        /// Index of the first out-of-order date.
        index: usize,
    },
}

impl std::fmt::Display for MisalignedCurveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LengthMismatch {
                field,
                expected,
                actual,
            } => write!(
                f,
                "series '{field}' has {actual} entries but the curve has {expected} dates"
            ),
            Self::UnorderedDates { index } => {
                write!(f, "dates are not strictly increasing at index {index}")
            }
        }
    }
}

impl std::error::Error for MisalignedCurveError {}

/// Daily and cumulative case counts for one area, ordered by date.
///
/// Every series has exactly one entry per date; this is checked when the
/// curve is built and cannot be broken afterwards since the fields are
/// only reachable through slices.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Curve {
    dates: Vec<NaiveDate>,
    date_ordinal: Vec<f64>,
    weekday: Vec<u8>,
    daily: Vec<f64>,
    daily_err: Vec<f64>,
    cumulative: Vec<f64>,
    cumulative_err: Vec<f64>,
}

impl Curve {
    /// Builds a curve from its dates and value/error series.
    ///
    /// `date_ordinal` and `weekday` are derived from `dates`.
    ///
    /// # Errors
    ///
    /// Returns [`MisalignedCurveError`] if a series length differs from the
    /// number of dates or the dates are not strictly increasing.
    pub fn from_parts(
        dates: Vec<NaiveDate>,
        daily: Vec<f64>,
        daily_err: Vec<f64>,
        cumulative: Vec<f64>,
        cumulative_err: Vec<f64>,
    ) -> Result<Self, MisalignedCurveError> {
        let expected = dates.len();
        for (field, actual) in [
            ("daily", daily.len()),
            ("daily_err", daily_err.len()),
            ("cumulative", cumulative.len()),
            ("cumulative_err", cumulative_err.len()),
        ] {
            if actual != expected {
                return Err(MisalignedCurveError::LengthMismatch {
                    field,
                    expected,
                    actual,
                });
            }
        }

        if let Some(index) = dates.windows(2).position(|w| w[1] <= w[0]) {
            return Err(MisalignedCurveError::UnorderedDates { index: index + 1 });
        }

        Ok(Self {
            date_ordinal: dates.iter().copied().map(date_ordinal).collect(),
            weekday: dates.iter().copied().map(weekday_index).collect(),
            dates,
            daily,
            daily_err,
            cumulative,
            cumulative_err,
        })
    }

    /// Returns a copy of this curve on the same dates with new daily and
    /// cumulative series.
    ///
    /// # Errors
    ///
    /// Returns [`MisalignedCurveError`] if any series has the wrong length.
    pub fn with_series(
        &self,
        daily: Vec<f64>,
        daily_err: Vec<f64>,
        cumulative: Vec<f64>,
        cumulative_err: Vec<f64>,
    ) -> Result<Self, MisalignedCurveError> {
        Self::from_parts(
            self.dates.clone(),
            daily,
            daily_err,
            cumulative,
            cumulative_err,
        )
    }

    /// Specimen dates, strictly increasing.
    #[must_use]
    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    /// Dates as days since 1970-01-01.
    #[must_use]
    pub fn date_ordinal(&self) -> &[f64] {
        &self.date_ordinal
    }

    /// Weekday of each date (Monday = 0).
    #[must_use]
    pub fn weekday(&self) -> &[u8] {
        &self.weekday
    }

    #[must_use]
    pub fn daily(&self) -> &[f64] {
        &self.daily
    }

    #[must_use]
    pub fn daily_err(&self) -> &[f64] {
        &self.daily_err
    }

    #[must_use]
    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    #[must_use]
    pub fn cumulative_err(&self) -> &[f64] {
        &self.cumulative_err
    }

    /// Number of dates on the curve.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.dates.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    /// First and last date, or `None` for an empty curve.
    #[must_use]
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((*self.dates.first()?, *self.dates.last()?))
    }
}

/// Error returned for a smoothing window that does not contain its own
/// centre.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InvalidWindowError {
    /// Requested lower offset.
    pub lower_offset: f64,
    /// Requested upper offset.
    pub upper_offset: f64,
}

impl std::fmt::Display for InvalidWindowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid smoothing window [{}, {}]: expected finite bounds with lower <= 0 <= upper",
            self.lower_offset, self.upper_offset
        )
    }
}

impl std::error::Error for InvalidWindowError {}

/// Day offsets around a sample that are averaged together when smoothing.
///
/// A sample at `t` is in the window centred on `c` when
/// `c + lower_offset < t <= c + upper_offset`. The lower bound is strict
/// and the upper bound inclusive so neighbouring windows share no
/// boundary date.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct SmoothingWindow {
    lower_offset: f64,
    upper_offset: f64,
}

impl SmoothingWindow {
    /// The previous seven days, ending on the sample itself.
    pub const TRAILING_WEEK: Self = Self {
        lower_offset: -7.0,
        upper_offset: 0.0,
    };

    /// Three and a half days either side of the sample.
    pub const CENTERED_WEEK: Self = Self {
        lower_offset: -3.5,
        upper_offset: 3.5,
    };

    /// Selects only the sample itself; smoothing with it is a no-op.
    pub const IDENTITY: Self = Self {
        lower_offset: 0.0,
        upper_offset: 0.0,
    };

    /// Creates a window from day offsets.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidWindowError`] unless both offsets are finite and
    /// `lower_offset <= 0 <= upper_offset`.
    pub fn new(lower_offset: f64, upper_offset: f64) -> Result<Self, InvalidWindowError> {
        if lower_offset.is_finite()
            && upper_offset.is_finite()
            && lower_offset <= 0.0
            && upper_offset >= 0.0
        {
            Ok(Self {
                lower_offset,
                upper_offset,
            })
        } else {
            Err(InvalidWindowError {
                lower_offset,
                upper_offset,
            })
        }
    }

    #[must_use]
    pub const fn lower_offset(&self) -> f64 {
        self.lower_offset
    }

    #[must_use]
    pub const fn upper_offset(&self) -> f64 {
        self.upper_offset
    }

    /// Whether a sample at `t` falls in the window centred on `center`.
    #[must_use]
    pub fn contains(&self, center: f64, t: f64) -> bool {
        t > center + self.lower_offset && t <= center + self.upper_offset
    }
}

impl Default for SmoothingWindow {
    fn default() -> Self {
        Self::TRAILING_WEEK
    }
}

impl TryFrom<[f64; 2]> for SmoothingWindow {
    type Error = InvalidWindowError;

    fn try_from([lower, upper]: [f64; 2]) -> Result<Self, Self::Error> {
        Self::new(lower, upper)
    }
}

impl From<SmoothingWindow> for [f64; 2] {
    fn from(window: SmoothingWindow) -> Self {
        [window.lower_offset, window.upper_offset]
    }
}

/// Named smoothing windows accepted on the command line and the API.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum WindowPreset {
    /// [`SmoothingWindow::TRAILING_WEEK`]
    Trailing,
    /// [`SmoothingWindow::CENTERED_WEEK`]
    Centered,
    /// [`SmoothingWindow::IDENTITY`]
    #[serde(rename = "none")]
    #[strum(serialize = "none")]
    Identity,
}

impl WindowPreset {
    /// Returns the window this preset stands for.
    #[must_use]
    pub const fn window(self) -> SmoothingWindow {
        match self {
            Self::Trailing => SmoothingWindow::TRAILING_WEEK,
            Self::Centered => SmoothingWindow::CENTERED_WEEK,
            Self::Identity => SmoothingWindow::IDENTITY,
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Trailing, Self::Centered, Self::Identity]
    }
}

/// Per-weekday multiplicative reporting bias.
///
/// A factor above one means that weekday reports more cases than an
/// average day. The seven factors sum to seven.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyFactor {
    /// Factor per weekday, Monday first.
    pub factor: [f64; WEEKDAYS],
    /// Uncertainty of each factor.
    pub factor_err: [f64; WEEKDAYS],
}

impl WeeklyFactor {
    /// The factor for a weekday index (Monday = 0) as a [`Measurement`],
    /// `None` past Sunday.
    #[must_use]
    pub fn factor_for(&self, weekday: u8) -> Option<Measurement> {
        let k = usize::from(weekday);
        Some(Measurement::new(
            *self.factor.get(k)?,
            *self.factor_err.get(k)?,
        ))
    }
}

/// Effective reproduction number per date, index-aligned with the curve it
/// was derived from. Undefined dates hold `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RSeries {
    /// Estimated R.
    pub r: Vec<f64>,
    /// Uncertainty of R.
    pub r_err: Vec<f64>,
}

impl RSeries {
    #[must_use]
    pub const fn len(&self) -> usize {
        self.r.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.r.is_empty()
    }

    /// The estimate at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Measurement> {
        Some(Measurement::new(
            *self.r.get(index)?,
            *self.r_err.get(index)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 6, d).unwrap()
    }

    #[test]
    fn divide_without_errors() {
        let q = Measurement::new(10.0, 0.0).divide(Measurement::new(5.0, 0.0));
        assert!((q.value - 2.0).abs() < 1e-12);
        assert!(q.error.abs() < 1e-12);
    }

    #[test]
    fn divide_scales_numerator_error_when_denominator_exact() {
        let q = Measurement::new(10.0, 1.0).divide(Measurement::new(5.0, 0.0));
        assert!((q.error - 0.2).abs() < 1e-12);
    }

    #[test]
    fn divide_combines_both_errors() {
        let q = Measurement::new(6.0, 3.0).divide(Measurement::new(2.0, 1.0));
        // sqrt(9 + 9 * 1) / 2
        assert!((q.value - 3.0).abs() < 1e-12);
        assert!((q.error - 18.0_f64.sqrt() / 2.0).abs() < 1e-12);
    }

    #[test]
    fn divide_by_zero_is_not_finite() {
        let q = Measurement::new(0.0, 0.0).divide(Measurement::new(0.0, 0.0));
        assert!(q.value.is_nan());
        let q = Measurement::new(3.0, 1.0).divide(Measurement::new(0.0, 0.0));
        assert!(q.value.is_infinite());
    }

    #[test]
    fn negative_count_has_zero_error() {
        let m = Measurement::from_count(-4.0);
        assert!((m.value + 4.0).abs() < f64::EPSILON);
        assert!(m.error.abs() < f64::EPSILON);
        assert!((Measurement::from_count(16.0).error - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn ordinal_and_weekday_encoding() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert!(date_ordinal(epoch).abs() < f64::EPSILON);
        // 2020-06-01 was a Monday.
        assert_eq!(weekday_index(day(1)), 0);
        assert_eq!(weekday_index(day(7)), 6);
        assert!((date_ordinal(day(2)) - date_ordinal(day(1)) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn curve_rejects_length_mismatch() {
        let err = Curve::from_parts(
            vec![day(1), day(2)],
            vec![1.0, 2.0],
            vec![1.0],
            vec![1.0, 3.0],
            vec![1.0, 1.7],
        )
        .unwrap_err();
        assert_eq!(
            err,
            MisalignedCurveError::LengthMismatch {
                field: "daily_err",
                expected: 2,
                actual: 1,
            }
        );
    }

    #[test]
    fn curve_rejects_repeated_date() {
        let err = Curve::from_parts(
            vec![day(1), day(2), day(2)],
            vec![0.0; 3],
            vec![0.0; 3],
            vec![0.0; 3],
            vec![0.0; 3],
        )
        .unwrap_err();
        assert_eq!(err, MisalignedCurveError::UnorderedDates { index: 2 });
    }

    #[test]
    fn curve_derives_axes() {
        let curve = Curve::from_parts(
            vec![day(1), day(3)],
            vec![1.0, 2.0],
            vec![1.0, 2.0_f64.sqrt()],
            vec![1.0, 3.0],
            vec![1.0, 3.0_f64.sqrt()],
        )
        .unwrap();
        assert_eq!(curve.len(), 2);
        assert_eq!(curve.weekday(), &[0, 2]);
        assert!((curve.date_ordinal()[1] - curve.date_ordinal()[0] - 2.0).abs() < f64::EPSILON);
        assert_eq!(curve.date_range(), Some((day(1), day(3))));
    }

    #[test]
    fn window_validation() {
        assert!(SmoothingWindow::new(-7.0, 0.0).is_ok());
        assert!(SmoothingWindow::new(0.0, 0.0).is_ok());
        assert!(SmoothingWindow::new(1.0, 2.0).is_err());
        assert!(SmoothingWindow::new(-2.0, -1.0).is_err());
        assert!(SmoothingWindow::new(f64::NAN, 1.0).is_err());
    }

    #[test]
    fn window_bounds_are_half_open() {
        let w = SmoothingWindow::TRAILING_WEEK;
        assert!(w.contains(10.0, 10.0));
        assert!(w.contains(10.0, 3.5));
        assert!(!w.contains(10.0, 3.0));
        assert!(!w.contains(10.0, 11.0));
    }

    #[test]
    fn window_deserializes_from_pair() {
        let w: SmoothingWindow = serde_json::from_str("[-3.5, 3.5]").unwrap();
        assert_eq!(w, SmoothingWindow::CENTERED_WEEK);
        assert!(serde_json::from_str::<SmoothingWindow>("[2.0, 3.0]").is_err());
    }

    #[test]
    fn preset_parsing() {
        for preset in WindowPreset::all() {
            let parsed: WindowPreset = preset.to_string().parse().unwrap();
            assert_eq!(parsed, *preset);
        }
        assert_eq!(
            "centered".parse::<WindowPreset>().unwrap().window(),
            SmoothingWindow::CENTERED_WEEK
        );
        assert_eq!(
            "none".parse::<WindowPreset>().unwrap(),
            WindowPreset::Identity
        );
        assert_eq!(WindowPreset::Identity.to_string(), "none");
    }

    #[test]
    fn weekly_factor_stops_at_sunday() {
        let wf = WeeklyFactor {
            factor: [0.5, 1.0, 1.0, 1.0, 1.0, 1.0, 1.5],
            factor_err: [0.1; WEEKDAYS],
        };
        assert!((wf.factor_for(0).unwrap().value - 0.5).abs() < f64::EPSILON);
        assert!((wf.factor_for(6).unwrap().value - 1.5).abs() < f64::EPSILON);
        assert_eq!(wf.factor_for(7), None);
    }
}
