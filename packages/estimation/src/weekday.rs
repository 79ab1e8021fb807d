//! Day-of-week reporting bias.
//!
//! Fewer tests are processed at weekends, so raw daily counts oscillate
//! with a weekly period. The bias is estimated once from an area's whole
//! history and divided out sample by sample.

use corona_stats_cases_models::{Curve, Measurement, WEEKDAYS, WeeklyFactor};

use crate::{EstimationError, check_aligned};

/// Estimates the per-weekday reporting factor from a full daily series.
///
/// Daily values are summed per weekday (`NaN`s skipped). Each bucket's
/// share of the grand total, with Poisson errors `sqrt(total)` on both
/// numerator and denominator, is scaled by seven so that an unbiased
/// weekday has a factor of one.
///
/// # Errors
///
/// * [`EstimationError::InvalidParameter`] if the slices differ in length
///   or a weekday index is past Sunday.
/// * [`EstimationError::DegenerateHistory`] if the weekday totals sum to
///   zero or less.
pub fn estimate_weekly_factor(
    daily: &[f64],
    daily_err: &[f64],
    weekday: &[u8],
) -> Result<WeeklyFactor, EstimationError> {
    check_aligned(daily, &[("daily_err", daily_err)])?;
    if weekday.len() != daily.len() {
        return Err(EstimationError::InvalidParameter {
            message: format!(
                "'weekday' has {} entries but there are {} daily values",
                weekday.len(),
                daily.len()
            ),
        });
    }

    let mut totals = [0.0_f64; WEEKDAYS];
    for (index, (&value, &day)) in daily.iter().zip(weekday).enumerate() {
        let Some(bucket) = totals.get_mut(usize::from(day)) else {
            return Err(EstimationError::InvalidParameter {
                message: format!("weekday {day} at index {index} is not in 0..{WEEKDAYS}"),
            });
        };
        if !value.is_nan() {
            *bucket += value;
        }
    }

    let total: f64 = totals.iter().sum();
    if total.is_nan() || total <= 0.0 {
        return Err(EstimationError::DegenerateHistory {
            weekday: None,
            total,
        });
    }

    let grand = Measurement::from_count(total);
    let mut factor = [0.0; WEEKDAYS];
    let mut factor_err = [0.0; WEEKDAYS];
    for (k, &bucket) in totals.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let share = Measurement::from_count(bucket)
            .divide(grand)
            .scale(WEEKDAYS as f64);
        factor[k] = share.value;
        factor_err[k] = share.error;
    }

    log::debug!("Weekday factors: {factor:?}");

    Ok(WeeklyFactor { factor, factor_err })
}

/// [`estimate_weekly_factor`] over a curve's daily series.
///
/// # Errors
///
/// See [`estimate_weekly_factor`].
pub fn weekly_factor(curve: &Curve) -> Result<WeeklyFactor, EstimationError> {
    estimate_weekly_factor(curve.daily(), curve.daily_err(), curve.weekday())
}

/// Divides each daily sample by its weekday's factor.
///
/// Errors of the sample and of the factor combine through
/// [`Measurement::divide`]. The cumulative series is left as it is.
///
/// # Errors
///
/// * [`EstimationError::DegenerateHistory`] if a weekday that has samples
///   has a factor of zero or less. Weekdays absent from the curve may have
///   any factor.
/// * [`EstimationError::MisalignedCurve`] if the corrected curve cannot be
///   rebuilt.
pub fn correct_weekday_bias(
    curve: &Curve,
    factor: &WeeklyFactor,
) -> Result<Curve, EstimationError> {
    let mut daily = Vec::with_capacity(curve.len());
    let mut daily_err = Vec::with_capacity(curve.len());

    for ((&value, &error), &day) in curve
        .daily()
        .iter()
        .zip(curve.daily_err())
        .zip(curve.weekday())
    {
        let divisor = factor
            .factor_for(day)
            .ok_or_else(|| EstimationError::InvalidParameter {
                message: format!("weekday {day} is not in 0..{WEEKDAYS}"),
            })?;
        if !(divisor.value > 0.0 && divisor.value.is_finite()) {
            return Err(EstimationError::DegenerateHistory {
                weekday: Some(day),
                total: divisor.value,
            });
        }

        let corrected = Measurement::new(value, error).divide(divisor);
        daily.push(corrected.value);
        daily_err.push(corrected.error);
    }

    Ok(curve.with_series(
        daily,
        daily_err,
        curve.cumulative().to_vec(),
        curve.cumulative_err().to_vec(),
    )?)
}
