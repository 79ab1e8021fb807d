//! Trailing-window estimate of the currently infectious population.

use corona_stats_cases_models::Curve;

use crate::{EstimationError, check_aligned, check_sorted};

/// Rejects infectious periods that are not finite and positive.
///
/// # Errors
///
/// Returns [`EstimationError::InvalidParameter`] for `t_infectious <= 0`,
/// `NaN` or infinity.
pub fn validate_t_infectious(t_infectious: f64) -> Result<(), EstimationError> {
    if t_infectious.is_finite() && t_infectious > 0.0 {
        Ok(())
    } else {
        Err(EstimationError::InvalidParameter {
            message: format!("t_infectious must be a positive number of days, got {t_infectious}"),
        })
    }
}

/// Sums daily cases over the closed window `[t - t_infectious, t]` ending
/// at every sample.
///
/// The error is the root-mean-square of the per-sample errors in the
/// window, not their quadrature sum. That is a known approximation: it
/// understates the uncertainty of a sum of independent counts.
///
/// `date_ordinal` must be ascending.
///
/// # Errors
///
/// Returns [`EstimationError::InvalidParameter`] if `t_infectious` is not
/// positive, the slices differ in length or the date axis is not ascending.
pub fn aggregate_infectious(
    date_ordinal: &[f64],
    daily: &[f64],
    daily_err: &[f64],
    t_infectious: f64,
) -> Result<(Vec<f64>, Vec<f64>), EstimationError> {
    validate_t_infectious(t_infectious)?;
    check_aligned(date_ordinal, &[("daily", daily), ("daily_err", daily_err)])?;
    check_sorted(date_ordinal)?;

    let mut n_infectious = Vec::with_capacity(daily.len());
    let mut n_infectious_err = Vec::with_capacity(daily.len());

    for &t in date_ordinal {
        let lo = date_ordinal.partition_point(|&x| x < t - t_infectious);
        let hi = date_ordinal.partition_point(|&x| x <= t);
        let selection = lo..hi;

        #[allow(clippy::cast_precision_loss)]
        let k = selection.len() as f64;
        let sum: f64 = daily[selection.clone()].iter().sum();
        let mean_sq_err = daily_err[selection].iter().map(|e| e * e).sum::<f64>() / k;

        n_infectious.push(sum);
        n_infectious_err.push(mean_sq_err.sqrt());
    }

    Ok((n_infectious, n_infectious_err))
}

/// [`aggregate_infectious`] over a curve's daily series.
///
/// # Errors
///
/// See [`aggregate_infectious`].
pub fn aggregate_curve(
    curve: &Curve,
    t_infectious: f64,
) -> Result<(Vec<f64>, Vec<f64>), EstimationError> {
    aggregate_infectious(
        curve.date_ordinal(),
        curve.daily(),
        curve.daily_err(),
        t_infectious,
    )
}
