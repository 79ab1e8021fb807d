//! Effective reproduction number.

use corona_stats_cases_models::{Curve, Measurement, RSeries};

use crate::EstimationError;
use crate::infectious::aggregate_curve;

/// Estimates R for every date on the curve as
/// `daily * t_infectious / n_infectious`, where `n_infectious` is the
/// trailing-window sum from [`aggregate_curve`].
///
/// Errors combine through [`Measurement::divide`]. Where the window sum is
/// zero R is undefined and both R and its error are `NaN`; consumers must
/// handle these points explicitly.
///
/// No smoothing happens here: pass a smoothed curve for smoothed R.
///
/// # Errors
///
/// Returns [`EstimationError::InvalidParameter`] if `t_infectious` is not a
/// positive number of days.
pub fn calc_r(curve: &Curve, t_infectious: f64) -> Result<RSeries, EstimationError> {
    let (n_infectious, n_infectious_err) = aggregate_curve(curve, t_infectious)?;

    let (r, r_err): (Vec<f64>, Vec<f64>) = curve
        .daily()
        .iter()
        .zip(curve.daily_err())
        .zip(n_infectious.iter().zip(&n_infectious_err))
        .map(|((&daily, &daily_err), (&n, &n_err))| {
            if n == 0.0 {
                return (f64::NAN, f64::NAN);
            }
            let new_cases = Measurement::new(daily, daily_err).scale(t_infectious);
            let ratio = new_cases.divide(Measurement::new(n, n_err));
            (ratio.value, ratio.error)
        })
        .unzip();

    Ok(RSeries { r, r_err })
}
