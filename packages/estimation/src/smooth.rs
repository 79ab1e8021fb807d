//! Windowed moving average with error propagation.

use corona_stats_cases_models::{Curve, SmoothingWindow};

use crate::{EstimationError, check_aligned, check_sorted};

/// Averages `value` over a [`SmoothingWindow`] around every sample.
///
/// Sample `j` is averaged into sample `i` when
/// `t_i + lower < t_j <= t_i + upper`; sample `i` itself is always
/// included, so the identity window `[0, 0]` returns the input unchanged.
/// The error of each mean is `sqrt(sum(err_j^2)) / k` for a selection of
/// `k` samples. `NaN` inputs propagate into every window containing them.
///
/// `date_ordinal` must be ascending.
///
/// # Errors
///
/// Returns [`EstimationError::InvalidParameter`] if the slices differ in
/// length or the date axis is not ascending.
pub fn smooth(
    date_ordinal: &[f64],
    value: &[f64],
    value_err: &[f64],
    window: SmoothingWindow,
) -> Result<(Vec<f64>, Vec<f64>), EstimationError> {
    check_aligned(date_ordinal, &[("value", value), ("value_err", value_err)])?;
    check_sorted(date_ordinal)?;

    let mut smoothed = Vec::with_capacity(value.len());
    let mut smoothed_err = Vec::with_capacity(value.len());

    for (i, &t) in date_ordinal.iter().enumerate() {
        let lo = date_ordinal.partition_point(|&x| x <= t + window.lower_offset());
        let hi = date_ordinal.partition_point(|&x| x <= t + window.upper_offset());
        let in_window = lo..hi.max(lo);
        debug_assert!(
            in_window
                .clone()
                .all(|j| window.contains(t, date_ordinal[j])),
            "selection around index {i} reaches outside the window"
        );
        // The centre sits outside the half-open window when lower is zero.
        let centre = (!in_window.contains(&i)).then_some(i);

        #[allow(clippy::cast_precision_loss)]
        let k = (in_window.len() + usize::from(centre.is_some())) as f64;
        let sum: f64 = value[in_window.clone()]
            .iter()
            .chain(centre.map(|c| &value[c]))
            .sum();
        let sum_sq_err: f64 = value_err[in_window]
            .iter()
            .chain(centre.map(|c| &value_err[c]))
            .map(|e| e * e)
            .sum();

        smoothed.push(sum / k);
        smoothed_err.push(sum_sq_err.sqrt() / k);
    }

    Ok((smoothed, smoothed_err))
}

/// Smooths both the daily and the cumulative series of a curve.
///
/// # Errors
///
/// Propagates any error from [`smooth`].
pub fn smooth_curve(curve: &Curve, window: SmoothingWindow) -> Result<Curve, EstimationError> {
    let (daily, daily_err) = smooth(
        curve.date_ordinal(),
        curve.daily(),
        curve.daily_err(),
        window,
    )?;
    let (cumulative, cumulative_err) = smooth(
        curve.date_ordinal(),
        curve.cumulative(),
        curve.cumulative_err(),
        window,
    )?;

    log::trace!(
        "Smoothed {} samples over [{}, {}]",
        curve.len(),
        window.lower_offset(),
        window.upper_offset()
    );

    Ok(curve.with_series(daily, daily_err, cumulative, cumulative_err)?)
}
