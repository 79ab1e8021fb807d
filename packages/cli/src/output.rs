//! Plain-text tables and JSON output.

use corona_stats_server_models::{ApiCurve, ApiRPoint, ApiRSeries, ApiReport, ApiWeeklyFactor};
use serde::Serialize;

/// Pretty-prints `value` as JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_names(heading: &str, names: &[String]) {
    if names.is_empty() {
        println!("No entries found.");
        return;
    }

    println!("{heading}");
    println!("{}", "-".repeat(40));
    for name in names {
        println!("{name}");
    }
    println!("\n{} entr{}", names.len(), if names.len() == 1 { "y" } else { "ies" });
}

pub fn print_curve(curve: &ApiCurve) {
    println!("{} ({})\n", curve.area_name, curve.area_type);
    println!(
        "{:<12} {:<4} {:>20} {:>24}",
        "DATE", "DAY", "DAILY", "CUMULATIVE"
    );
    println!("{}", "-".repeat(63));

    for p in &curve.points {
        println!(
            "{:<12} {:<4} {:>20} {:>24}",
            p.date.to_string(),
            weekday_short(p.weekday),
            format_measurement(p.daily, p.daily_err),
            format_measurement(p.cumulative, p.cumulative_err),
        );
    }
}

pub fn print_r(series: &ApiRSeries) {
    println!(
        "{} ({}), infectious period {} days\n",
        series.area_name, series.area_type, series.t_infectious
    );
    println!("{:<12} {:>20} {:>20}", "DATE", "DAILY", "R");
    println!("{}", "-".repeat(54));

    for p in &series.points {
        println!(
            "{:<12} {:>20} {:>20}",
            p.date.to_string(),
            format_measurement(p.daily, p.daily_err),
            format_estimate(p),
        );
    }
}

pub fn print_weekly_factor(factor: &ApiWeeklyFactor) {
    println!("{} ({})\n", factor.area_name, factor.area_type);
    println!("{:<12} {:>20}", "WEEKDAY", "FACTOR");
    println!("{}", "-".repeat(33));

    for f in &factor.factors {
        println!(
            "{:<12} {:>20}",
            f.weekday,
            format_measurement(f.factor, f.factor_err)
        );
    }
}

/// Prints the latest defined R of every area in the report.
pub fn print_report(report: &ApiReport) {
    let window = if report.smooth {
        format!(
            "smoothed over [{}, {}] days",
            report.smoothing_window.lower_offset(),
            report.smoothing_window.upper_offset()
        )
    } else {
        "unsmoothed".to_string()
    };
    println!(
        "{}: infectious period {} days, {window}{}",
        report.area_type,
        report.t_infectious,
        if report.weekday_correction {
            ", weekday corrected"
        } else {
            ""
        }
    );
    if let Some(range) = report.date_range {
        println!("Data from {} to {}", range.from, range.to);
    }
    println!();

    println!("{:<36} {:<12} {:>20}", "AREA", "DATE", "LATEST R");
    println!("{}", "-".repeat(70));

    for area in &report.areas {
        match latest_defined(area) {
            Some(p) => println!(
                "{:<36} {:<12} {:>20}",
                area.area_name,
                p.date.to_string(),
                format_estimate(p)
            ),
            None => println!("{:<36} {:<12} {:>20}", area.area_name, "-", "-"),
        }
    }

    println!("\n{} area(s)", report.areas.len());
}

/// Last point whose R is defined.
pub fn latest_defined(series: &ApiRSeries) -> Option<&ApiRPoint> {
    series.points.iter().rev().find(|p| p.r.is_some())
}

fn format_estimate(point: &ApiRPoint) -> String {
    point.r.map_or_else(
        || "-".to_string(),
        |r| format_measurement(r, point.r_err.unwrap_or(f64::NAN)),
    )
}

fn format_measurement(value: f64, error: f64) -> String {
    if value.is_finite() {
        format!("{value:.2} ± {error:.2}")
    } else {
        "-".to_string()
    }
}

fn weekday_short(weekday: u8) -> &'static str {
    const NAMES: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
    NAMES.get(usize::from(weekday)).copied().unwrap_or("?")
}
