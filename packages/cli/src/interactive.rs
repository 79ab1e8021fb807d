//! Interactive mode.
//!
//! Loads the case table once, then lets the user pick an area type,
//! infectious period and smoothing and prints the R report, or start the
//! API server.

use corona_stats_cases_models::SmoothingWindow;
use corona_stats_estimation::{CaseTable, EstimationSettings, estimate_area_type};
use corona_stats_server_models::ApiReport;
use corona_stats_source::config::AppConfig;
use dialoguer::{Confirm, Select};

use crate::output;

/// Selectable infectious periods in days.
const T_INFECTIOUS_CHOICES: std::ops::RangeInclusive<u8> = 1..=21;

/// Top-level actions in the interactive menu.
enum Action {
    Report,
    Serve,
}

impl Action {
    const ALL: &[Self] = &[Self::Report, Self::Serve];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Report => "Estimate R for an area type",
            Self::Serve => "Start server",
        }
    }
}

/// Runs the interactive menu.
///
/// # Errors
///
/// Returns an error if loading the case table, a prompt, or the estimation
/// fails.
pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("Corona Stats");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Action::ALL[idx] {
        Action::Report => {
            let table = corona_stats_source::load(&config.source).await?;
            handle_report(&table, &config)?;
        }
        Action::Serve => {
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new()
                    .block_on(corona_stats_server::interactive::run(config))
            })
            .await??;
        }
    }

    Ok(())
}

/// Prompts for report settings, prints the report and offers to run
/// another.
fn handle_report(
    table: &CaseTable,
    config: &AppConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let area_types = table.list_area_types();
    if area_types.is_empty() {
        println!("The case table is empty.");
        return Ok(());
    }

    loop {
        let settings = prompt_settings(config.estimation)?;

        let default_type = area_types
            .iter()
            .position(|t| *t == config.area_type)
            .unwrap_or(0);
        let type_idx = Select::new()
            .with_prompt("Area type")
            .items(&area_types)
            .default(default_type)
            .interact()?;

        match estimate_area_type(table, &area_types[type_idx], &settings) {
            Ok(report) => output::print_report(&ApiReport::from(&report)),
            Err(e) => {
                log::error!("Estimation failed: {e}");
                println!("Estimation failed: {e}");
            }
        }

        println!();
        if !Confirm::new()
            .with_prompt("Run another report?")
            .default(false)
            .interact()?
        {
            return Ok(());
        }
    }
}

fn prompt_settings(
    defaults: EstimationSettings,
) -> Result<EstimationSettings, Box<dyn std::error::Error>> {
    let choices: Vec<String> = T_INFECTIOUS_CHOICES
        .map(|days| format!("{days} day{}", if days == 1 { "" } else { "s" }))
        .collect();
    let default_days = T_INFECTIOUS_CHOICES
        .position(|days| (f64::from(days) - defaults.t_infectious).abs() < f64::EPSILON)
        .unwrap_or(6);
    let days_idx = Select::new()
        .with_prompt("Infectious period")
        .items(&choices)
        .default(default_days)
        .interact()?;
    let t_infectious = T_INFECTIOUS_CHOICES
        .nth(days_idx)
        .map_or(defaults.t_infectious, f64::from);

    let smooth = Confirm::new()
        .with_prompt("Smooth over a centred week?")
        .default(defaults.smooth)
        .interact()?;

    let weekday_correction = Confirm::new()
        .with_prompt("Correct weekday reporting bias?")
        .default(defaults.weekday_correction)
        .interact()?;

    Ok(EstimationSettings {
        t_infectious,
        smooth,
        smoothing_window: if smooth {
            SmoothingWindow::CENTERED_WEEK
        } else {
            defaults.smoothing_window
        },
        weekday_correction,
    })
}
