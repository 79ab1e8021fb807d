#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command line front end for corona stats.
//!
//! ```text
//! corona_stats area-types
//! corona_stats areas Region
//! corona_stats curve Region London [--smooth] [--window centered] [--weekday-correction]
//! corona_stats r Region London [--t-infectious 7] [--smooth=false] [--window centered]
//! corona_stats weekly-factor Region London
//! corona_stats report [Region] [--t-infectious 7] [--smooth]
//! corona_stats serve [--bind-addr 0.0.0.0] [--port 8080]
//! ```
//!
//! Every command accepts `--config <FILE>`, `--source <URL|PATH>` and
//! `--json`. `--smooth` and `--weekday-correction` take an optional
//! `=true`/`=false`, so either can switch off a setting enabled in the
//! config. Running `corona_stats` with no subcommand enters interactive
//! mode.

mod interactive;
mod output;

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};
use corona_stats_cases_models::WindowPreset;
use corona_stats_estimation::{EstimationSettings, estimate_area, estimate_area_type, weekday};
use corona_stats_server_models::{ApiCurve, ApiRSeries, ApiReport, ApiWeeklyFactor};
use corona_stats_source::DataSource;
use corona_stats_source::config::AppConfig;

#[derive(Parser)]
#[command(
    name = "corona_stats",
    about = "Case curves, weekday bias and reproduction number estimates per area"
)]
struct Cli {
    /// TOML config file (defaults to $CORONA_STATS_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Case table URL or local CSV path
    #[arg(long, global = true)]
    source: Option<DataSource>,

    /// Print JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Pipeline options shared by the estimating commands. Unset options fall
/// back to the `[estimation]` section of the config.
#[derive(Args)]
struct PipelineArgs {
    /// Days for which a case is assumed infectious
    #[arg(long)]
    t_infectious: Option<f64>,

    /// Smooth the curve before estimating
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    smooth: Option<bool>,

    /// Smoothing window: trailing, centered or none (implies --smooth)
    #[arg(long)]
    window: Option<WindowPreset>,

    /// Divide out the day-of-week reporting bias
    #[arg(
        long,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    weekday_correction: Option<bool>,
}

impl PipelineArgs {
    fn settings(&self, defaults: &EstimationSettings) -> EstimationSettings {
        EstimationSettings {
            t_infectious: self.t_infectious.unwrap_or(defaults.t_infectious),
            smooth: self
                .smooth
                .unwrap_or(defaults.smooth || self.window.is_some()),
            smoothing_window: self
                .window
                .map_or(defaults.smoothing_window, WindowPreset::window),
            weekday_correction: self
                .weekday_correction
                .unwrap_or(defaults.weekday_correction),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the area types in the case table
    AreaTypes,
    /// List the areas of one type
    Areas {
        /// Area type, e.g. Region
        area_type: String,
    },
    /// Show the case curve of one area
    Curve {
        area_type: String,
        area_name: String,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Estimate the reproduction number of one area
    R {
        area_type: String,
        area_name: String,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Show the weekday reporting bias of one area
    WeeklyFactor {
        area_type: String,
        area_name: String,
    },
    /// Latest reproduction number for every area of a type
    Report {
        /// Area type (defaults to the configured one)
        area_type: Option<String>,
        #[command(flatten)]
        pipeline: PipelineArgs,
    },
    /// Start the HTTP API server
    Serve {
        /// Address to bind to
        #[arg(long)]
        bind_addr: Option<String>,
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load(path)?.with_overrides(|key| std::env::var(key).ok()),
        None => AppConfig::from_env()?,
    };
    if let Some(source) = cli.source {
        config.source = source;
    }

    let Some(command) = cli.command else {
        return interactive::run(config).await;
    };

    if let Commands::Serve { bind_addr, port } = command {
        if let Some(bind_addr) = bind_addr {
            config.server.bind_addr = bind_addr;
        }
        if let Some(port) = port {
            config.server.port = port;
        }
        return serve(config).await;
    }

    let table = corona_stats_source::load(&config.source).await?;
    let json = cli.json;

    match command {
        Commands::AreaTypes => {
            let types = table.list_area_types();
            if json {
                output::print_json(&types)?;
            } else {
                output::print_names("AREA TYPE", &types);
            }
        }
        Commands::Areas { area_type } => {
            let areas = table.list_areas(&area_type);
            if json {
                output::print_json(&areas)?;
            } else {
                output::print_names("AREA", &areas);
            }
        }
        Commands::Curve {
            area_type,
            area_name,
            pipeline,
        } => {
            let settings = pipeline.settings(&config.estimation);
            let estimate = estimate_area(&table, &area_type, &area_name, &settings)?;
            let curve = ApiCurve::new(&area_type, &area_name, &estimate.curve);
            if json {
                output::print_json(&curve)?;
            } else {
                output::print_curve(&curve);
            }
        }
        Commands::R {
            area_type,
            area_name,
            pipeline,
        } => {
            let settings = pipeline.settings(&config.estimation);
            let estimate = estimate_area(&table, &area_type, &area_name, &settings)?;
            let series = ApiRSeries::from_estimate(&estimate, settings.t_infectious);
            if json {
                output::print_json(&series)?;
            } else {
                output::print_r(&series);
            }
        }
        Commands::WeeklyFactor {
            area_type,
            area_name,
        } => {
            let curve = table.extract(&area_type, &area_name)?;
            let factor = weekday::weekly_factor(&curve)?;
            let factor = ApiWeeklyFactor::new(&area_type, &area_name, &factor);
            if json {
                output::print_json(&factor)?;
            } else {
                output::print_weekly_factor(&factor);
            }
        }
        Commands::Report {
            area_type,
            pipeline,
        } => {
            let area_type = area_type.unwrap_or_else(|| config.area_type.clone());
            let settings = pipeline.settings(&config.estimation);
            let report = ApiReport::from(&estimate_area_type(&table, &area_type, &settings)?);
            if json {
                output::print_json(&report)?;
            } else {
                output::print_report(&report);
            }
        }
        Commands::Serve { .. } => {}
    }

    Ok(())
}

/// Runs the API server on its own actix system.
async fn serve(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    // The server uses actix-web's runtime, so run it in a blocking task to
    // avoid nesting tokio runtimes.
    tokio::task::spawn_blocking(|| {
        actix_web::rt::System::new().block_on(corona_stats_server::run_server(config))
    })
    .await??;

    Ok(())
}
