#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone entry point for the corona stats API server.
//!
//! Configuration is read from the file named by `CORONA_STATS_CONFIG`,
//! with `CORONA_STATS_SOURCE`, `BIND_ADDR` and `PORT` overrides.

use corona_stats_source::config::AppConfig;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let config = AppConfig::from_env().map_err(std::io::Error::other)?;

    corona_stats_server::run_server(config).await
}
