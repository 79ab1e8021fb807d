#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Case table loading and application configuration.
//!
//! The case table is read once per load from a local CSV file or a single
//! HTTP download and handed to the estimation pipeline as an immutable
//! [`CaseTable`] snapshot.

pub mod config;
pub mod csv_download;
pub mod parsing;

use std::path::PathBuf;
use std::str::FromStr;

use corona_stats_estimation::CaseTable;
use serde::{Deserialize, Serialize};

/// Default case table: the UK government's lab-confirmed cases CSV.
pub const DEFAULT_SOURCE_URL: &str =
    "https://coronavirus.data.gov.uk/downloads/csv/coronavirus-cases_latest.csv";

/// Errors that can occur while loading the case table or configuration.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file could not be parsed.
    #[error("Config error: {0}")]
    Config(#[from] toml::de::Error),

    /// A required CSV column is absent.
    #[error("Missing required column '{column}'")]
    MissingColumn {
        /// Header name that was not found.
        column: String,
    },
}

/// Where the case table comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Downloaded over HTTP(S).
    Url(String),
    /// Read from a local file.
    File(PathBuf),
}

impl Default for DataSource {
    fn default() -> Self {
        Self::Url(DEFAULT_SOURCE_URL.to_string())
    }
}

impl FromStr for DataSource {
    type Err = std::convert::Infallible;

    /// `http://` and `https://` strings are URLs, anything else a path.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(Self::Url(s.to_string()))
        } else {
            Ok(Self::File(PathBuf::from(s)))
        }
    }
}

impl std::fmt::Display for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Url(url) => write!(f, "{url}"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Loads the case table from a [`DataSource`].
///
/// # Errors
///
/// Returns [`SourceError`] if the download, file read or CSV parse fails.
pub async fn load(source: &DataSource) -> Result<CaseTable, SourceError> {
    let table = match source {
        DataSource::Url(url) => csv_download::fetch_cases_csv(url).await?,
        DataSource::File(path) => csv_download::load_cases_csv(path)?,
    };

    log::info!(
        "Loaded {} rows covering {} area types from {source}",
        table.len(),
        table.list_area_types().len()
    );

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_data_source() {
        assert_eq!(
            "https://example.org/cases.csv".parse::<DataSource>().unwrap(),
            DataSource::Url("https://example.org/cases.csv".to_string())
        );
        assert_eq!(
            "data/cases.csv".parse::<DataSource>().unwrap(),
            DataSource::File(PathBuf::from("data/cases.csv"))
        );
    }

    #[test]
    fn default_source_is_government_csv() {
        assert_eq!(
            DataSource::default(),
            DataSource::Url(DEFAULT_SOURCE_URL.to_string())
        );
    }

    #[tokio::test]
    async fn loads_file_source() {
        let path = std::env::temp_dir().join(format!(
            "corona_stats_load_test_{}.csv",
            std::process::id()
        ));
        std::fs::write(
            &path,
            "Area type,Area name,Specimen date,Daily lab-confirmed cases,Cumulative lab-confirmed cases\n\
             Region,London,2020-04-01,3,3\n",
        )
        .unwrap();
        let table = load(&DataSource::File(path.clone())).await.unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(table.list_areas("Region"), vec!["London"]);
    }
}
