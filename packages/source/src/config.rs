//! Application configuration.
//!
//! Settings come from an optional TOML file, then environment variables
//! override individual fields:
//!
//! * `CORONA_STATS_CONFIG`: path of the TOML file
//! * `CORONA_STATS_SOURCE`: case table URL or path
//! * `BIND_ADDR`, `PORT`: server listen address
//!
//! ```toml
//! area_type = "Region"
//!
//! [source]
//! url = "https://coronavirus.data.gov.uk/downloads/csv/coronavirus-cases_latest.csv"
//!
//! [estimation]
//! t_infectious = 7
//! smooth = true
//! smoothing_window = [-3.5, 3.5]
//!
//! [server]
//! bind_addr = "0.0.0.0"
//! port = 8080
//! ```

use std::path::Path;

use corona_stats_estimation::EstimationSettings;
use serde::{Deserialize, Serialize};

use crate::{DataSource, SourceError};

/// Environment variable naming the TOML config file.
pub const CONFIG_ENV: &str = "CORONA_STATS_CONFIG";
/// Environment variable overriding the data source.
pub const SOURCE_ENV: &str = "CORONA_STATS_SOURCE";

/// Server listen address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Full application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where the case table is loaded from.
    pub source: DataSource,
    /// Area type used when none is given explicitly.
    pub area_type: String,
    /// Default pipeline settings.
    pub estimation: EstimationSettings,
    pub server: ServerConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            source: DataSource::default(),
            area_type: "Region".to_string(),
            estimation: EstimationSettings::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    /// Parses a TOML config string. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Config`] if the TOML is malformed.
    pub fn from_toml(toml_str: &str) -> Result<Self, SourceError> {
        Ok(toml::de::from_str(toml_str)?)
    }

    /// Reads a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Io`] if the file cannot be read or
    /// [`SourceError::Config`] if it is malformed.
    pub fn load(path: &Path) -> Result<Self, SourceError> {
        log::debug!("Reading config from {}", path.display());
        Self::from_toml(&std::fs::read_to_string(path)?)
    }

    /// Builds the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] if `CORONA_STATS_CONFIG` names a file that
    /// cannot be read or parsed.
    pub fn from_env() -> Result<Self, SourceError> {
        let base = match std::env::var(CONFIG_ENV) {
            Ok(path) => Self::load(Path::new(&path))?,
            Err(_) => Self::default(),
        };
        Ok(base.with_overrides(|key| std::env::var(key).ok()))
    }

    /// Applies `CORONA_STATS_SOURCE`, `BIND_ADDR` and `PORT` from `lookup`.
    /// An unparseable port is ignored with a warning.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(source) = lookup(SOURCE_ENV)
            && let Ok(source) = source.parse()
        {
            self.source = source;
        }

        if let Some(bind_addr) = lookup("BIND_ADDR") {
            self.server.bind_addr = bind_addr;
        }

        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(e) => log::warn!("Ignoring invalid PORT '{port}': {e}"),
            }
        }

        self
    }
}
