//! # Configuration Management
//!
//! This module handles loading and parsing configuration from the
//! tide-planner.toml file. It provides a centralized way to configure the
//! NOAA station, the low-tide filter defaults, and the web server bind
//! address.

use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

use crate::filter::FilterCriteria;

/// Application configuration loaded from tide-planner.toml
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// NOAA station configuration
    pub station: StationConfig,
    /// Low-tide filter defaults
    pub filter: FilterConfig,
    /// Web server configuration
    pub server: ServerConfig,
}

/// NOAA tide station configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StationConfig {
    /// NOAA station ID (e.g., "9437585" for Garibaldi, OR)
    pub id: String,
    /// Short label used in calendar entry summaries
    pub name: String,
    /// Full place name used as the calendar entry LOCATION
    pub location: String,
    /// IANA timezone the station's local timestamps are read in
    pub time_zone: String,
}

/// Defaults for the low-tide filter window
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FilterConfig {
    /// Keep only tides strictly below this height in feet
    pub min_height: f64,
    /// Earliest qualifying local clock hour, inclusive (0-23)
    pub start_hour: u32,
    /// Latest qualifying local clock hour, inclusive (0-23)
    pub end_hour: u32,
}

/// Web server bind configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Interface to bind, e.g. "127.0.0.1" or "0.0.0.0"
    pub host: String,
    /// TCP port for the HTTP listener
    pub port: u16,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            station: StationConfig {
                id: "9437585".to_string(),
                name: "Barview / North Jetty (Tillamook Bay)".to_string(),
                location: "Barview / North Jetty, Tillamook Bay, OR".to_string(),
                time_zone: "America/Los_Angeles".to_string(),
            },
            filter: FilterConfig {
                min_height: 0.0, // Negative lows only; raise to widen the net
                start_hour: 8,
                end_hour: 19,
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
        }
    }
}

impl Config {
    /// Load configuration from tide-planner.toml file
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load() -> Self {
        Self::load_from_path("tide-planner.toml")
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Config>(&contents) {
                Ok(config) => {
                    info!("loaded configuration for station {}", config.station.name);
                    config
                }
                Err(e) => {
                    warn!("invalid config file format: {e}");
                    warn!("using default configuration (Tillamook Bay, OR)");
                    Self::default()
                }
            },
            Err(_) => {
                info!("no config file found, using default configuration (Tillamook Bay, OR)");
                Self::default()
            }
        }
    }

    /// Parse the configured IANA timezone name.
    pub fn time_zone(&self) -> Result<Tz> {
        self.station
            .time_zone
            .parse::<Tz>()
            .map_err(|_| anyhow!("unrecognized timezone {:?}", self.station.time_zone))
    }

    /// Build the default filter criteria from the configured station zone
    /// and filter section.
    pub fn filter_criteria(&self) -> Result<FilterCriteria> {
        let time_zone = self
            .time_zone()
            .context("filter criteria need a valid station timezone")?;
        Ok(FilterCriteria {
            min_height: self.filter.min_height,
            start_hour: self.filter.start_hour,
            end_hour: self.filter.end_hour,
            time_zone,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.station.id, "9437585");
        assert_eq!(config.station.time_zone, "America/Los_Angeles");
        assert_eq!(config.filter.min_height, 0.0);
        assert_eq!(config.filter.start_hour, 8);
        assert_eq!(config.filter.end_hour, 19);
        assert_eq!(config.server.port, 8000);
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(config.station.id, parsed.station.id);
        assert_eq!(config.station.location, parsed.station.location);
        assert_eq!(config.filter.end_hour, parsed.filter.end_hour);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let config = Config::load_from_path("/nonexistent/path");
        // Should fallback to default
        assert_eq!(config.station.id, "9437585");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[station]
id = "8418150"
name = "Portland"
location = "Portland, ME"
time_zone = "America/New_York"

[filter]
min_height = 0.5
start_hour = 6
end_hour = 20

[server]
host = "0.0.0.0"
port = 9000
"#
        )
        .unwrap();

        let config = Config::load_from_path(file.path());
        assert_eq!(config.station.id, "8418150");
        assert_eq!(config.filter.min_height, 0.5);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.time_zone().unwrap(), chrono_tz::America::New_York);
    }

    #[test]
    fn test_bad_timezone_rejected() {
        let mut config = Config::default();
        config.station.time_zone = "America/Atlantis".to_string();
        assert!(config.time_zone().is_err());
        assert!(config.filter_criteria().is_err());
    }

    #[test]
    fn test_filter_criteria_from_defaults() {
        let criteria = Config::default().filter_criteria().unwrap();
        assert_eq!(criteria.start_hour, 8);
        assert_eq!(criteria.end_hour, 19);
        assert_eq!(criteria.time_zone, chrono_tz::America::Los_Angeles);
    }
}
