#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! TOML configuration for the Berlin map pipeline.
//!
//! The defaults live in `config/default.toml` and are embedded at compile
//! time. A user file is merged on top of them key by key, and a handful of
//! environment variables override the result:
//!
//! | Variable | Overrides |
//! |---|---|
//! | `GOOGLE_MAPS_API_KEY` | `google.api_key` |
//! | `BERLIN_MAP_CRIME_CSV` | `crime.csv_path` |
//! | `BIND_ADDR` | `server.bind_addr` |
//! | `PORT` | `server.port` |

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use berlin_map_places_models::{Coordinate, PlaceCategory};
use serde::Deserialize;

const DEFAULT_TOML: &str = include_str!("../config/default.toml");

/// Environment variable naming a config file to load when no explicit path
/// is given.
pub const CONFIG_PATH_ENV: &str = "BERLIN_MAP_CONFIG";

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Reading the config file failed.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The TOML could not be parsed or did not match the expected shape.
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),

    /// A Google API key is required but none was configured.
    #[error("No Google Maps API key configured (set GOOGLE_MAPS_API_KEY)")]
    MissingApiKey,
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Google Maps Platform settings.
    pub google: GoogleConfig,
    /// Places text-search settings.
    pub search: SearchConfig,
    /// Crime dataset settings.
    pub crime: CrimeConfig,
    /// Map view settings.
    pub map: MapConfig,
    /// Display widget endpoints.
    pub widgets: WidgetsConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
}

/// Google Maps Platform settings.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleConfig {
    /// API key sent with every request.
    pub api_key: String,
    /// Places text-search endpoint.
    pub places_url: String,
    /// Geocoding endpoint.
    pub geocode_url: String,
}

/// Places text-search settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    /// Location bias for searches.
    pub center: Coordinate,
    /// Search radius in meters.
    pub radius_m: u32,
    /// Wait before each continuation request, in milliseconds.
    pub page_delay_ms: u64,
    /// Stop after this many pages even if more are available.
    #[serde(default)]
    pub max_pages: Option<u32>,
    /// Default minimum rating applied to fetched places.
    #[serde(default)]
    pub min_rating: Option<f64>,
    /// Search query per place category.
    pub queries: BTreeMap<PlaceCategory, String>,
}

impl SearchConfig {
    /// Returns the configured query for `category`, if any.
    #[must_use]
    pub fn query_for(&self, category: PlaceCategory) -> Option<&str> {
        self.queries.get(&category).map(String::as_str)
    }
}

/// Crime dataset settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CrimeConfig {
    /// Path of the crime statistics CSV.
    pub csv_path: PathBuf,
    /// Header of the year column.
    pub year_column: String,
    /// Header of the location name column.
    pub location_column: String,
    /// Headers of columns that are neither year, location nor a crime
    /// category.
    #[serde(default)]
    pub ignore_columns: Vec<String>,
    /// Appended to each location name before geocoding.
    #[serde(default)]
    pub geocode_suffix: String,
}

/// Map view settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MapConfig {
    /// Initial map center.
    pub center: Coordinate,
    /// Initial zoom level.
    pub zoom: u8,
    /// Heatmap point radius in pixels.
    pub heat_radius: u32,
}

/// Display widget endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct WidgetsConfig {
    /// Exchange-rate endpoint; the base currency is appended as a path
    /// segment.
    pub exchange_url: String,
    /// Weather forecast endpoint.
    pub weather_url: String,
    /// Currency converted from by default.
    pub base_currency: String,
    /// Currency converted to by default.
    pub target_currency: String,
}

/// HTTP server settings.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: String,
    /// Port to listen on.
    pub port: u16,
}

impl Config {
    /// Returns the embedded default configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if the embedded file is malformed.
    pub fn embedded() -> Result<Self, ConfigError> {
        Ok(toml::from_str(DEFAULT_TOML)?)
    }

    /// Parses `overrides` on top of the embedded defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] if either document is malformed or the
    /// merged result is missing required keys.
    pub fn from_toml_str(overrides: &str) -> Result<Self, ConfigError> {
        let mut base: toml::Table = toml::from_str(DEFAULT_TOML)?;
        let user: toml::Table = toml::from_str(overrides)?;
        merge_tables(&mut base, user);
        Ok(toml::Value::Table(base).try_into()?)
    }

    /// Loads configuration from `path` (or `BERLIN_MAP_CONFIG`, or the
    /// embedded defaults) and applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut config = match path {
            Some(path) => {
                log::info!("Loading config from {}", path.display());
                let contents =
                    std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                        path: path.clone(),
                        source,
                    })?;
                Self::from_toml_str(&contents)?
            }
            None => Self::embedded()?,
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies environment-style overrides looked up through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("GOOGLE_MAPS_API_KEY").filter(|k| !k.is_empty()) {
            self.google.api_key = key;
        }
        if let Some(path) = lookup("BERLIN_MAP_CRIME_CSV") {
            self.crime.csv_path = PathBuf::from(path);
        }
        if let Some(addr) = lookup("BIND_ADDR") {
            self.server.bind_addr = addr;
        }
        if let Some(port) = lookup("PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(e) => log::warn!("Ignoring invalid PORT '{port}': {e}"),
            }
        }
    }

    /// Returns the Google API key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiKey`] if the key is empty.
    pub fn api_key(&self) -> Result<&str, ConfigError> {
        if self.google.api_key.is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        Ok(&self.google.api_key)
    }
}

/// Recursively merges `overrides` into `base`. Tables merge key by key;
/// any other value replaces the base value.
fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(incoming)) => {
                merge_tables(existing, incoming);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
