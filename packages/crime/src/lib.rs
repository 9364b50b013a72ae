#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime statistics loading, aggregation and risk normalization.
//!
//! [`dataset`] reads the crime statistics CSV into
//! [`CrimeRow`](berlin_map_crime_models::CrimeRow)s, and [`aggregate`]
//! reduces them to geocoded, risk-scored
//! [`CrimeRecord`](berlin_map_crime_models::CrimeRecord)s for the latest
//! year in the table.

pub mod aggregate;
pub mod dataset;
pub mod progress;

use berlin_map_geocoder::GeocodeError;

pub use aggregate::aggregate;
pub use dataset::{DatasetLayout, load_rows, read_rows};

/// Errors that can occur while loading or aggregating crime data.
#[derive(Debug, thiserror::Error)]
pub enum CrimeError {
    /// I/O error (file read).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header row.
    #[error("Missing column '{column}' in crime dataset")]
    MissingColumn {
        /// Header that was expected.
        column: String,
    },

    /// Geocoding a location failed outright (not just "no match").
    #[error("Geocoding failed: {0}")]
    Geocode(#[from] GeocodeError),
}
