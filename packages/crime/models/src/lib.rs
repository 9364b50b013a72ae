#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Crime statistics row and aggregate record types.
//!
//! A [`CrimeRow`] is one line of the raw statistics table: a location, a
//! year and a count per crime category. The aggregator turns the rows of
//! the most recent year into [`CrimeRecord`]s, which carry a resolved
//! coordinate and a normalized risk score.

use std::collections::BTreeMap;

use berlin_map_places_models::Coordinate;
use serde::{Deserialize, Serialize};

/// A single row of the crime statistics table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeRow {
    /// Location (neighbourhood or district) the counts belong to.
    pub location_name: String,
    /// Reporting year.
    pub year: i32,
    /// Count per crime category column (e.g. `"Robbery" -> 70`).
    pub counts: BTreeMap<String, u64>,
}

impl CrimeRow {
    /// Sums every category count of this row.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }
}

/// A per-location crime aggregate for one period, with a resolved
/// coordinate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeRecord {
    /// Location name as it appears in the source table.
    pub location_name: String,
    /// Reporting year the record belongs to.
    pub period: i32,
    /// Count per crime category.
    pub counts: BTreeMap<String, u64>,
    /// Sum of all category counts.
    pub crime_total: u64,
    /// Geocoded location.
    pub coordinate: Coordinate,
    /// `crime_total` divided by the largest `crime_total` in the same
    /// result set, in `[0, 1]`.
    pub risk_norm: f64,
}

/// Output of one aggregation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeAggregate {
    /// The selected period (the latest year in the input), or `None` when
    /// the input was empty.
    pub period: Option<i32>,
    /// Records of the selected period that could be geocoded.
    pub records: Vec<CrimeRecord>,
    /// Locations of the selected period that could not be geocoded.
    pub dropped_locations: Vec<String>,
}

impl CrimeAggregate {
    /// Returns the largest `crime_total` among the retained records.
    #[must_use]
    pub fn max_total(&self) -> u64 {
        self.records
            .iter()
            .map(|r| r.crime_total)
            .max()
            .unwrap_or(0)
    }
}
