//! Reduction of raw crime rows to risk-scored records.
//!
//! 1. Keep only rows from the latest year in the input.
//! 2. Sum each row's category counts into `crime_total`.
//! 3. Geocode each row's location name (through the session cache).
//! 4. Drop rows that could not be geocoded.
//! 5. Scale totals by the largest remaining total to get `risk_norm`.
//!
//! The score is relative: it only compares locations within one result
//! set, so a different input can change every score.

use std::sync::Arc;

use berlin_map_crime_models::{CrimeAggregate, CrimeRecord, CrimeRow};
use berlin_map_geocoder::{Geocode, GeocodeCache, geocode_cached};

use crate::CrimeError;
use crate::progress::ProgressCallback;

/// Returns the latest year present in `rows`.
#[must_use]
pub fn latest_period(rows: &[CrimeRow]) -> Option<i32> {
    rows.iter().map(|r| r.year).max()
}

/// Scales `total` into `[0, 1]` relative to `max_total`.
///
/// Returns `0.0` when `max_total` is zero.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn risk_norm(total: u64, max_total: u64) -> f64 {
    if max_total == 0 {
        return 0.0;
    }
    total as f64 / max_total as f64
}

/// Aggregates `rows` into geocoded, risk-scored records for the latest
/// year.
///
/// Each location is geocoded as `"{location_name}{geocode_suffix}"`.
/// Locations without a match are listed in
/// [`CrimeAggregate::dropped_locations`] and do not take part in
/// normalization.
///
/// # Errors
///
/// Returns [`CrimeError::Geocode`] if a geocoding request fails. No
/// partial aggregate is returned.
pub async fn aggregate(
    rows: &[CrimeRow],
    geocoder: &(impl Geocode + ?Sized),
    cache: &mut GeocodeCache,
    geocode_suffix: &str,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<CrimeAggregate, CrimeError> {
    let Some(period) = latest_period(rows) else {
        log::info!("Crime dataset is empty, nothing to aggregate");
        return Ok(CrimeAggregate::default());
    };

    let latest: Vec<&CrimeRow> = rows.iter().filter(|r| r.year == period).collect();
    log::info!(
        "Aggregating {} of {} crime rows for {period}",
        latest.len(),
        rows.len()
    );

    progress.set_total(latest.len() as u64);
    let (hits_before, misses_before) = (cache.hits(), cache.misses());

    let mut located = Vec::with_capacity(latest.len());
    let mut dropped_locations = Vec::new();

    for row in latest {
        progress.set_message(row.location_name.clone());
        let query = format!("{}{geocode_suffix}", row.location_name);
        let coordinate = geocode_cached(geocoder, cache, &query).await?;
        progress.inc(1);

        match coordinate {
            Some(coordinate) => located.push((row, row.total(), coordinate)),
            None => {
                log::warn!("Could not geocode '{query}', skipping");
                dropped_locations.push(row.location_name.clone());
            }
        }
    }

    log::debug!(
        "Geocode cache: {} hits, {} misses",
        cache.hits() - hits_before,
        cache.misses() - misses_before
    );

    let max_total = located.iter().map(|(_, total, _)| *total).max().unwrap_or(0);

    let records: Vec<CrimeRecord> = located
        .into_iter()
        .map(|(row, crime_total, coordinate)| CrimeRecord {
            location_name: row.location_name.clone(),
            period,
            counts: row.counts.clone(),
            crime_total,
            coordinate,
            risk_norm: risk_norm(crime_total, max_total),
        })
        .collect();

    progress.finish(format!(
        "{} locations for {period} ({} not found)",
        records.len(),
        dropped_locations.len()
    ));

    Ok(CrimeAggregate {
        period: Some(period),
        records,
        dropped_locations,
    })
}
