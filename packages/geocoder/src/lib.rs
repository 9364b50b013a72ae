#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address geocoding for the Berlin map pipeline.
//!
//! Resolves free-text location strings to coordinates through the
//! [`Geocode`] trait. The production implementation is
//! [`google::GoogleGeocoder`]; tests substitute their own.
//!
//! Lookups go through [`geocode_cached`], which consults an explicit
//! [`GeocodeCache`] owned by the caller (one per session) so that repeated
//! location names, common in the crime table, cost a single request.

pub mod cache;
pub mod google;

use async_trait::async_trait;
use berlin_map_places_models::Coordinate;
use thiserror::Error;

pub use cache::GeocodeCache;

/// Errors from geocoding operations.
///
/// A query that simply has no match is not an error; it resolves to
/// `Ok(None)`.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The geocoding endpoint answered with a non-success status.
    #[error("Geocoding request failed with HTTP {status}")]
    Status {
        /// HTTP status code returned.
        status: u16,
    },
}

/// A service that resolves a location description to a coordinate.
#[async_trait]
pub trait Geocode: Send + Sync {
    /// Geocodes `query`, returning `None` when nothing matched.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError`] if the request itself fails.
    async fn geocode(&self, query: &str) -> Result<Option<Coordinate>, GeocodeError>;
}

/// Geocodes `query`, answering from `cache` when the same string was seen
/// before.
///
/// Both matches and misses are cached; errors are not, so a failed lookup
/// is attempted again next time.
///
/// # Errors
///
/// Returns [`GeocodeError`] if the uncached lookup fails.
pub async fn geocode_cached(
    geocoder: &(impl Geocode + ?Sized),
    cache: &mut GeocodeCache,
    query: &str,
) -> Result<Option<Coordinate>, GeocodeError> {
    if let Some(cached) = cache.lookup(query) {
        log::trace!("Geocode cache hit for '{query}'");
        return Ok(cached);
    }

    log::debug!("Geocode cache miss for '{query}', querying provider");
    let result = geocoder.geocode(query).await?;
    cache.insert(query, result);
    Ok(result)
}
