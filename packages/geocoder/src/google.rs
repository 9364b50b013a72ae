//! Google Geocoding API client.
//!
//! Issues a single `GET {base_url}?address=..&key=..` per query and takes
//! the first result's `geometry.location`.
//!
//! See <https://developers.google.com/maps/documentation/geocoding/requests-geocoding>

use async_trait::async_trait;
use berlin_map_places_models::Coordinate;

use crate::{Geocode, GeocodeError};

/// Geocoder backed by the Google Geocoding API.
#[derive(Debug, Clone)]
pub struct GoogleGeocoder {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GoogleGeocoder {
    /// Creates a geocoder that sends requests to `base_url` with `api_key`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl Geocode for GoogleGeocoder {
    async fn geocode(&self, query: &str) -> Result<Option<Coordinate>, GeocodeError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("address", query), ("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GeocodeError::Status {
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        Ok(parse_response(query, &body))
    }
}

/// Parses a Geocoding API response body.
///
/// Any API status other than `"OK"` (for example `"ZERO_RESULTS"` or
/// `"REQUEST_DENIED"`) means no coordinate, as does a result without a
/// numeric location.
fn parse_response(query: &str, body: &serde_json::Value) -> Option<Coordinate> {
    let status = body["status"].as_str().unwrap_or("");
    if status != "OK" {
        log::debug!("No geocoding result for '{query}' (status: {status:?})");
        return None;
    }

    let first = body["results"].as_array()?.first()?;

    let location = &first["geometry"]["location"];
    let (Some(lat), Some(lng)) = (location["lat"].as_f64(), location["lng"].as_f64()) else {
        log::warn!("Geocoding result for '{query}' has no usable location: {location}");
        return None;
    };

    Some(Coordinate::new(lat, lng))
}
