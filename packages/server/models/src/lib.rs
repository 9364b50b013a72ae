#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the Berlin map server.
//!
//! These types are serialized to JSON for the REST API. They are kept
//! separate from the pipeline types so the API contract can evolve on its
//! own.

use berlin_map_composer::{HeatWeight, LayerVisibility};
use berlin_map_crime_models::{CrimeAggregate, CrimeRecord};
use berlin_map_places_models::{Place, PlaceCategory};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHealth {
    /// Whether the server is healthy.
    pub healthy: bool,
    /// Server version.
    pub version: String,
}

/// Error body returned with every non-success status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable message.
    pub error: String,
}

/// Query parameters for the places endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacesQueryParams {
    /// Category to search.
    pub category: PlaceCategory,
    /// Minimum rating; falls back to the configured default.
    pub min_rating: Option<f64>,
}

/// Crime layer as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCrime {
    /// Year the records belong to, `None` for an empty table.
    pub period: Option<i32>,
    /// Highest `crimeTotal` among the records.
    pub max_total: u64,
    /// Geocoded, risk-scored records.
    pub records: Vec<CrimeRecord>,
    /// Locations the geocoder could not resolve.
    pub dropped_locations: Vec<String>,
}

impl From<CrimeAggregate> for ApiCrime {
    fn from(aggregate: CrimeAggregate) -> Self {
        Self {
            max_total: aggregate.max_total(),
            period: aggregate.period,
            records: aggregate.records,
            dropped_locations: aggregate.dropped_locations,
        }
    }
}

/// Output encoding for the map endpoint.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MapFormat {
    /// The layered `MapView`.
    #[default]
    Json,
    /// A single `GeoJSON` feature collection.
    Geojson,
}

/// Query parameters for the map endpoint.
///
/// Omitted layer flags keep their [`LayerVisibility::default`] value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapQueryParams {
    /// Show restaurant markers.
    pub restaurants: Option<bool>,
    /// Show hotel markers.
    pub hotels: Option<bool>,
    /// Show attraction markers.
    pub attractions: Option<bool>,
    /// Show user-added markers.
    pub user_added: Option<bool>,
    /// Show the crime heatmap.
    pub crime: Option<bool>,
    /// Heat point weighting.
    pub weight: Option<HeatWeight>,
    /// Minimum rating for fetched places.
    pub min_rating: Option<f64>,
    /// Output encoding.
    pub format: Option<MapFormat>,
}

impl MapQueryParams {
    /// Resolves the layer flags against the defaults.
    #[must_use]
    pub fn visibility(&self) -> LayerVisibility {
        let defaults = LayerVisibility::default();
        LayerVisibility {
            restaurants: self.restaurants.unwrap_or(defaults.restaurants),
            hotels: self.hotels.unwrap_or(defaults.hotels),
            attractions: self.attractions.unwrap_or(defaults.attractions),
            user_added: self.user_added.unwrap_or(defaults.user_added),
            crime_heatmap: self.crime.unwrap_or(defaults.crime_heatmap),
        }
    }
}

/// Request body for adding a place by address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiAddPlace {
    /// Display name.
    pub name: String,
    /// Free-text address to geocode.
    pub address: String,
}

/// The places a session has added.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSessionPlaces {
    /// Session the places belong to; absent when the request carried no
    /// live session.
    pub session_id: Option<String>,
    /// Places in insertion order.
    pub places: Vec<Place>,
}

/// Query parameters for the exchange-rate widget.
#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeQueryParams {
    /// Currency to convert from.
    pub base: Option<String>,
    /// Currency to convert to.
    pub target: Option<String>,
}

/// Query parameters for the weather widget.
#[derive(Debug, Clone, Deserialize)]
pub struct WeatherQueryParams {
    /// Latitude; defaults to the map center.
    pub lat: Option<f64>,
    /// Longitude; defaults to the map center.
    pub lng: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_map_flags_use_defaults() {
        let params: MapQueryParams = serde_json::from_str(r#"{"hotels": false}"#).unwrap();
        let visibility = params.visibility();

        assert!(visibility.restaurants);
        assert!(!visibility.hotels);
        assert!(!visibility.crime_heatmap);
    }

    #[test]
    fn map_params_parse_weight_and_format() {
        let params: MapQueryParams =
            serde_json::from_str(r#"{"crime": true, "weight": "crime-total", "format": "geojson"}"#)
                .unwrap();

        assert_eq!(params.weight, Some(HeatWeight::CrimeTotal));
        assert_eq!(params.format, Some(MapFormat::Geojson));
        assert!(params.visibility().crime_heatmap);
    }

    #[test]
    fn crime_response_carries_max_total() {
        let api = ApiCrime::from(CrimeAggregate::default());
        let json = serde_json::to_value(&api).unwrap();

        assert_eq!(json["maxTotal"], 0);
        assert!(json["period"].is_null());
        assert!(json["droppedLocations"].as_array().unwrap().is_empty());
    }
}
