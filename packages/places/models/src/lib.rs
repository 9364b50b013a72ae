#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Point-of-interest types shared across the Berlin map pipeline.
//!
//! A [`Place`] is produced either from a places text-search result row or
//! from a user submission, and is never mutated afterwards.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A WGS84 coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coordinate {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate from a latitude/longitude pair.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Formats the coordinate as `"lat,lng"`, the form the Google APIs
    /// expect for their `location` bias parameter.
    #[must_use]
    pub fn to_query_param(self) -> String {
        format!("{:.4},{:.4}", self.latitude, self.longitude)
    }

    /// Returns `[longitude, latitude]`, the `GeoJSON` position order.
    #[must_use]
    pub const fn to_position(self) -> [f64; 2] {
        [self.longitude, self.latitude]
    }
}

/// Category a [`Place`] is shown under on the map.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PlaceCategory {
    /// Restaurants, cafes and other places to eat.
    Restaurant,
    /// Hotels and other accommodation.
    Hotel,
    /// Sights and tourist attractions.
    Attraction,
    /// Places the user entered by address.
    UserAdded,
}

impl PlaceCategory {
    /// Returns the categories that are fetched from the places API.
    #[must_use]
    pub const fn searchable() -> &'static [Self] {
        &[Self::Restaurant, Self::Hotel, Self::Attraction]
    }
}

/// A point of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    /// Display name.
    pub name: String,
    /// Formatted street address, if the source provided one.
    pub address: Option<String>,
    /// Location of the place.
    pub coordinate: Coordinate,
    /// Average user rating (usually 1.0-5.0), if the place has been rated.
    pub rating: Option<f64>,
    /// Category the place belongs to.
    pub category: PlaceCategory,
}

impl Place {
    /// Returns `true` if the place has a rating of at least `min_rating`.
    ///
    /// Unrated places never meet a threshold.
    #[must_use]
    pub fn meets_rating(&self, min_rating: f64) -> bool {
        self.rating.is_some_and(|rating| rating >= min_rating)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn place(rating: Option<f64>) -> Place {
        Place {
            name: "Curry 36".to_string(),
            address: None,
            coordinate: Coordinate::new(52.4934, 13.3878),
            rating,
            category: PlaceCategory::Restaurant,
        }
    }

    #[test]
    fn unrated_place_never_meets_threshold() {
        assert!(!place(None).meets_rating(0.0));
    }

    #[test]
    fn rating_threshold_is_inclusive() {
        assert!(place(Some(4.5)).meets_rating(4.5));
        assert!(!place(Some(4.4)).meets_rating(4.5));
    }

    #[test]
    fn category_names_are_kebab_case() {
        assert_eq!(PlaceCategory::UserAdded.to_string(), "user-added");
        assert_eq!(
            "attraction".parse::<PlaceCategory>().unwrap(),
            PlaceCategory::Attraction
        );
        assert_eq!(
            serde_json::to_string(&PlaceCategory::UserAdded).unwrap(),
            "\"user-added\""
        );
    }

    #[test]
    fn position_is_longitude_first() {
        let coord = Coordinate::new(52.52, 13.405);
        assert_eq!(coord.to_position(), [13.405, 52.52]);
        assert_eq!(coord.to_query_param(), "52.5200,13.4050");
    }
}
