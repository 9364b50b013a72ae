#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Marker and heatmap layer assembly for the Berlin map view.
//!
//! [`MapComposer::compose`] turns categorized places and crime records into
//! a renderer-neutral [`MapView`]: one marker layer per visible place
//! category plus an optional weighted heat layer. The view serializes to
//! JSON as-is, or to a single `GeoJSON` feature collection via
//! [`MapView::to_feature_collection`].

mod geojson_output;

use std::collections::BTreeMap;

use berlin_map_crime_models::CrimeRecord;
use berlin_map_places_models::{Coordinate, Place, PlaceCategory};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Places to draw, grouped by the category they are shown under.
pub type PlaceLayers = BTreeMap<PlaceCategory, Vec<Place>>;

/// Which value a heat point is weighted by.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum HeatWeight {
    /// Every location counts the same.
    Uniform,
    /// Weighted by the raw `crime_total`.
    CrimeTotal,
    /// Weighted by the normalized `risk_norm`.
    #[default]
    RiskNorm,
}

impl HeatWeight {
    /// Returns the weight of `record` under this scheme.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn weight_of(self, record: &CrimeRecord) -> f64 {
        match self {
            Self::Uniform => 1.0,
            Self::CrimeTotal => record.crime_total as f64,
            Self::RiskNorm => record.risk_norm,
        }
    }
}

/// Marker colour per place category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MarkerColor {
    /// Restaurants.
    Blue,
    /// Hotels.
    Green,
    /// Attractions.
    Purple,
    /// User-added places.
    Red,
}

impl From<PlaceCategory> for MarkerColor {
    fn from(category: PlaceCategory) -> Self {
        match category {
            PlaceCategory::Restaurant => Self::Blue,
            PlaceCategory::Hotel => Self::Green,
            PlaceCategory::Attraction => Self::Purple,
            PlaceCategory::UserAdded => Self::Red,
        }
    }
}

/// Per-layer visibility toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerVisibility {
    /// Show restaurant markers.
    pub restaurants: bool,
    /// Show hotel markers.
    pub hotels: bool,
    /// Show attraction markers.
    pub attractions: bool,
    /// Show user-added markers.
    pub user_added: bool,
    /// Show the crime heatmap.
    pub crime_heatmap: bool,
}

impl Default for LayerVisibility {
    fn default() -> Self {
        Self {
            restaurants: true,
            hotels: true,
            attractions: true,
            user_added: true,
            crime_heatmap: false,
        }
    }
}

impl LayerVisibility {
    /// Returns whether markers of `category` are shown.
    #[must_use]
    pub const fn shows(&self, category: PlaceCategory) -> bool {
        match category {
            PlaceCategory::Restaurant => self.restaurants,
            PlaceCategory::Hotel => self.hotels,
            PlaceCategory::Attraction => self.attractions,
            PlaceCategory::UserAdded => self.user_added,
        }
    }
}

/// A point marker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Marker {
    /// Marker position.
    pub coordinate: Coordinate,
    /// Popup text.
    pub popup: String,
}

/// Only restaurant popups carry the rating.
impl From<&Place> for Marker {
    fn from(place: &Place) -> Self {
        let popup = match (place.category, place.rating) {
            (PlaceCategory::Restaurant, Some(rating)) => format!("{} ⭐{rating}", place.name),
            _ => place.name.clone(),
        };
        Self {
            coordinate: place.coordinate,
            popup,
        }
    }
}

/// A weighted heatmap point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatPoint {
    /// Point position.
    pub coordinate: Coordinate,
    /// Point weight.
    pub weight: f64,
}

/// One rendering layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MapLayer {
    /// Point markers for one place category.
    #[serde(rename_all = "camelCase")]
    Markers {
        /// Category the markers belong to.
        category: PlaceCategory,
        /// Marker colour.
        color: MarkerColor,
        /// The markers.
        markers: Vec<Marker>,
    },
    /// Weighted crime heatmap.
    #[serde(rename_all = "camelCase")]
    Heat {
        /// Point radius in pixels.
        radius: u32,
        /// How points are weighted.
        weight: HeatWeight,
        /// The points.
        points: Vec<HeatPoint>,
    },
}

/// A complete map description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapView {
    /// Initial center.
    pub center: Coordinate,
    /// Initial zoom level.
    pub zoom: u8,
    /// Layers in drawing order.
    pub layers: Vec<MapLayer>,
}

/// Builds [`MapView`]s with a fixed center, zoom and heat radius.
#[derive(Debug, Clone, Copy)]
pub struct MapComposer {
    center: Coordinate,
    zoom: u8,
    heat_radius: u32,
}

impl Default for MapComposer {
    fn default() -> Self {
        Self::new(Coordinate::new(52.5200, 13.4050), 12, 15)
    }
}

impl MapComposer {
    /// Creates a composer for the given view settings.
    #[must_use]
    pub const fn new(center: Coordinate, zoom: u8, heat_radius: u32) -> Self {
        Self {
            center,
            zoom,
            heat_radius,
        }
    }

    /// Assembles the layers for one render.
    ///
    /// Marker layers come first in category order (restaurants, hotels,
    /// attractions, user-added); empty or hidden categories are skipped.
    /// The heat layer comes last and is emitted whenever it is visible,
    /// even with no points.
    #[must_use]
    pub fn compose(
        &self,
        places: &PlaceLayers,
        crime: &[CrimeRecord],
        visibility: &LayerVisibility,
        weight: HeatWeight,
    ) -> MapView {
        let mut layers: Vec<MapLayer> = places
            .iter()
            .filter(|(category, list)| visibility.shows(**category) && !list.is_empty())
            .map(|(category, list)| MapLayer::Markers {
                category: *category,
                color: MarkerColor::from(*category),
                markers: list.iter().map(Marker::from).collect(),
            })
            .collect();

        if visibility.crime_heatmap {
            layers.push(MapLayer::Heat {
                radius: self.heat_radius,
                weight,
                points: crime
                    .iter()
                    .map(|record| HeatPoint {
                        coordinate: record.coordinate,
                        weight: weight.weight_of(record),
                    })
                    .collect(),
            });
        }

        log::debug!("Composed map with {} layers", layers.len());

        MapView {
            center: self.center,
            zoom: self.zoom,
            layers,
        }
    }
}
