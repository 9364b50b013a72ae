//! `GeoJSON` rendering of a [`MapView`].
//!
//! Every marker and heat point becomes a `Point` feature. Properties:
//!
//! - `layer`: place category name, or `"heat"`
//! - `popup`, `color`: markers only
//! - `weight`, `radius`: heat points only

use berlin_map_places_models::Coordinate;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};

use crate::{MapLayer, MapView};

fn point_feature(coordinate: Coordinate, properties: JsonObject) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(
            coordinate.to_position().to_vec(),
        ))),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

impl MapView {
    /// Renders all layers as one feature collection, in layer order.
    #[must_use]
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let mut features = Vec::new();

        for layer in &self.layers {
            match layer {
                MapLayer::Markers {
                    category,
                    color,
                    markers,
                } => {
                    for marker in markers {
                        let mut props = JsonObject::new();
                        props.insert("layer".into(), JsonValue::from(category.to_string()));
                        props.insert("popup".into(), JsonValue::from(marker.popup.clone()));
                        props.insert("color".into(), JsonValue::from(color.to_string()));
                        features.push(point_feature(marker.coordinate, props));
                    }
                }
                MapLayer::Heat { radius, points, .. } => {
                    for point in points {
                        let mut props = JsonObject::new();
                        props.insert("layer".into(), JsonValue::from("heat"));
                        props.insert("weight".into(), JsonValue::from(point.weight));
                        props.insert("radius".into(), JsonValue::from(*radius));
                        features.push(point_feature(point.coordinate, props));
                    }
                }
            }
        }

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use berlin_map_places_models::PlaceCategory;

    use crate::{HeatPoint, HeatWeight, MapLayer, MapView, Marker, MarkerColor};

    use super::*;

    #[test]
    fn markers_and_heat_points_become_point_features() {
        let view = MapView {
            center: Coordinate::new(52.52, 13.405),
            zoom: 12,
            layers: vec![
                MapLayer::Markers {
                    category: PlaceCategory::UserAdded,
                    color: MarkerColor::Red,
                    markers: vec![Marker {
                        coordinate: Coordinate::new(52.5163, 13.3777),
                        popup: "Brandenburger Tor".to_string(),
                    }],
                },
                MapLayer::Heat {
                    radius: 15,
                    weight: HeatWeight::RiskNorm,
                    points: vec![HeatPoint {
                        coordinate: Coordinate::new(52.5200, 13.4049),
                        weight: 0.5,
                    }],
                },
            ],
        };

        let collection = view.to_feature_collection();
        assert_eq!(collection.features.len(), 2);

        let marker = &collection.features[0];
        assert_eq!(
            marker.geometry.as_ref().unwrap().value,
            Value::Point(vec![13.3777, 52.5163])
        );
        assert_eq!(marker.property("layer").unwrap(), "user-added");
        assert_eq!(marker.property("color").unwrap(), "red");

        let heat = &collection.features[1];
        assert_eq!(heat.property("layer").unwrap(), "heat");
        assert_eq!(heat.property("weight").unwrap(), 0.5);
        assert_eq!(heat.property("radius").unwrap(), 15);
    }

    #[test]
    fn empty_view_is_an_empty_collection() {
        let view = MapView {
            center: Coordinate::new(52.52, 13.405),
            zoom: 12,
            layers: Vec::new(),
        };
        let json = view.to_feature_collection().to_string();
        assert!(json.contains("\"FeatureCollection\""));
    }
}
