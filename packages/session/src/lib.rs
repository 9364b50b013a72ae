#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-visitor session state.
//!
//! A [`Session`] owns the places a visitor added by address and the geocode
//! cache reused by every pipeline run made on their behalf. The server keeps
//! sessions in a [`SessionStore`]; the CLI uses a single [`Session`].

pub mod store;

use berlin_map_geocoder::{Geocode, GeocodeCache, GeocodeError, geocode_cached};
use berlin_map_places_models::{Place, PlaceCategory};
use thiserror::Error;
use uuid::Uuid;

pub use store::SessionStore;

/// Errors from session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The address could not be resolved to a location.
    #[error("Address not found: {address}")]
    AddressNotFound {
        /// Address as entered.
        address: String,
    },

    /// The name or address was blank.
    #[error("{field} must not be empty")]
    EmptyField {
        /// Which input was blank.
        field: &'static str,
    },

    /// The geocoding request failed.
    #[error(transparent)]
    Geocode(#[from] GeocodeError),
}

/// State for one visitor.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    custom_places: Vec<Place>,
    geocode_cache: GeocodeCache,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Creates an empty session with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    /// Creates an empty session with a known id.
    #[must_use]
    pub const fn with_id(id: Uuid) -> Self {
        Self {
            id,
            custom_places: Vec::new(),
            geocode_cache: GeocodeCache::new(),
        }
    }

    /// Id the session is registered under.
    #[must_use]
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// Places added by the visitor, in insertion order.
    #[must_use]
    pub fn custom_places(&self) -> &[Place] {
        &self.custom_places
    }

    /// Geocoding results gathered so far, including misses.
    #[must_use]
    pub const fn geocode_cache(&self) -> &GeocodeCache {
        &self.geocode_cache
    }

    /// Mutable access to the cache for pipeline runs.
    pub const fn geocode_cache_mut(&mut self) -> &mut GeocodeCache {
        &mut self.geocode_cache
    }

    /// Geocodes `address` and, on a match, records a user-added place.
    ///
    /// The lookup goes through the session cache, so adding the same
    /// address twice only queries the geocoder once.
    ///
    /// # Errors
    ///
    /// * [`SessionError::EmptyField`] if `name` or `address` is blank
    /// * [`SessionError::AddressNotFound`] if the geocoder has no match
    /// * [`SessionError::Geocode`] if the lookup itself fails
    pub async fn add_place_by_address(
        &mut self,
        geocoder: &(impl Geocode + ?Sized),
        name: &str,
        address: &str,
    ) -> Result<Place, SessionError> {
        let name = name.trim();
        let address = address.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyField { field: "name" });
        }
        if address.is_empty() {
            return Err(SessionError::EmptyField { field: "address" });
        }

        let Some(coordinate) = geocode_cached(geocoder, &mut self.geocode_cache, address).await?
        else {
            log::info!("Session {}: no match for address '{address}'", self.id);
            return Err(SessionError::AddressNotFound {
                address: address.to_string(),
            });
        };

        let place = Place {
            name: name.to_string(),
            address: Some(address.to_string()),
            coordinate,
            rating: None,
            category: PlaceCategory::UserAdded,
        };
        log::info!(
            "Session {}: added '{}' at {}",
            self.id,
            place.name,
            coordinate.to_query_param()
        );
        self.custom_places.push(place.clone());

        Ok(place)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use berlin_map_places_models::Coordinate;

    use super::*;

    struct FixedGeocoder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Geocode for FixedGeocoder {
        async fn geocode(&self, query: &str) -> Result<Option<Coordinate>, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((query == "Pariser Platz, Berlin").then_some(Coordinate::new(52.5163, 13.3777)))
        }
    }

    fn geocoder() -> FixedGeocoder {
        FixedGeocoder {
            calls: AtomicUsize::new(0),
        }
    }

    #[tokio::test]
    async fn adds_user_place_on_match() {
        let geocoder = geocoder();
        let mut session = Session::new();

        let place = session
            .add_place_by_address(&geocoder, "Brandenburger Tor", "Pariser Platz, Berlin")
            .await
            .unwrap();

        assert_eq!(place.category, PlaceCategory::UserAdded);
        assert_eq!(place.rating, None);
        assert_eq!(place.coordinate, Coordinate::new(52.5163, 13.3777));
        assert_eq!(session.custom_places(), &[place]);
    }

    #[tokio::test]
    async fn unknown_address_leaves_places_unchanged() {
        let geocoder = geocoder();
        let mut session = Session::new();

        let err = session
            .add_place_by_address(&geocoder, "Nowhere", "Atlantis")
            .await
            .unwrap_err();

        assert!(matches!(err, SessionError::AddressNotFound { ref address } if address == "Atlantis"));
        assert!(session.custom_places().is_empty());
    }

    #[tokio::test]
    async fn repeated_address_is_geocoded_once() {
        let geocoder = geocoder();
        let mut session = Session::new();

        for name in ["Tor", "Tor again"] {
            session
                .add_place_by_address(&geocoder, name, "Pariser Platz, Berlin")
                .await
                .unwrap();
        }

        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 1);
        assert_eq!(session.custom_places().len(), 2);
        assert_eq!(session.geocode_cache().len(), 1);
    }

    #[tokio::test]
    async fn blank_inputs_are_rejected_without_lookup() {
        let geocoder = geocoder();
        let mut session = Session::new();

        assert!(matches!(
            session.add_place_by_address(&geocoder, "  ", "Pariser Platz, Berlin").await,
            Err(SessionError::EmptyField { field: "name" })
        ));
        assert!(matches!(
            session.add_place_by_address(&geocoder, "Tor", "").await,
            Err(SessionError::EmptyField { field: "address" })
        ));
        assert_eq!(geocoder.calls.load(Ordering::SeqCst), 0);
    }
}
