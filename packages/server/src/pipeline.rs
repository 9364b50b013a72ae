//! One top-to-bottom run of the map pipeline.
//!
//! Shared by the HTTP handlers and the `berlin_map` CLI. Nothing here is
//! cached between runs except what the caller's [`GeocodeCache`] holds.

use std::sync::Arc;

use berlin_map_composer::{LayerVisibility, MapComposer, PlaceLayers};
use berlin_map_config::{Config, ConfigError, CrimeConfig, MapConfig, SearchConfig};
use berlin_map_crime::{CrimeError, DatasetLayout, progress::ProgressCallback};
use berlin_map_crime_models::CrimeAggregate;
use berlin_map_geocoder::{Geocode, GeocodeCache, google::GoogleGeocoder};
use berlin_map_places::{
    Pacer, PlacesError, PlacesFetcher, TextSearch, google::GoogleTextSearch, pacer::FixedDelay,
};
use berlin_map_places_models::PlaceCategory;

/// The production places fetcher.
pub type GooglePlacesFetcher = PlacesFetcher<GoogleTextSearch, FixedDelay>;

/// Builds the Google-backed places fetcher described by `config`.
///
/// # Errors
///
/// Returns [`ConfigError::MissingApiKey`] if no API key is configured.
pub fn places_fetcher(
    client: reqwest::Client,
    config: &Config,
) -> Result<GooglePlacesFetcher, ConfigError> {
    let search = GoogleTextSearch::new(
        client,
        &config.google.places_url,
        config.api_key()?,
        config.search.center,
        config.search.radius_m,
    );
    Ok(
        PlacesFetcher::new(search, FixedDelay::from_millis(config.search.page_delay_ms))
            .with_max_pages(config.search.max_pages),
    )
}

/// Builds the Google-backed geocoder described by `config`.
///
/// # Errors
///
/// Returns [`ConfigError::MissingApiKey`] if no API key is configured.
pub fn google_geocoder(
    client: reqwest::Client,
    config: &Config,
) -> Result<GoogleGeocoder, ConfigError> {
    Ok(GoogleGeocoder::new(
        client,
        &config.google.geocode_url,
        config.api_key()?,
    ))
}

/// Builds the composer for the configured map center, zoom and heat radius.
#[must_use]
pub const fn composer(map: &MapConfig) -> MapComposer {
    MapComposer::new(map.center, map.zoom, map.heat_radius)
}

/// Fetches every searchable category that `visibility` shows.
///
/// Hidden categories are not searched at all. User-added places are not
/// part of the result; they come from the session.
///
/// # Errors
///
/// Returns the first [`PlacesError`]; earlier categories are discarded.
pub async fn fetch_places<S: TextSearch, P: Pacer>(
    fetcher: &PlacesFetcher<S, P>,
    search: &SearchConfig,
    visibility: &LayerVisibility,
    min_rating: Option<f64>,
) -> Result<PlaceLayers, PlacesError> {
    let mut layers = PlaceLayers::new();

    for &category in PlaceCategory::searchable() {
        if !visibility.shows(category) {
            continue;
        }
        let Some(query) = search.query_for(category) else {
            log::warn!("No search query configured for {category}, skipping");
            continue;
        };

        let places = fetcher.fetch(query, category, min_rating).await?;
        log::info!("[{category}] {} places", places.len());
        layers.insert(category, places);
    }

    Ok(layers)
}

/// Loads the configured crime CSV and aggregates it through `cache`.
///
/// # Errors
///
/// Returns [`CrimeError`] if the file cannot be read or a geocoding request
/// fails.
pub async fn load_crime(
    config: &CrimeConfig,
    geocoder: &(impl Geocode + ?Sized),
    cache: &mut GeocodeCache,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<CrimeAggregate, CrimeError> {
    let rows = berlin_map_crime::load_rows(&config.csv_path, &DatasetLayout::from(config))?;
    berlin_map_crime::aggregate(&rows, geocoder, cache, &config.geocode_suffix, progress).await
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use berlin_map_places::{RawPlace, SearchPage, pacer::NoDelay};
    use berlin_map_places_models::Coordinate;

    use super::*;

    #[derive(Default)]
    struct RecordingSearch {
        queries: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl TextSearch for RecordingSearch {
        async fn search_page(
            &self,
            query: &str,
            _page_token: Option<&str>,
        ) -> Result<SearchPage, PlacesError> {
            self.queries.lock().unwrap().push(query.to_string());
            Ok(SearchPage {
                places: vec![RawPlace {
                    name: format!("{query} #1"),
                    address: None,
                    coordinate: Coordinate::new(52.5, 13.4),
                    rating: Some(4.7),
                }],
                next_page_token: None,
            })
        }
    }

    #[tokio::test]
    async fn hidden_categories_are_not_searched() {
        let config = Config::embedded().unwrap();
        let fetcher = PlacesFetcher::new(RecordingSearch::default(), NoDelay);
        let visibility = LayerVisibility {
            hotels: false,
            ..LayerVisibility::default()
        };

        let layers = fetch_places(&fetcher, &config.search, &visibility, None)
            .await
            .unwrap();

        assert!(layers.contains_key(&PlaceCategory::Restaurant));
        assert!(layers.contains_key(&PlaceCategory::Attraction));
        assert!(!layers.contains_key(&PlaceCategory::Hotel));
        assert!(!layers.contains_key(&PlaceCategory::UserAdded));
    }

    #[tokio::test]
    async fn categories_without_a_query_are_skipped() {
        let mut config = Config::embedded().unwrap();
        config.search.queries.remove(&PlaceCategory::Attraction);
        let fetcher = PlacesFetcher::new(RecordingSearch::default(), NoDelay);

        let layers = fetch_places(&fetcher, &config.search, &LayerVisibility::default(), None)
            .await
            .unwrap();

        assert_eq!(layers.len(), 2);
        assert_eq!(fetcher_queries(&fetcher).len(), 2);
    }

    fn fetcher_queries(fetcher: &PlacesFetcher<RecordingSearch, NoDelay>) -> Vec<String> {
        fetcher.search().queries.lock().unwrap().clone()
    }

    #[test]
    fn builders_require_api_key() {
        let config = Config::embedded().unwrap();
        assert!(matches!(
            places_fetcher(reqwest::Client::new(), &config),
            Err(ConfigError::MissingApiKey)
        ));
        assert!(matches!(
            google_geocoder(reqwest::Client::new(), &config),
            Err(ConfigError::MissingApiKey)
        ));
    }
}
