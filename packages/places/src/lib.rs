#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Paginated places text-search fetching.
//!
//! [`PlacesFetcher`] runs a text query against a [`TextSearch`] backend,
//! follows the continuation token page by page until the backend stops
//! returning one, and flattens everything into [`Place`] rows.
//!
//! A continuation token is only accepted a short while after it was
//! issued, so the fetcher awaits a [`Pacer`] before every follow-up
//! request. Production code uses [`pacer::FixedDelay`]; tests use
//! [`pacer::NoDelay`].

pub mod google;
pub mod pacer;

use async_trait::async_trait;
use berlin_map_places_models::{Coordinate, Place, PlaceCategory};

pub use pacer::Pacer;

/// Errors that can occur while fetching places.
#[derive(Debug, thiserror::Error)]
pub enum PlacesError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The search endpoint answered with a non-success status.
    #[error("Places search failed with HTTP {status}")]
    Status {
        /// HTTP status code returned.
        status: u16,
    },

    /// The search endpoint reported an error in its response body.
    #[error("Places search returned {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Api {
        /// API status string (e.g. `"REQUEST_DENIED"`).
        status: String,
        /// Optional explanation sent along with the status.
        message: Option<String>,
    },
}

/// One search result row, before it is assigned a category.
#[derive(Debug, Clone, PartialEq)]
pub struct RawPlace {
    /// Display name.
    pub name: String,
    /// Formatted address, if present.
    pub address: Option<String>,
    /// Location of the place.
    pub coordinate: Coordinate,
    /// Average rating, if the place has been rated.
    pub rating: Option<f64>,
}

impl RawPlace {
    /// Converts the row into a [`Place`] of the given category.
    #[must_use]
    pub fn into_place(self, category: PlaceCategory) -> Place {
        Place {
            name: self.name,
            address: self.address,
            coordinate: self.coordinate,
            rating: self.rating,
            category,
        }
    }
}

/// A single page of search results.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchPage {
    /// Result rows on this page.
    pub places: Vec<RawPlace>,
    /// Token for requesting the next page, if there is one.
    pub next_page_token: Option<String>,
}

/// A text-search backend that returns one page per call.
#[async_trait]
pub trait TextSearch: Send + Sync {
    /// Fetches the first page for `query`, or the page identified by
    /// `page_token`.
    ///
    /// # Errors
    ///
    /// Returns [`PlacesError`] if the request fails.
    async fn search_page(
        &self,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<SearchPage, PlacesError>;
}

/// Fetches every page of a text search and converts the rows to places.
pub struct PlacesFetcher<S, P> {
    search: S,
    pacer: P,
    max_pages: Option<u32>,
}

impl<S: TextSearch, P: Pacer> PlacesFetcher<S, P> {
    /// Creates a fetcher over `search` that awaits `pacer` between pages.
    #[must_use]
    pub const fn new(search: S, pacer: P) -> Self {
        Self {
            search,
            pacer,
            max_pages: None,
        }
    }

    /// Stops after `max_pages` pages even if more are available.
    #[must_use]
    pub const fn with_max_pages(mut self, max_pages: Option<u32>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// The backend pages are requested from.
    #[must_use]
    pub const fn search(&self) -> &S {
        &self.search
    }

    /// Runs `query`, following continuation tokens until none is returned,
    /// and tags every result with `category`.
    ///
    /// When `min_rating` is set, places without a rating or rated below it
    /// are excluded.
    ///
    /// # Errors
    ///
    /// Returns the first [`PlacesError`] encountered. Pages fetched before
    /// the failure are discarded.
    pub async fn fetch(
        &self,
        query: &str,
        category: PlaceCategory,
        min_rating: Option<f64>,
    ) -> Result<Vec<Place>, PlacesError> {
        let mut rows: Vec<RawPlace> = Vec::new();
        let mut token: Option<String> = None;
        let mut page: u32 = 0;

        loop {
            if let Some(max) = self.max_pages
                && page >= max
            {
                log::info!("[{category}] Reached max pages ({max}), stopping");
                break;
            }

            if token.is_some() {
                self.pacer.pause().await;
            }

            let result = self.search.search_page(query, token.as_deref()).await?;
            log::info!(
                "[{category}] Page {page}: {} results (total: {})",
                result.places.len(),
                rows.len() + result.places.len()
            );
            rows.extend(result.places);
            page += 1;

            match result.next_page_token {
                Some(next) if !next.is_empty() => token = Some(next),
                _ => break,
            }
        }

        let places: Vec<Place> = rows
            .into_iter()
            .map(|row| row.into_place(category))
            .collect();

        Ok(match min_rating {
            Some(min) => filter_by_rating(places, min),
            None => places,
        })
    }
}

/// Keeps only places rated at least `min_rating`. Unrated places are
/// dropped.
#[must_use]
pub fn filter_by_rating(places: Vec<Place>, min_rating: f64) -> Vec<Place> {
    let before = places.len();
    let kept: Vec<Place> = places
        .into_iter()
        .filter(|p| p.meets_rating(min_rating))
        .collect();
    log::debug!(
        "Rating filter >= {min_rating}: kept {} of {before}",
        kept.len()
    );
    kept
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::pacer::NoDelay;

    /// Serves pre-built pages keyed by the token used to request them.
    struct ScriptedSearch {
        pages: BTreeMap<Option<String>, Result<SearchPage, u16>>,
        requests: Mutex<Vec<Option<String>>>,
    }

    impl ScriptedSearch {
        fn new(pages: Vec<(Option<&str>, Result<SearchPage, u16>)>) -> Self {
            Self {
                pages: pages
                    .into_iter()
                    .map(|(k, v)| (k.map(str::to_string), v))
                    .collect(),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl TextSearch for ScriptedSearch {
        async fn search_page(
            &self,
            _query: &str,
            page_token: Option<&str>,
        ) -> Result<SearchPage, PlacesError> {
            let key = page_token.map(str::to_string);
            self.requests.lock().unwrap().push(key.clone());
            match self.pages.get(&key) {
                Some(Ok(page)) => Ok(page.clone()),
                Some(Err(status)) => Err(PlacesError::Status { status: *status }),
                None => Ok(SearchPage::default()),
            }
        }
    }

    struct CountingPacer {
        pauses: AtomicUsize,
    }

    #[async_trait]
    impl Pacer for CountingPacer {
        async fn pause(&self) {
            self.pauses.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn raw(name: &str, rating: Option<f64>) -> RawPlace {
        RawPlace {
            name: name.to_string(),
            address: Some(format!("{name}, Berlin")),
            coordinate: Coordinate::new(52.5, 13.4),
            rating,
        }
    }

    fn page(places: Vec<RawPlace>, next: Option<&str>) -> SearchPage {
        SearchPage {
            places,
            next_page_token: next.map(str::to_string),
        }
    }

    #[tokio::test]
    async fn follows_tokens_until_exhausted() {
        let search = ScriptedSearch::new(vec![
            (None, Ok(page(vec![raw("A", Some(4.6))], Some("t1")))),
            (Some("t1"), Ok(page(vec![raw("B", Some(4.7))], Some("t2")))),
            (Some("t2"), Ok(page(vec![raw("C", Some(4.8))], None))),
        ]);
        let pacer = CountingPacer {
            pauses: AtomicUsize::new(0),
        };
        let fetcher = PlacesFetcher::new(search, pacer);

        let places = fetcher
            .fetch("Berlin restaurants", PlaceCategory::Restaurant, None)
            .await
            .unwrap();

        let names: Vec<&str> = places.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["A", "B", "C"]);
        assert!(
            places
                .iter()
                .all(|p| p.category == PlaceCategory::Restaurant)
        );
        // One pause before each continuation request, none before the first.
        assert_eq!(fetcher.pacer.pauses.load(Ordering::SeqCst), 2);
        assert_eq!(
            *fetcher.search.requests.lock().unwrap(),
            vec![None, Some("t1".to_string()), Some("t2".to_string())]
        );
    }

    #[tokio::test]
    async fn min_rating_excludes_low_and_missing_ratings() {
        let search = ScriptedSearch::new(vec![(
            None,
            Ok(page(
                vec![
                    raw("great", Some(4.9)),
                    raw("exact", Some(4.5)),
                    raw("meh", Some(4.4)),
                    raw("unrated", None),
                ],
                None,
            )),
        )]);
        let fetcher = PlacesFetcher::new(search, NoDelay);

        let places = fetcher
            .fetch("Berlin hotels", PlaceCategory::Hotel, Some(4.5))
            .await
            .unwrap();

        assert!(places.iter().all(|p| p.rating.is_some_and(|r| r >= 4.5)));
        let names: Vec<&str> = places.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["great", "exact"]);
    }

    #[tokio::test]
    async fn http_failure_discards_earlier_pages() {
        let search = ScriptedSearch::new(vec![
            (None, Ok(page(vec![raw("A", Some(5.0))], Some("t1")))),
            (Some("t1"), Err(500)),
        ]);
        let fetcher = PlacesFetcher::new(search, NoDelay);

        let result = fetcher
            .fetch("Berlin tourist attractions", PlaceCategory::Attraction, None)
            .await;

        assert!(matches!(result, Err(PlacesError::Status { status: 500 })));
    }

    #[tokio::test]
    async fn max_pages_caps_the_loop() {
        let search = ScriptedSearch::new(vec![
            (None, Ok(page(vec![raw("A", None)], Some("t1")))),
            (Some("t1"), Ok(page(vec![raw("B", None)], Some("t2")))),
        ]);
        let fetcher = PlacesFetcher::new(search, NoDelay).with_max_pages(Some(1));

        let places = fetcher
            .fetch("Berlin restaurants", PlaceCategory::Restaurant, None)
            .await
            .unwrap();

        assert_eq!(places.len(), 1);
        assert_eq!(fetcher.search.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_token_ends_pagination() {
        let search = ScriptedSearch::new(vec![(None, Ok(page(vec![raw("A", None)], Some(""))))]);
        let fetcher = PlacesFetcher::new(search, NoDelay);

        let places = fetcher
            .fetch("q", PlaceCategory::Restaurant, None)
            .await
            .unwrap();

        assert_eq!(places.len(), 1);
        assert_eq!(fetcher.search.requests.lock().unwrap().len(), 1);
    }
}
