//! Google Places text-search client.
//!
//! `GET {base_url}?query=..&location=lat,lng&radius=..&key=..[&pagetoken=..]`
//!
//! The response carries up to 20 results and, when more are available, a
//! `next_page_token`.
//!
//! See <https://developers.google.com/maps/documentation/places/web-service/search-text>

use async_trait::async_trait;
use berlin_map_places_models::Coordinate;

use crate::{PlacesError, RawPlace, SearchPage, TextSearch};

/// Text-search backend for the Google Places API.
#[derive(Debug, Clone)]
pub struct GoogleTextSearch {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    center: Coordinate,
    radius_m: u32,
}

impl GoogleTextSearch {
    /// Creates a client biased towards `center` within `radius_m` meters.
    #[must_use]
    pub fn new(
        client: reqwest::Client,
        base_url: &str,
        api_key: &str,
        center: Coordinate,
        radius_m: u32,
    ) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
            api_key: api_key.to_string(),
            center,
            radius_m,
        }
    }
}

#[async_trait]
impl TextSearch for GoogleTextSearch {
    async fn search_page(
        &self,
        query: &str,
        page_token: Option<&str>,
    ) -> Result<SearchPage, PlacesError> {
        let location = self.center.to_query_param();
        let radius = self.radius_m.to_string();
        let mut params = vec![
            ("query", query),
            ("location", location.as_str()),
            ("radius", radius.as_str()),
            ("key", self.api_key.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pagetoken", token));
        }

        let resp = self.client.get(&self.base_url).query(&params).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(PlacesError::Status {
                status: status.as_u16(),
            });
        }

        let body: serde_json::Value = resp.json().await?;
        parse_page(&body)
    }
}

/// Parses one text-search response page.
///
/// `ZERO_RESULTS` is an empty page. Rows without a name or a location are
/// skipped.
fn parse_page(body: &serde_json::Value) -> Result<SearchPage, PlacesError> {
    let status = body["status"].as_str().unwrap_or("");
    match status {
        "OK" => {}
        "ZERO_RESULTS" => return Ok(SearchPage::default()),
        _ => {
            return Err(PlacesError::Api {
                status: status.to_string(),
                message: body["error_message"].as_str().map(String::from),
            });
        }
    }

    let places = body["results"]
        .as_array()
        .map(|results| results.iter().filter_map(parse_place).collect())
        .unwrap_or_default();

    let next_page_token = body["next_page_token"].as_str().map(String::from);

    Ok(SearchPage {
        places,
        next_page_token,
    })
}

fn parse_place(result: &serde_json::Value) -> Option<RawPlace> {
    let Some(name) = result["name"].as_str() else {
        log::debug!("Skipping search result without a name");
        return None;
    };

    let location = &result["geometry"]["location"];
    let (Some(lat), Some(lng)) = (location["lat"].as_f64(), location["lng"].as_f64()) else {
        log::debug!("Skipping '{name}': no location in search result");
        return None;
    };

    Some(RawPlace {
        name: name.to_string(),
        address: result["formatted_address"].as_str().map(String::from),
        coordinate: Coordinate::new(lat, lng),
        rating: result["rating"].as_f64(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_results_and_token() {
        let body = serde_json::json!({
            "status": "OK",
            "next_page_token": "AW30NDw",
            "results": [
                {
                    "name": "Katz Orange",
                    "formatted_address": "Bergstraße 22, 10115 Berlin, Germany",
                    "geometry": { "location": { "lat": 52.5306, "lng": 13.3944 } },
                    "rating": 4.6
                },
                {
                    "name": "Imbiss ohne Bewertung",
                    "geometry": { "location": { "lat": 52.51, "lng": 13.42 } }
                }
            ]
        });

        let page = parse_page(&body).unwrap();

        assert_eq!(page.next_page_token.as_deref(), Some("AW30NDw"));
        assert_eq!(page.places.len(), 2);
        assert_eq!(page.places[0].name, "Katz Orange");
        assert_eq!(page.places[0].rating, Some(4.6));
        assert_eq!(
            page.places[0].address.as_deref(),
            Some("Bergstraße 22, 10115 Berlin, Germany")
        );
        assert_eq!(page.places[1].rating, None);
        assert_eq!(page.places[1].address, None);
    }

    #[test]
    fn zero_results_is_an_empty_last_page() {
        let body = serde_json::json!({ "status": "ZERO_RESULTS", "results": [] });
        let page = parse_page(&body).unwrap();
        assert!(page.places.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn error_status_is_surfaced() {
        let body = serde_json::json!({
            "status": "REQUEST_DENIED",
            "error_message": "The provided API key is invalid."
        });
        let err = parse_page(&body).unwrap_err();
        assert!(matches!(err, PlacesError::Api { ref status, .. } if status == "REQUEST_DENIED"));
        assert_eq!(
            err.to_string(),
            "Places search returned REQUEST_DENIED: The provided API key is invalid."
        );
    }

    #[test]
    fn rows_without_location_are_skipped() {
        let body = serde_json::json!({
            "status": "OK",
            "results": [
                { "name": "Nowhere" },
                { "geometry": { "location": { "lat": 52.5, "lng": 13.4 } } },
                { "name": "Somewhere", "geometry": { "location": { "lat": 52.5, "lng": 13.4 } } }
            ]
        });
        let page = parse_page(&body).unwrap();
        assert_eq!(page.places.len(), 1);
        assert_eq!(page.places[0].name, "Somewhere");
    }
}
