//! Current-weather widget backed by the Open-Meteo forecast API.
//!
//! See <https://open-meteo.com/en/docs>

use berlin_map_places_models::Coordinate;
use serde::Serialize;

use crate::{WidgetError, get_json};

/// Current conditions at a location.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentWeather {
    /// Air temperature in °C.
    pub temperature: f64,
    /// Wind speed in km/h.
    pub windspeed: f64,
    /// WMO weather interpretation code.
    pub weathercode: u32,
}

/// Client for the weather endpoint.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: reqwest::Client,
    base_url: String,
}

impl WeatherClient {
    /// Creates a client for the endpoint at `base_url`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    /// Fetches the current weather at `coordinate`.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError`] if the request fails or a field is missing.
    pub async fn current(&self, coordinate: Coordinate) -> Result<CurrentWeather, WidgetError> {
        let request = self.client.get(&self.base_url).query(&[
            ("latitude", coordinate.latitude.to_string()),
            ("longitude", coordinate.longitude.to_string()),
            ("current_weather", "true".to_string()),
        ]);
        let body = get_json(request).await?;
        parse_current(&body)
    }
}

fn parse_current(body: &serde_json::Value) -> Result<CurrentWeather, WidgetError> {
    let current = &body["current_weather"];
    let field = |name: &str| WidgetError::MissingField {
        field: format!("current_weather.{name}"),
    };

    Ok(CurrentWeather {
        temperature: current["temperature"]
            .as_f64()
            .ok_or_else(|| field("temperature"))?,
        windspeed: current["windspeed"]
            .as_f64()
            .ok_or_else(|| field("windspeed"))?,
        weathercode: current["weathercode"]
            .as_u64()
            .and_then(|c| u32::try_from(c).ok())
            .ok_or_else(|| field("weathercode"))?,
    })
}
