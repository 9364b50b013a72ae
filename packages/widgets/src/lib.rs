#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Exchange-rate and weather display widgets.
//!
//! Small, independent lookups shown next to the map. Neither feeds the
//! places/crime pipeline.

pub mod exchange;
pub mod weather;

pub use exchange::{ExchangeRate, ExchangeRateClient};
pub use weather::{CurrentWeather, WeatherClient};

/// Errors from widget lookups.
#[derive(Debug, thiserror::Error)]
pub enum WidgetError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status.
    #[error("Request failed with HTTP {status}")]
    Status {
        /// HTTP status code returned.
        status: u16,
    },

    /// A field the widget needs is missing from the response.
    #[error("Missing field '{field}' in response")]
    MissingField {
        /// JSON path of the field.
        field: String,
    },
}

/// Sends a GET request and returns the JSON body, failing on non-success
/// statuses.
async fn get_json(request: reqwest::RequestBuilder) -> Result<serde_json::Value, WidgetError> {
    let resp = request.send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(WidgetError::Status {
            status: status.as_u16(),
        });
    }
    Ok(resp.json().await?)
}
