//! Currency exchange-rate widget.
//!
//! `GET {base_url}/{BASE}` returning `{"result": "success", "rates": {..}}`.

use serde::Serialize;

use crate::{WidgetError, get_json};

/// A single conversion rate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    /// Currency converted from.
    pub base: String,
    /// Currency converted to.
    pub target: String,
    /// Units of `target` per unit of `base`.
    pub rate: f64,
}

/// Client for the exchange-rate endpoint.
#[derive(Debug, Clone)]
pub struct ExchangeRateClient {
    client: reqwest::Client,
    base_url: String,
}

impl ExchangeRateClient {
    /// Creates a client for the endpoint at `base_url`.
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Looks up how many `target` units one `base` unit buys.
    ///
    /// Currency codes are upper-cased before use.
    ///
    /// # Errors
    ///
    /// Returns [`WidgetError`] if the request fails or the rate is missing.
    pub async fn rate(&self, base: &str, target: &str) -> Result<ExchangeRate, WidgetError> {
        let base = base.to_uppercase();
        let target = target.to_uppercase();
        let url = format!("{}/{base}", self.base_url);

        log::debug!("Fetching exchange rate {base} -> {target}");
        let body = get_json(self.client.get(&url)).await?;
        parse_rate(&body, &base, &target)
    }
}

fn parse_rate(body: &serde_json::Value, base: &str, target: &str) -> Result<ExchangeRate, WidgetError> {
    let rate = body["rates"][target]
        .as_f64()
        .ok_or_else(|| WidgetError::MissingField {
            field: format!("rates.{target}"),
        })?;

    Ok(ExchangeRate {
        base: base.to_string(),
        target: target.to_string(),
        rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_target_rate() {
        let body = serde_json::json!({
            "result": "success",
            "base_code": "EUR",
            "rates": { "EUR": 1, "KRW": 1452.37, "USD": 1.08 }
        });
        let rate = parse_rate(&body, "EUR", "KRW").unwrap();
        assert_eq!(rate.target, "KRW");
        assert!((rate.rate - 1452.37).abs() < 1e-9);
    }

    #[test]
    fn unknown_currency_is_missing_field() {
        let body = serde_json::json!({ "result": "error", "error-type": "unsupported-code" });
        let err = parse_rate(&body, "EUR", "XYZ").unwrap_err();
        assert_eq!(err.to_string(), "Missing field 'rates.XYZ' in response");
    }
}
