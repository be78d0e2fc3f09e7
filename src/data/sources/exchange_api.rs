//! Market-data exchange-rate API
//!
//! Speaks the `open.er-api.com` layout: `GET {base}/latest/USD` returning
//! `{"result": "success", "base_code": "USD", "rates": {"MYR": 4.7, ...}}`.

use super::RateProvider;
use crate::currency::BASE_CURRENCY;
use crate::data::fx::RateTable;
use crate::error::{RateCacheError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://open.er-api.com/v6";

/// Exchange-rate API source (no API key required)
pub struct ExchangeApiSource {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    result: String,
    #[serde(default)]
    base_code: Option<String>,
    #[serde(default)]
    rates: HashMap<String, f64>,
    #[serde(rename = "error-type", default)]
    error_type: Option<String>,
}

impl ExchangeApiSource {
    /// Create a source against the public endpoint
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, 30)
    }

    pub fn with_base_url(base_url: impl Into<String>, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                RateCacheError::ProviderUnavailable(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn latest_url(&self) -> String {
        format!("{}/latest/{}", self.base_url, BASE_CURRENCY)
    }

    async fn fetch_latest(&self) -> Result<RateTable> {
        let url = self.latest_url();
        log::debug!("Requesting rates from {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RateCacheError::ProviderUnavailable(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(RateCacheError::ProviderUnavailable(format!(
                "Exchange API returned error: {}",
                response.status()
            )));
        }

        let text = response.text().await.map_err(|e| {
            RateCacheError::ProviderUnavailable(format!("Failed to read response: {}", e))
        })?;

        parse_latest(&text)
    }
}

impl RateProvider for ExchangeApiSource {
    async fn fetch_rates(&self) -> Result<RateTable> {
        self.fetch_latest().await
    }

    fn name(&self) -> &str {
        "exchange-api"
    }
}

/// Decode a `/latest/USD` response body
pub(crate) fn parse_latest(body: &str) -> Result<RateTable> {
    let response: LatestResponse = serde_json::from_str(body)
        .map_err(|e| RateCacheError::ProviderUnavailable(format!("Malformed response: {}", e)))?;

    if response.result != "success" {
        return Err(RateCacheError::ProviderUnavailable(format!(
            "Exchange API reported {}: {}",
            response.result,
            response.error_type.as_deref().unwrap_or("unknown error")
        )));
    }

    match response.base_code.as_deref() {
        Some(code) if code.eq_ignore_ascii_case(BASE_CURRENCY.as_str()) => {}
        other => {
            return Err(RateCacheError::ProviderUnavailable(format!(
                "Expected rates based on {}, got {:?}",
                BASE_CURRENCY, other
            )));
        }
    }

    RateTable::from_raw_quotes(response.rates.iter().map(|(code, rate)| (code.as_str(), *rate)))
}
