//! Chat-completion rate source
//!
//! Asks an OpenAI-compatible chat endpoint to reply with a JSON object of
//! exchange rates against USD. The model gives no guarantee of precision or
//! freshness, so prefer [`ExchangeApiSource`](super::ExchangeApiSource) when a
//! market-data endpoint is reachable.

use super::RateProvider;
use crate::currency::{known_codes, CurrencyCode, BASE_CURRENCY};
use crate::data::fx::RateTable;
use crate::error::{RateCacheError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Chat-completion backed rate source
pub struct ChatCompletionSource {
    api_key: String,
    client: Client,
    endpoint: String,
    model: String,
    currencies: Vec<CurrencyCode>,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

impl ChatCompletionSource {
    /// Create a source for the catalogue currencies
    pub fn new(api_key: String, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| {
                RateCacheError::ProviderUnavailable(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            api_key,
            client,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            currencies: known_codes(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.endpoint = endpoint.trim_end_matches('/').to_string();
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_currencies(mut self, currencies: Vec<CurrencyCode>) -> Self {
        self.currencies = currencies;
        self
    }

    fn prompt(&self) -> String {
        let codes: Vec<&str> = self
            .currencies
            .iter()
            .filter(|code| !code.is_base())
            .map(|code| code.as_str())
            .collect();
        format!(
            "Give the current exchange rates for 1 {} in these currencies: {}. \
             Reply with only a JSON object mapping each currency code to a number, \
             for example {{\"EUR\": 0.92}}.",
            BASE_CURRENCY,
            codes.join(", ")
        )
    }

    async fn request_rates(&self) -> Result<RateTable> {
        let url = format!("{}/chat/completions", self.endpoint);
        let request = ChatRequest {
            model: &self.model,
            temperature: 0.0,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: "You are a currency exchange rate service. Respond with JSON only."
                        .to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: self.prompt(),
                },
            ],
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| RateCacheError::ProviderUnavailable(format!("HTTP request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(RateCacheError::ProviderUnavailable(format!(
                "Chat endpoint returned error: {}",
                response.status()
            )));
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            RateCacheError::ProviderUnavailable(format!("Failed to decode response: {}", e))
        })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| RateCacheError::ProviderUnavailable("Empty completion".to_string()))?;

        parse_completion(&content)
    }
}

impl RateProvider for ChatCompletionSource {
    async fn fetch_rates(&self) -> Result<RateTable> {
        self.request_rates().await
    }

    fn name(&self) -> &str {
        "chat-completion"
    }
}

/// Extract a rate table from the assistant's reply
///
/// Accepts a bare object or one nested under `"rates"`, optionally wrapped in
/// a Markdown code fence; numeric strings are accepted as rates.
pub(crate) fn parse_completion(content: &str) -> Result<RateTable> {
    let json = strip_code_fence(content);
    let value: Value = serde_json::from_str(json).map_err(|e| {
        RateCacheError::ProviderUnavailable(format!("Completion is not JSON: {}", e))
    })?;

    let object = match value.get("rates").unwrap_or(&value) {
        Value::Object(map) => map,
        _ => {
            return Err(RateCacheError::ProviderUnavailable(
                "Completion is not a JSON object".to_string(),
            ))
        }
    };

    let quotes = object.iter().filter_map(|(code, rate)| {
        let rate = match rate {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match rate {
            Some(rate) => Some((code.as_str(), rate)),
            None => {
                log::warn!("Ignoring non-numeric rate for {}", code);
                None
            }
        }
    });

    RateTable::from_raw_quotes(quotes)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the info string ("json") on the opening fence line.
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
    body.trim_end().trim_end_matches("```").trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_source_creation() {
        let source = ChatCompletionSource::new("test_key".to_string(), 30);
        assert!(source.is_ok());
    }

    #[test]
    fn test_prompt_lists_currencies() {
        let source = ChatCompletionSource::new("k".to_string(), 30)
            .unwrap()
            .with_currencies(vec![CurrencyCode::USD, CurrencyCode::MYR, CurrencyCode::EUR]);
        let prompt = source.prompt();
        assert!(prompt.contains("MYR, EUR"));
        assert!(!prompt.contains("USD, "));
    }

    #[test]
    fn test_parse_plain_object() {
        let table = parse_completion(r#"{"MYR": 4.7, "EUR": 0.92}"#).unwrap();
        assert_eq!(table.get(CurrencyCode::MYR), Some(4.7));
        assert_eq!(table.get(BASE_CURRENCY), Some(1.0));
    }

    #[test]
    fn test_parse_fenced_nested_object() {
        let reply = "```json\n{\"rates\": {\"MYR\": \"4.70\", \"JPY\": 149.5}}\n```";
        let table = parse_completion(reply).unwrap();
        assert_eq!(table.get(CurrencyCode::MYR), Some(4.7));
        assert_eq!(table.get(CurrencyCode::JPY), Some(149.5));
    }

    #[test]
    fn test_parse_skips_unusable_entries() {
        let table = parse_completion(r#"{"MYR": 4.7, "EUR": "n/a", "GBP": null}"#).unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_parse_prose_reply() {
        let err = parse_completion("Sorry, I can't access live exchange rates.").unwrap_err();
        assert!(matches!(err, RateCacheError::ProviderUnavailable(_)));
    }

    #[test]
    fn test_parse_array_reply() {
        assert!(parse_completion("[4.7, 0.92]").is_err());
    }
}
