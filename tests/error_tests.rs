//! Tests for error creation and message formatting

use fx_ratecache::currency::CurrencyCode;
use fx_ratecache::data::fx::{CacheEntry, RateTable};
use fx_ratecache::error::RateCacheError;

#[cfg(test)]
mod error_message_tests {
    use super::*;

    #[test]
    fn test_provider_unavailable() {
        let err = RateCacheError::ProviderUnavailable("HTTP 503".to_string());
        let msg = err.to_string();
        assert!(msg.contains("Rate provider unavailable"));
        assert!(msg.contains("503"));
    }

    #[test]
    fn test_invalid_currency_code_is_quoted() {
        let err = CurrencyCode::parse("dollars").unwrap_err();
        assert_eq!(err, RateCacheError::InvalidCurrencyCode("dollars".to_string()));
        assert_eq!(err.to_string(), "Invalid currency code: \"dollars\"");
    }

    #[test]
    fn test_invalid_rate_names_code() {
        let err = RateCacheError::InvalidRate {
            code: "MYR".to_string(),
            rate: -4.7,
        };
        let msg = err.to_string();
        assert!(msg.contains("MYR"));
        assert!(msg.contains("-4.7"));
    }

    #[test]
    fn test_malformed_entry_from_json() {
        let err = CacheEntry::from_json("{\"rates\": 12}").unwrap_err();
        assert!(matches!(err, RateCacheError::MalformedPersistedData(_)));
        assert!(err.to_string().starts_with("Malformed persisted data"));
    }

    #[test]
    fn test_strict_conversion_reports_unsupported() {
        let table = RateTable::from_quotes([(CurrencyCode::MYR, 4.7)]).unwrap();
        let err = table
            .try_convert(1.0, CurrencyCode::MYR, CurrencyCode::JPY)
            .unwrap_err();
        assert_eq!(err, RateCacheError::UnsupportedCurrency("JPY".to_string()));
    }

    #[test]
    fn test_into_provider_error_wraps_once() {
        let wrapped = RateCacheError::Serialization("bad body".to_string()).into_provider_error();
        assert_eq!(
            wrapped,
            RateCacheError::ProviderUnavailable("Serialization error: bad body".to_string())
        );
        assert_eq!(wrapped.clone().into_provider_error(), wrapped);
    }

    #[test]
    fn test_foreign_errors_flatten() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: RateCacheError = io.into();
        assert!(matches!(err, RateCacheError::Storage(ref m) if m.contains("read-only")));

        let json: RateCacheError = serde_json::from_str::<u32>("x").unwrap_err().into();
        assert!(matches!(json, RateCacheError::Serialization(_)));
    }
}
