//! Property tests for rate-table conversion

use fx_ratecache::currency::{CurrencyCode, BASE_CURRENCY};
use fx_ratecache::data::fx::{CacheEntry, RateTable};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

fn code() -> impl Strategy<Value = CurrencyCode> {
    "[A-Z]{3}".prop_map(|s| CurrencyCode::parse(&s).unwrap())
}

fn rate() -> impl Strategy<Value = f64> {
    1e-3f64..1e4
}

fn table() -> impl Strategy<Value = RateTable> {
    prop::collection::btree_map(code(), rate(), 1..12)
        .prop_map(|quotes| RateTable::from_quotes(quotes.into_iter().filter(|(c, _)| !c.is_base())).ok())
        .prop_filter_map("need at least one non-base quote", |t| t)
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
}

proptest! {
    #[test]
    fn converting_to_same_currency_is_identity(t in table(), amount in -1e9f64..1e9, c in code()) {
        prop_assert!(close(t.convert(amount, c, c), amount));
    }

    #[test]
    fn round_trip_recovers_amount(t in table(), amount in -1e6f64..1e6) {
        let codes: Vec<_> = t.codes().collect();
        for &from in &codes {
            for &to in &codes {
                let back = t.convert(t.convert(amount, from, to), to, from);
                prop_assert!(close(back, amount), "{} -> {} -> {}: {} vs {}", from, to, from, back, amount);
            }
        }
    }

    #[test]
    fn base_rate_is_always_one(t in table()) {
        prop_assert_eq!(t.get(BASE_CURRENCY), Some(1.0));
        prop_assert!(t.iter().all(|(_, r)| r.is_finite() && r > 0.0));
    }

    #[test]
    fn unknown_currency_converts_at_parity(t in table(), amount in -1e6f64..1e6, c in code()) {
        prop_assume!(!t.contains(c));
        prop_assert!(close(t.convert(amount, c, BASE_CURRENCY), amount));
        prop_assert!(close(t.convert(amount, BASE_CURRENCY, c), amount));
    }

    #[test]
    fn persisted_entry_restores_same_rates(t in table(), millis in 0i64..4_000_000_000_000) {
        let ts = Utc.timestamp_millis_opt(millis).unwrap();
        let entry = CacheEntry::new(t, ts);
        let restored = CacheEntry::from_json(&entry.to_json().unwrap()).unwrap();
        prop_assert_eq!(restored.timestamp, entry.timestamp);
        prop_assert_eq!(restored.rates.len(), entry.rates.len());
        for (c, r) in entry.rates.iter() {
            prop_assert!(close(restored.rates.rate(c), r));
        }
    }
}
