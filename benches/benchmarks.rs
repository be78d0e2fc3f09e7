use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fx_ratecache::currency::{known_codes, CurrencyCode};
use fx_ratecache::data::fx::{total_in, CacheEntry, RateTable};

fn sample_table() -> RateTable {
    let quotes = known_codes()
        .into_iter()
        .enumerate()
        .map(|(i, code)| (code, 0.5 + i as f64 * 1.37));
    RateTable::from_quotes(quotes).unwrap()
}

fn benchmark_convert(c: &mut Criterion) {
    let table = sample_table();
    let from = CurrencyCode::EUR;
    let to = CurrencyCode::MYR;

    c.bench_function("convert_eur_to_myr", |b| {
        b.iter(|| table.convert(black_box(50.0), black_box(from), black_box(to)))
    });

    let unknown = CurrencyCode::parse("XAU").unwrap();
    c.bench_function("convert_parity_fallback", |b| {
        b.iter(|| table.convert(black_box(50.0), black_box(unknown), black_box(to)))
    });
}

fn benchmark_build_table(c: &mut Criterion) {
    let raw: Vec<(String, f64)> = known_codes()
        .into_iter()
        .map(|code| (code.to_string().to_lowercase(), 3.21))
        .collect();

    c.bench_function("from_raw_quotes_18", |b| {
        b.iter(|| {
            RateTable::from_raw_quotes(raw.iter().map(|(code, rate)| (code.as_str(), *rate)))
                .unwrap()
        })
    });
}

fn benchmark_total(c: &mut Criterion) {
    let table = sample_table();
    let balances: Vec<(f64, CurrencyCode)> = known_codes()
        .into_iter()
        .cycle()
        .take(1000)
        .enumerate()
        .map(|(i, code)| (i as f64 * 10.0, code))
        .collect();

    c.bench_function("total_in_1000_balances", |b| {
        b.iter(|| total_in(&table, black_box(&balances), CurrencyCode::USD))
    });
}

fn benchmark_entry_json(c: &mut Criterion) {
    let entry = CacheEntry::new(sample_table(), chrono::Utc::now());
    let json = entry.to_json().unwrap();

    c.bench_function("cache_entry_from_json", |b| {
        b.iter(|| CacheEntry::from_json(black_box(&json)).unwrap())
    });
}

criterion_group!(
    benches,
    benchmark_convert,
    benchmark_build_table,
    benchmark_total,
    benchmark_entry_json
);
criterion_main!(benches);
