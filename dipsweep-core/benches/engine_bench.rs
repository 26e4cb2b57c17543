//! Criterion benchmarks for DipSweep hot paths.
//!
//! Benchmarks:
//! 1. Reinvestment engine (one threshold over N days)
//! 2. Buy/sell engine (one threshold over N days, transaction tape included)
//! 3. CSV ingest (parse + sort of an Investing.com export)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use dipsweep_core::data::read_records;
use dipsweep_core::domain::DailyRecord;
use dipsweep_core::engine::{BuySellEngine, NoopObserver, ReinvestEngine};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_records(n: usize) -> Vec<DailyRecord> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2000, 1, 3).unwrap();
    (0..n)
        .map(|i| {
            let change = (i as f64 * 0.37).sin() * 0.02;
            let price = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            DailyRecord::new(base_date + chrono::Duration::days(i as i64), price, change).unwrap()
        })
        .collect()
}

fn make_csv(n: usize) -> String {
    let base_date = chrono::NaiveDate::from_ymd_opt(2000, 1, 3).unwrap();
    let mut out = String::from("Date,Price,Open,High,Low,Vol.,Change %\n");
    // Newest first, like the real exports.
    for i in (0..n).rev() {
        let date = base_date + chrono::Duration::days(i as i64);
        let price = 1_000.0 + (i as f64 * 0.1).sin() * 10.0;
        let change = (i as f64 * 0.37).sin() * 2.0;
        out.push_str(&format!(
            "{},\"{:.2}\",0,0,0,1.2M,{:.2}%\n",
            date.format("%m/%d/%Y"),
            price,
            change
        ));
    }
    out
}

// ── 1. Reinvestment ──────────────────────────────────────────────────

fn bench_reinvest(c: &mut Criterion) {
    let mut group = c.benchmark_group("reinvest");
    let engine = ReinvestEngine::default();
    for n in [252, 2_520, 25_200] {
        let records = make_records(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &records, |b, recs| {
            b.iter(|| engine.run(black_box(recs), black_box(0.0), &mut NoopObserver))
        });
    }
    group.finish();
}

// ── 2. Buy/sell ──────────────────────────────────────────────────────

fn bench_buy_sell(c: &mut Criterion) {
    let mut group = c.benchmark_group("buy_sell");
    let engine = BuySellEngine::default();
    for n in [252, 2_520, 25_200] {
        let records = make_records(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &records, |b, recs| {
            b.iter(|| engine.run(black_box(recs), black_box(0.01), &mut NoopObserver))
        });
    }
    group.finish();
}

// ── 3. Ingest ────────────────────────────────────────────────────────

fn bench_ingest(c: &mut Criterion) {
    let csv = make_csv(2_520);
    c.bench_function("ingest_2520_rows", |b| {
        b.iter(|| read_records(black_box(csv.as_bytes())).unwrap())
    });
}

criterion_group!(benches, bench_reinvest, bench_buy_sell, bench_ingest);
criterion_main!(benches);
