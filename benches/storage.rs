//! Storage benchmark: insert and read sales rows.

use chrono::{Duration, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use shelfwatch::storage::{SalesFilter, SalesStore};
use shelfwatch::SalesRecord;
use tempfile::tempdir;

fn rows(n: i64) -> Vec<SalesRecord> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    (0..n)
        .map(|d| SalesRecord::new(start + Duration::days(d), 1, 100.0).with_waste(5.0))
        .collect()
}

fn bench_insert_sales(c: &mut Criterion) {
    let batch = rows(365);

    c.bench_function("storage_insert_365_rows", |b| {
        b.iter_batched(
            || SalesStore::open_in_memory().unwrap(),
            |store| black_box(store.insert_sales(&batch)).unwrap(),
            BatchSize::SmallInput,
        )
    });
}

fn bench_read_sales(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let store = SalesStore::open(&dir.path().join("sales.db")).unwrap();
    store.insert_sales(&rows(365)).unwrap();

    c.bench_function("storage_read_all", |b| {
        b.iter(|| black_box(store.sales(&SalesFilter::default())).unwrap())
    });
}

criterion_group!(benches, bench_insert_sales, bench_read_sales);
criterion_main!(benches);
