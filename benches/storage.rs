//! Result store benchmark: bulk insert and lookup of velocity records.

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use issuer_velocity::assembler::VelocityRecord;
use issuer_velocity::normalizer::{Event, TransactionPayload};
use issuer_velocity::storage::VelocityStore;
use tempfile::tempdir;

fn make_records(n: usize) -> Vec<VelocityRecord> {
    (0..n)
        .map(|i| VelocityRecord {
            index: i,
            event: Event::new(
                "Bench Bank",
                Utc::now(),
                format!("t{}", i),
                TransactionPayload {
                    transaction_id: format!("t{}", i),
                    fraudulent: Some(false),
                },
            ),
            velocity: i as u64,
        })
        .collect()
}

fn bench_insert_records(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("velocity.db");
    let mut store = VelocityStore::open(&path).unwrap();
    let records = make_records(1_000);

    c.bench_function("storage_insert_1k_records", |b| {
        b.iter(|| black_box(store.insert_records("bench", &records)).unwrap())
    });
}

fn bench_get_record(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("velocity.db");
    let mut store = VelocityStore::open(&path).unwrap();
    store.insert_records("bench", &make_records(1_000)).unwrap();

    c.bench_function("storage_get_record", |b| {
        b.iter(|| black_box(store.get_record("t500")).unwrap())
    });
}

criterion_group!(benches, bench_insert_records, bench_get_record);
criterion_main!(benches);
