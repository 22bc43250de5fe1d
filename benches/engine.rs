//! Engine benchmark: sort + sliding-window velocity over synthetic issuer traffic.

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use issuer_velocity::config::WindowConfig;
use issuer_velocity::engine::VelocityEngine;
use issuer_velocity::normalizer::Event;
use issuer_velocity::pipeline::BatchPipeline;

fn make_events(n: usize, issuers: usize) -> Vec<Event<()>> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    (0..n)
        .map(|i| {
            // scrambled times so the sort has work to do
            let minutes = ((i * 7919) % n) as i64;
            Event::new(
                format!("issuer_{}", i % issuers),
                start + Duration::minutes(minutes),
                format!("t{}", i),
                (),
            )
        })
        .collect()
}

fn bench_engine_sorted(c: &mut Criterion) {
    let mut events = make_events(100_000, 50);
    events.sort_by_key(|e| e.event_time);

    c.bench_function("engine_observe_100k", |b| {
        b.iter(|| {
            let mut engine = VelocityEngine::with_window(Duration::hours(24));
            for e in &events {
                black_box(engine.observe(&e.entity_key, e.event_time, &e.event_id).unwrap());
            }
        })
    });
}

fn bench_batch_pipeline(c: &mut Criterion) {
    let events = make_events(100_000, 50);

    let mut g = c.benchmark_group("batch_by_shards");
    for shards in [1, 4] {
        let pipeline = BatchPipeline::with_window(WindowConfig::default()).shards(shards);
        g.bench_function(format!("shards_{}", shards).as_str(), |b| {
            b.iter(|| black_box(pipeline.run_events(events.clone()).unwrap()))
        });
    }
    g.finish();
}

criterion_group!(benches, bench_engine_sorted, bench_batch_pipeline);
criterion_main!(benches);
