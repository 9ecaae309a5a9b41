use std::sync::Arc;

use chrono::Utc;
use cinema_booking::services::ReservationService;
use cinema_booking::store::MemoryStore;
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use futures::future::join_all;

async fn fresh_show() -> (ReservationService<MemoryStore>, i64) {
    let store = MemoryStore::new();
    let show = store.add_show(1, 100, Utc::now()).await;
    (ReservationService::new(store), show.id)
}

// Свежий стор на каждый прогон: отменённые строки не копятся в ледгере
fn reserve_and_cancel(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("reserve_then_cancel", |b| {
        b.iter_batched(
            || rt.block_on(fresh_show()),
            |(svc, show_id)| {
                rt.block_on(async {
                    let booking = svc.reserve_seat(show_id, 1, 1).await.unwrap();
                    svc.cancel_booking(booking.id, 1).await.unwrap();
                })
            },
            BatchSize::SmallInput,
        )
    });
}

fn contended_seat(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("contended_seat");

    for callers in [8usize, 64] {
        group.bench_with_input(BenchmarkId::from_parameter(callers), &callers, |b, &callers| {
            b.to_async(&rt).iter(|| async move {
                let store = MemoryStore::new();
                let show_id = store.add_show(1, 10, Utc::now()).await.id;
                let svc = Arc::new(ReservationService::new(store));

                let tasks = (0..callers as i64).map(|user| {
                    let svc = svc.clone();
                    tokio::spawn(async move { svc.reserve_seat(show_id, 1, user).await })
                });
                join_all(tasks).await
            })
        });
    }
    group.finish();
}

criterion_group!(benches, reserve_and_cancel, contended_seat);
criterion_main!(benches);
