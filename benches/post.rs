//! Performance benchmarks for typebus
//!
//! Run with: cargo bench

use criterion::{criterion_group, criterion_main, Criterion};
use std::sync::Arc;
use typebus::{Event, EventBus, TokenBag};

struct CountEvent {
    count: u32,
}
impl Event for CountEvent {}

fn bench_register_dispose(c: &mut Criterion) {
    let bus = EventBus::new();

    c.bench_function("subscribe + dispose", |b| {
        b.iter(|| {
            let token = bus.subscribe::<CountEvent>().on_event(|_, _| {});
            token.dispose();
        });
    });
}

fn bench_post_inline(c: &mut Criterion) {
    let bus = EventBus::new();
    let bag = TokenBag::new();
    bus.subscribe::<CountEvent>()
        .on_event(|event, _| {
            std::hint::black_box(event.count);
        })
        .disposed_by(&bag);

    c.bench_function("post (1 subscriber, inline)", |b| {
        b.iter(|| bus.post(CountEvent { count: 5 }));
    });
}

fn bench_post_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("post_fanout");
    for subscribers in [1, 10, 100] {
        let bus = EventBus::new();
        let bag = TokenBag::new();
        for _ in 0..subscribers {
            bus.subscribe::<CountEvent>()
                .on_event(|event, _| {
                    std::hint::black_box(event.count);
                })
                .disposed_by(&bag);
        }

        group.bench_function(format!("{} subscribers", subscribers), |b| {
            b.iter(|| bus.post(CountEvent { count: 5 }));
        });
    }
    group.finish();
}

fn bench_post_scoped(c: &mut Criterion) {
    let bus = EventBus::new();
    let bag = TokenBag::new();
    let target = Arc::new("target".to_string());

    // 99 scoped subscriptions that do not match, 1 that does.
    for _ in 0..99 {
        let other = Arc::new("other".to_string());
        let builder = bus.subscribe::<CountEvent>().for_object(&other);
        builder
            .on_event(|event, _| {
                std::hint::black_box(event.count);
            })
            .disposed_by(&bag);
        // Keep the filter objects alive for the duration of the bench.
        std::mem::forget(other);
    }
    bus.subscribe::<CountEvent>()
        .for_object(&target)
        .on_event(|event, _| {
            std::hint::black_box(event.count);
        })
        .disposed_by(&bag);

    c.bench_function("post_to (1 of 100 scoped matches)", |b| {
        b.iter(|| bus.post_to(CountEvent { count: 5 }, &target));
    });
}

criterion_group!(
    benches,
    bench_register_dispose,
    bench_post_inline,
    bench_post_fanout,
    bench_post_scoped,
);
criterion_main!(benches);
