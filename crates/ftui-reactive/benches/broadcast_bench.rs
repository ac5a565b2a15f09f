//! Benchmarks for multicast fan-out and demand bookkeeping.
//!
//! Performance budgets:
//! - Broadcast to 64 unlimited subscribers: < 10µs
//! - Demand add/take: < 5ns
//!
//! Run with: cargo bench -p ftui-reactive --bench broadcast_bench

use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use ftui_reactive::{
    AnyCancellable, Completion, Demand, Never, ObservableObjectPublisher, Publisher,
    PublisherExt, ReactiveConfig, Subscriber, Subscription,
};

// =============================================================================
// Demand arithmetic
// =============================================================================

fn bench_demand(c: &mut Criterion) {
    let mut group = c.benchmark_group("demand");

    group.bench_function("add_saturating", |b| {
        b.iter(|| black_box(Demand::finite(black_box(u64::MAX - 1)) + black_box(5u64)))
    });
    group.bench_function("take_one", |b| {
        b.iter(|| {
            let mut demand = black_box(Demand::finite(1024));
            while demand.take_one() {}
            black_box(demand)
        })
    });

    group.finish();
}

// =============================================================================
// Broadcast fan-out
// =============================================================================

fn subscribe_sinks(publisher: &ObservableObjectPublisher, n: usize) -> Vec<AnyCancellable> {
    (0..n)
        .map(|_| {
            publisher.sink_values(|()| {
                black_box(());
            })
        })
        .collect()
}

fn bench_broadcast_unlimited(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast/unlimited");

    for n in [1usize, 8, 64, 256] {
        let publisher = ObservableObjectPublisher::with_config(ReactiveConfig::default());
        let _tokens = subscribe_sinks(&publisher, n);
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("send", n), &publisher, |b, publisher| {
            b.iter(|| publisher.send())
        });
    }

    group.finish();
}

/// Subscriber that never requests, so every send is dropped at the conduit.
struct Starved;

impl Subscriber for Starved {
    type Input = ();
    type Failure = Never;

    fn receive_subscription(&self, _subscription: Arc<dyn Subscription>) {}

    fn receive(&self, _input: ()) -> Demand {
        Demand::NONE
    }

    fn receive_completion(&self, _completion: Completion<Never>) {}
}

fn bench_broadcast_starved(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast/starved");

    for n in [8usize, 64] {
        let publisher = ObservableObjectPublisher::with_config(ReactiveConfig::default());
        for _ in 0..n {
            publisher.subscribe(Starved);
        }
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("send", n), &publisher, |b, publisher| {
            b.iter(|| publisher.send())
        });
    }

    group.finish();
}

/// Subscriber that replenishes one unit per value.
struct OneAtATime {
    subscription: parking_lot::Mutex<Option<Arc<dyn Subscription>>>,
    received: Arc<AtomicU64>,
}

impl Subscriber for OneAtATime {
    type Input = ();
    type Failure = Never;

    fn receive_subscription(&self, subscription: Arc<dyn Subscription>) {
        subscription.request(Demand::finite(1));
        *self.subscription.lock() = Some(subscription);
    }

    fn receive(&self, _input: ()) -> Demand {
        self.received.fetch_add(1, Ordering::Relaxed);
        Demand::finite(1)
    }

    fn receive_completion(&self, _completion: Completion<Never>) {}
}

fn bench_broadcast_paced(c: &mut Criterion) {
    let mut group = c.benchmark_group("broadcast/paced");

    for n in [8usize, 64] {
        let publisher = ObservableObjectPublisher::with_config(ReactiveConfig::default());
        let received = Arc::new(AtomicU64::new(0));
        for _ in 0..n {
            publisher.subscribe(OneAtATime {
                subscription: parking_lot::Mutex::new(None),
                received: Arc::clone(&received),
            });
        }
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("send", n), &publisher, |b, publisher| {
            b.iter(|| publisher.send())
        });
        black_box(received.load(Ordering::Relaxed));
    }

    group.finish();
}

// =============================================================================
// Subscription churn
// =============================================================================

fn bench_subscribe_cancel(c: &mut Criterion) {
    let publisher = ObservableObjectPublisher::with_config(ReactiveConfig::default());
    let _background = subscribe_sinks(&publisher, 32);

    c.bench_function("subscribe_cancel", |b| {
        b.iter(|| {
            let token = publisher.sink_values(|()| {});
            drop(black_box(token));
        })
    });
}

criterion_group!(
    benches,
    bench_demand,
    bench_broadcast_unlimited,
    bench_broadcast_starved,
    bench_broadcast_paced,
    bench_subscribe_cancel,
);
criterion_main!(benches);
