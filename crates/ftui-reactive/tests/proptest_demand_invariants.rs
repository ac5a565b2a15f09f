//! Property-based invariants for demand accounting through a live conduit.
//!
//! 1. Outstanding demand equals the saturating sum of all requests.
//! 2. Each delivered value consumes exactly one unit, never going below zero.
//! 3. Delivered count never exceeds the granted total.
//! 4. Unlimited demand is never consumed.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ftui_reactive::{
    Completion, ConduitSubscription, ConnectionRegistry, Demand, Never, ReactiveConfig,
    Subscriber, Subscription,
};
use proptest::prelude::*;

// ── Fixtures ──────────────────────────────────────────────────────────────

#[derive(Default)]
struct Counting {
    received: AtomicU64,
}

impl Subscriber for Counting {
    type Input = u8;
    type Failure = Never;

    fn receive_subscription(&self, _subscription: Arc<dyn Subscription>) {}

    fn receive(&self, _input: u8) -> Demand {
        self.received.fetch_add(1, Ordering::SeqCst);
        Demand::NONE
    }

    fn receive_completion(&self, _completion: Completion<Never>) {}
}

type Fixture = (
    Arc<ConnectionRegistry<u8, Never>>,
    Arc<Counting>,
    Arc<ConduitSubscription<Counting>>,
);

fn fixture() -> Fixture {
    let registry = Arc::new(ConnectionRegistry::new());
    let counting = Arc::new(Counting::default());
    let conduit = Arc::new(ConduitSubscription::new(
        Arc::clone(&counting),
        &registry,
        ReactiveConfig::default(),
        "Counting",
    ));
    assert!(registry.insert(conduit.clone()).is_ok());
    ConduitSubscription::attach(&conduit);
    (registry, counting, conduit)
}

// ── Strategies ────────────────────────────────────────────────────────────

fn request_strategy() -> impl Strategy<Value = u64> {
    prop_oneof![
        1u64..=16,
        (u64::MAX - 16)..=u64::MAX,
        any::<u64>().prop_filter("nonzero", |n| *n > 0),
    ]
}

// ── Properties ────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn outstanding_is_saturating_sum(requests in proptest::collection::vec(request_strategy(), 1..12)) {
        let (_registry, _counting, conduit) = fixture();
        let mut expected = Demand::NONE;
        for n in &requests {
            conduit.request(Demand::finite(*n));
            expected += Demand::finite(*n);
        }
        let total = requests.iter().fold(0u64, |acc, n| acc.saturating_add(*n));
        prop_assert_eq!(expected, Demand::finite(total));
        prop_assert_eq!(conduit.outstanding_demand(), Some(expected));
    }

    #[test]
    fn each_value_consumes_one_unit(granted in 1u64..64, sends in 0u64..128) {
        let (registry, counting, conduit) = fixture();
        conduit.request(Demand::finite(granted));
        for i in 0..sends {
            let before = conduit.outstanding_demand().and_then(Demand::as_finite);
            registry.broadcast(i as u8);
            let after = conduit.outstanding_demand().and_then(Demand::as_finite);
            match (before, after) {
                (Some(0), Some(0)) => {}
                (Some(b), Some(a)) => {
                    prop_assert_eq!(b - 1, a);
                }
                other => {
                    prop_assert!(false, "conduit left the active state: {:?}", other);
                }
            }
        }
        prop_assert_eq!(counting.received.load(Ordering::SeqCst), granted.min(sends));
    }

    #[test]
    fn interleaved_requests_never_over_deliver(
        steps in proptest::collection::vec(prop_oneof![
            (1u64..8).prop_map(Some),
            Just(None),
        ], 1..64)
    ) {
        let (registry, counting, conduit) = fixture();
        let mut granted = 0u64;
        for step in steps {
            match step {
                Some(n) => {
                    conduit.request(Demand::finite(n));
                    granted += n;
                }
                None => registry.broadcast(0),
            }
            prop_assert!(counting.received.load(Ordering::SeqCst) <= granted);
        }
    }

    #[test]
    fn unlimited_is_never_consumed(sends in 1usize..64) {
        let (registry, counting, conduit) = fixture();
        conduit.request(Demand::unlimited());
        for _ in 0..sends {
            registry.broadcast(1);
        }
        prop_assert_eq!(conduit.outstanding_demand(), Some(Demand::unlimited()));
        prop_assert_eq!(counting.received.load(Ordering::SeqCst), sends as u64);
    }
}
