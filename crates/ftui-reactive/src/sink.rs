#![forbid(unsafe_code)]

//! Closure-driven subscriber with unlimited demand.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ProtocolViolation;
use crate::mirror::short_type_name;
use crate::{
    AnyCancellable, Cancellable, Completion, Demand, ReactiveConfig, Subscriber, Subscription,
};

type ValueFn<I> = Box<dyn Fn(I) + Send + Sync>;
type CompletionFn<F> = Box<dyn Fn(Completion<F>) + Send + Sync>;

enum SinkState {
    AwaitingSubscription,
    Subscribed(Arc<dyn Subscription>),
    Terminal,
}

struct SinkInner<I, F> {
    state: Mutex<SinkState>,
    receive_value: ValueFn<I>,
    receive_completion: CompletionFn<F>,
}

impl<I, F> Cancellable for SinkInner<I, F> {
    fn cancel(&self) {
        let previous = std::mem::replace(&mut *self.state.lock(), SinkState::Terminal);
        if let SinkState::Subscribed(subscription) = previous {
            subscription.cancel();
        }
    }
}

/// A subscriber that requests unlimited demand and hands every event to a
/// closure.
///
/// Cloning a `Sink` yields another handle to the same subscriber.
pub struct Sink<I, F> {
    inner: Arc<SinkInner<I, F>>,
}

impl<I, F> Clone for Sink<I, F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<I: 'static, F: 'static> Sink<I, F> {
    #[must_use]
    pub fn new(
        receive_completion: impl Fn(Completion<F>) + Send + Sync + 'static,
        receive_value: impl Fn(I) + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(SinkInner {
                state: Mutex::new(SinkState::AwaitingSubscription),
                receive_value: Box::new(receive_value),
                receive_completion: Box::new(receive_completion),
            }),
        }
    }

    /// Guard that cancels this sink's subscription when dropped.
    #[must_use = "dropping the AnyCancellable cancels the subscription"]
    pub fn cancellable(&self) -> AnyCancellable {
        AnyCancellable::from_cancellable(Arc::clone(&self.inner))
    }

    /// True after cancellation or completion.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(*self.inner.state.lock(), SinkState::Terminal)
    }
}

impl<I, F> Cancellable for Sink<I, F> {
    fn cancel(&self) {
        self.inner.cancel();
    }
}

impl<I, F> Subscriber for Sink<I, F> {
    type Input = I;
    type Failure = F;

    fn receive_subscription(&self, subscription: Arc<dyn Subscription>) {
        let outcome = {
            let mut state = self.inner.state.lock();
            if matches!(*state, SinkState::AwaitingSubscription) {
                *state = SinkState::Subscribed(Arc::clone(&subscription));
                Ok(())
            } else {
                Err(matches!(*state, SinkState::Subscribed(_)))
            }
        };
        match outcome {
            Ok(()) => subscription.request(Demand::unlimited()),
            Err(duplicate) => {
                if duplicate {
                    ReactiveConfig::current()
                        .policy
                        .report(&ProtocolViolation::DuplicateSubscription {
                            subscriber: short_type_name::<Self>(),
                        });
                }
                subscription.cancel();
            }
        }
    }

    fn receive(&self, input: I) -> Demand {
        if matches!(*self.inner.state.lock(), SinkState::Subscribed(_)) {
            (self.inner.receive_value)(input);
        }
        Demand::NONE
    }

    fn receive_completion(&self, completion: Completion<F>) {
        let previous = std::mem::replace(&mut *self.inner.state.lock(), SinkState::Terminal);
        if matches!(previous, SinkState::Subscribed(_)) {
            (self.inner.receive_completion)(completion);
        }
    }

    fn description(&self) -> String {
        "Sink".to_string()
    }
}

impl<I, F> fmt::Debug for Sink<I, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match *self.inner.state.lock() {
            SinkState::AwaitingSubscription => "awaiting",
            SinkState::Subscribed(_) => "subscribed",
            SinkState::Terminal => "terminal",
        };
        f.debug_struct("Sink").field("state", &state).finish()
    }
}
