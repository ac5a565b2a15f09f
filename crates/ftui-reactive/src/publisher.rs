#![forbid(unsafe_code)]

//! The producing side of the protocol.

use crate::sink::Sink;
use crate::subscriber::Never;
use crate::{AnyCancellable, Completion, Subscriber};

/// A producer of values.
///
/// `subscribe` must hand the subscriber a subscription (via
/// `receive_subscription`) before any value or completion, synchronously,
/// and without blocking on other subscribers.
pub trait Publisher {
    type Output;
    type Failure;

    fn subscribe<S>(&self, subscriber: S)
    where
        S: Subscriber<Input = Self::Output, Failure = Self::Failure> + 'static;
}

/// Convenience subscribers for any [`Publisher`].
pub trait PublisherExt: Publisher {
    /// Subscribe with closures and unlimited demand.
    ///
    /// The returned guard cancels the subscription when dropped.
    #[must_use = "dropping the AnyCancellable cancels the subscription"]
    fn sink<C, V>(&self, receive_completion: C, receive_value: V) -> AnyCancellable
    where
        Self::Output: 'static,
        Self::Failure: 'static,
        C: Fn(Completion<Self::Failure>) + Send + Sync + 'static,
        V: Fn(Self::Output) + Send + Sync + 'static,
    {
        let sink = Sink::new(receive_completion, receive_value);
        let token = sink.cancellable();
        self.subscribe(sink);
        token
    }

    /// Subscribe to values only. Available for publishers that cannot fail.
    #[must_use = "dropping the AnyCancellable cancels the subscription"]
    fn sink_values<V>(&self, receive_value: V) -> AnyCancellable
    where
        Self: Publisher<Failure = Never>,
        Self::Output: 'static,
        V: Fn(Self::Output) + Send + Sync + 'static,
    {
        self.sink(|_| {}, receive_value)
    }
}

impl<P: Publisher + ?Sized> PublisherExt for P {}
