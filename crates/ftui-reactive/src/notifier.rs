#![forbid(unsafe_code)]

//! Void-valued multicast publisher used for "will change" notifications.
//!
//! # Design
//!
//! [`ObservableObjectPublisher`] is a cheap handle around a shared
//! [`ConnectionRegistry`]. Each `subscribe` builds one
//! [`ConduitSubscription`], registers it, and only then hands it to the
//! subscriber, so a `send` racing in from another thread reaches a
//! registered (if not yet active) conduit rather than being lost.
//!
//! Notifications carry no payload. A conduit that has not requested demand
//! yet, or has none left, simply misses the event.
//!
//! # Lifecycle
//!
//! The publisher runs until [`ObservableObjectPublisher::finish`]. After
//! that, new subscribers get an [`EmptySubscription`] followed immediately by
//! `Completion::Finished`, and `send` does nothing.

use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::conduit::ConduitSubscription;
use crate::mirror::{Mirror, Reflect};
use crate::registry::ConnectionRegistry;
use crate::subscriber::Never;
use crate::{
    Completion, EmptySubscription, Identifier, Publisher, ReactiveConfig, Subscriber, Subscription,
};

const DESCRIPTION: &str = "ObservableObjectPublisher";

/// Multicast publisher of `()` notifications that never fails.
///
/// Cloning yields another handle to the same publisher: both share one
/// registry and compare equal.
#[derive(Clone)]
pub struct ObservableObjectPublisher {
    registry: Arc<ConnectionRegistry<(), Never>>,
    config: ReactiveConfig,
}

impl ObservableObjectPublisher {
    /// Create a publisher using the process-wide [`ReactiveConfig`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ReactiveConfig::current())
    }

    /// Create a publisher whose conduits use `config`.
    #[must_use]
    pub fn with_config(config: ReactiveConfig) -> Self {
        Self {
            registry: Arc::new(ConnectionRegistry::new()),
            config,
        }
    }

    /// Notify every active subscriber that has outstanding demand.
    pub fn send(&self) {
        self.registry.broadcast(());
    }

    /// Complete every subscriber and stop accepting new ones.
    ///
    /// Idempotent.
    pub fn finish(&self) {
        if self.registry.close(Completion::Finished) {
            tracing::debug!(publisher = %self.identifier(), "finished");
        }
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.registry.is_closed()
    }

    /// Number of registered (initialized or active) conduits.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Identity shared by every clone of this handle.
    #[must_use]
    pub fn identifier(&self) -> Identifier {
        Identifier::of(&self.registry)
    }
}

impl Default for ObservableObjectPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher for ObservableObjectPublisher {
    type Output = ();
    type Failure = Never;

    fn subscribe<S>(&self, subscriber: S)
    where
        S: Subscriber<Input = (), Failure = Never> + 'static,
    {
        let downstream = Arc::new(subscriber);
        let conduit = Arc::new(ConduitSubscription::new(
            Arc::clone(&downstream),
            &self.registry,
            self.config,
            DESCRIPTION,
        ));
        if self.registry.insert(conduit.clone()).is_err() {
            drop(conduit);
            downstream.receive_subscription(Arc::new(EmptySubscription::new()));
            downstream.receive_completion(Completion::Finished);
            return;
        }
        tracing::trace!(
            publisher = %self.identifier(),
            conduit = %conduit.identifier(),
            subscriber = %downstream.description(),
            "subscribe"
        );
        drop(downstream);
        ConduitSubscription::attach(&conduit);
    }
}

impl PartialEq for ObservableObjectPublisher {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.registry, &other.registry)
    }
}

impl Eq for ObservableObjectPublisher {}

impl fmt::Display for ObservableObjectPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(DESCRIPTION)
    }
}

impl fmt::Debug for ObservableObjectPublisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(DESCRIPTION)
            .field("identifier", &self.identifier())
            .field("connections", &self.connection_count())
            .field("finished", &self.is_finished())
            .finish()
    }
}

impl Reflect for ObservableObjectPublisher {
    fn mirror(&self) -> Mirror {
        self.registry
            .descriptions()
            .into_iter()
            .fold(Mirror::new(DESCRIPTION), |mirror, conduit| {
                mirror.with_child("connection", conduit)
            })
    }
}

/// Capability of owning one lazily installed change notifier.
///
/// `get_or_install` runs `factory` only if nothing is installed yet; every
/// caller, on any thread, observes the same publisher afterwards.
pub trait HasChangeNotifier {
    fn get_or_install<F>(&self, factory: F) -> ObservableObjectPublisher
    where
        F: FnOnce() -> ObservableObjectPublisher;

    /// The installed notifier, without installing one.
    fn installed(&self) -> Option<&ObservableObjectPublisher>;
}

/// Install-once storage for an object's change notifier.
///
/// Shared (through an `Arc`) by an object and all of its
/// [`Published`](crate::Published) fields.
#[derive(Default)]
pub struct NotifierSlot {
    slot: OnceLock<ObservableObjectPublisher>,
}

impl NotifierSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh slot ready to be shared with an object's fields.
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }
}

impl HasChangeNotifier for NotifierSlot {
    fn get_or_install<F>(&self, factory: F) -> ObservableObjectPublisher
    where
        F: FnOnce() -> ObservableObjectPublisher,
    {
        self.slot.get_or_init(factory).clone()
    }

    fn installed(&self) -> Option<&ObservableObjectPublisher> {
        self.slot.get()
    }
}

impl fmt::Debug for NotifierSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifierSlot")
            .field("installed", &self.slot.get().is_some())
            .finish()
    }
}
