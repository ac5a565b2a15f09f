#![forbid(unsafe_code)]

//! Per-subscriber adapter between a multicast publisher and one subscriber.
//!
//! # State machine
//!
//! ```text
//!              request(d > 0)
//! Initialized ───────────────► Active { demand }
//!      │                           │
//!      │ cancel / completion       │ cancel / completion
//!      └───────────► Terminal ◄────┘
//! ```
//!
//! `Terminal` is absorbing: every later call is a no-op.
//!
//! # Locking
//!
//! Two independent locks, never held together across a call into the
//! subscriber:
//!
//! - **state** (`Mutex`): guards the state field only. Held for a handful of
//!   instructions and always released before the subscriber runs.
//! - **delivery** (`ReentrantMutex`): serializes calls into the subscriber.
//!   Reentrant, so a subscriber that calls `request`, `cancel` or even
//!   triggers another broadcast from inside `receive` does not deadlock
//!   against itself.
//!
//! `cancel` never waits on the delivery lock. Every holder of the delivery
//! lock re-reads the state after unlocking and releases the subscriber if it
//! finds the conduit cancelled, so whichever side comes last drops it.
//!
//! # Failure Modes
//!
//! - **Race with cancel**: a delivery that passed the state check before a
//!   concurrent `cancel` began may still complete. No delivery starts after
//!   `cancel` has returned.
//! - **Starvation**: a subscriber that never requests demand never receives a
//!   value. That is backpressure working, not a fault.

use std::cell::RefCell;
use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, ReentrantMutex};

use crate::error::ProtocolViolation;
use crate::mirror::{Mirror, Reflect};
use crate::registry::ConnectionRegistry;
use crate::{
    Cancellable, Completion, Demand, Identifier, ProtocolPolicy, ReactiveConfig, Subscriber,
    Subscription,
};

/// Upstream-facing side of a conduit, as seen by its registry.
pub trait Conduit<O, F>: fmt::Display + Reflect + Send + Sync {
    fn identifier(&self) -> Identifier;

    /// Forward one broadcast value, subject to state and demand.
    fn send(&self, value: O);

    /// Deliver a terminal signal and detach. Idempotent.
    fn complete(&self, completion: Completion<F>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConduitState {
    Initialized,
    Active { demand: Demand },
    /// `cancelled` is false when reached through a completion.
    Terminal { cancelled: bool },
}

type Downstream<S> = ReentrantMutex<RefCell<Option<Arc<S>>>>;

/// A [`Subscription`] that relays a multicast publisher's events into one
/// subscriber.
pub struct ConduitSubscription<S: Subscriber> {
    identifier: Identifier,
    /// Never keeps the publisher alive.
    parent: Weak<ConnectionRegistry<S::Input, S::Failure>>,
    state: Mutex<ConduitState>,
    downstream: Downstream<S>,
    policy: ProtocolPolicy,
    trace_deliveries: bool,
    name: &'static str,
    /// Captured at construction so mirrors never touch the delivery lock.
    description: String,
}

impl<S> ConduitSubscription<S>
where
    S: Subscriber + 'static,
    S::Input: 'static,
    S::Failure: 'static,
{
    /// Build a conduit for `downstream`, reporting to `parent` on detach.
    ///
    /// `name` is the publisher's description, surfaced through `Display`.
    pub fn new(
        downstream: Arc<S>,
        parent: &Arc<ConnectionRegistry<S::Input, S::Failure>>,
        config: ReactiveConfig,
        name: &'static str,
    ) -> Self {
        let description = downstream.description();
        Self {
            identifier: Identifier::new(),
            parent: Arc::downgrade(parent),
            state: Mutex::new(ConduitState::Initialized),
            downstream: ReentrantMutex::new(RefCell::new(Some(downstream))),
            policy: config.policy,
            trace_deliveries: config.trace_deliveries,
            name,
            description,
        }
    }

    /// Hand `this` to its subscriber as the subscription.
    ///
    /// Call after registering the conduit. Runs under the delivery lock, so
    /// a value racing in from another thread waits until the handoff returns.
    pub fn attach(this: &Arc<Self>) {
        let guard = this.downstream.lock();
        let downstream = guard.borrow().clone();
        if let Some(downstream) = downstream {
            let subscription: Arc<dyn Subscription> = this.clone();
            downstream.receive_subscription(subscription);
        }
        drop(guard);
        this.release_if_cancelled();
    }

    /// Remove from the owning registry, if the publisher still exists.
    fn detach(&self) {
        if let Some(registry) = self.parent.upgrade() {
            registry.remove(self.identifier);
        }
    }

    /// Drop the subscriber unless a delivery currently holds it.
    fn release_downstream(&self) {
        let Some(guard) = self.downstream.try_lock() else {
            return;
        };
        let released = match guard.try_borrow_mut() {
            Ok(mut slot) => slot.take(),
            Err(_) => None,
        };
        drop(guard);
        drop(released);
    }

    /// Finish a cancel whose `try_lock` lost to a delivery lock holder.
    ///
    /// Called by each holder after it unlocks.
    fn release_if_cancelled(&self) {
        if matches!(*self.state.lock(), ConduitState::Terminal { cancelled: true }) {
            self.release_downstream();
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(*self.state.lock(), ConduitState::Terminal { .. })
    }

    /// Outstanding demand, or `None` unless active.
    #[must_use]
    pub fn outstanding_demand(&self) -> Option<Demand> {
        match *self.state.lock() {
            ConduitState::Active { demand } => Some(demand),
            _ => None,
        }
    }
}

impl<S> Conduit<S::Input, S::Failure> for ConduitSubscription<S>
where
    S: Subscriber + 'static,
    S::Input: 'static,
    S::Failure: 'static,
{
    fn identifier(&self) -> Identifier {
        self.identifier
    }

    fn send(&self, value: S::Input) {
        {
            let mut state = self.state.lock();
            let ConduitState::Active { mut demand } = *state else {
                return;
            };
            if !demand.take_one() {
                tracing::trace!(conduit = %self.identifier, "dropped: no outstanding demand");
                return;
            }
            *state = ConduitState::Active { demand };
        }

        let guard = self.downstream.lock();
        // Clone out of the cell so a reentrant cancel can clear the slot.
        let Some(downstream) = guard.borrow().clone() else {
            return;
        };
        if self.trace_deliveries {
            tracing::trace!(conduit = %self.identifier, "deliver");
        }
        let additional = downstream.receive(value);

        {
            let mut state = self.state.lock();
            let current = *state;
            if let ConduitState::Active { demand } = current {
                *state = ConduitState::Active {
                    demand: demand + additional,
                };
            }
        }
        drop(guard);
        drop(downstream);
        self.release_if_cancelled();
    }

    fn complete(&self, completion: Completion<S::Failure>) {
        {
            let mut state = self.state.lock();
            if matches!(*state, ConduitState::Terminal { .. }) {
                return;
            }
            *state = ConduitState::Terminal { cancelled: false };
        }
        tracing::debug!(conduit = %self.identifier, finished = completion.is_finished(), "complete");

        // Waits for any in-flight delivery so the completion arrives last.
        let guard = self.downstream.lock();
        let downstream = guard.borrow_mut().take();
        if let Some(downstream) = &downstream {
            downstream.receive_completion(completion);
        }
        drop(guard);
        drop(downstream);
        self.detach();
    }
}

impl<S> Subscription for ConduitSubscription<S>
where
    S: Subscriber + 'static,
    S::Input: 'static,
    S::Failure: 'static,
{
    fn request(&self, demand: Demand) {
        if demand.is_none() {
            self.policy.report(&ProtocolViolation::ZeroDemandRequest {
                subscription: self.identifier,
            });
            return;
        }
        let accepted = {
            let mut state = self.state.lock();
            let current = *state;
            match current {
                ConduitState::Initialized => {
                    *state = ConduitState::Active { demand };
                    true
                }
                ConduitState::Active {
                    demand: outstanding,
                } => {
                    *state = ConduitState::Active {
                        demand: outstanding + demand,
                    };
                    true
                }
                ConduitState::Terminal { .. } => false,
            }
        };
        if accepted {
            tracing::trace!(conduit = %self.identifier, %demand, "request");
        } else {
            self.policy.report(&ProtocolViolation::RequestAfterTermination {
                subscription: self.identifier,
            });
        }
    }

    fn identifier(&self) -> Identifier {
        self.identifier
    }
}

impl<S> Cancellable for ConduitSubscription<S>
where
    S: Subscriber + 'static,
    S::Input: 'static,
    S::Failure: 'static,
{
    fn cancel(&self) {
        {
            let mut state = self.state.lock();
            if matches!(*state, ConduitState::Terminal { .. }) {
                return;
            }
            *state = ConduitState::Terminal { cancelled: true };
        }
        tracing::debug!(conduit = %self.identifier, "cancel");
        self.detach();
        self.release_downstream();
    }
}

impl<S: Subscriber> fmt::Display for ConduitSubscription<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl<S: Subscriber> fmt::Debug for ConduitSubscription<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConduitSubscription")
            .field("identifier", &self.identifier)
            .field("name", &self.name)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl<S: Subscriber> Reflect for ConduitSubscription<S> {
    fn mirror(&self) -> Mirror {
        let downstream = if matches!(*self.state.lock(), ConduitState::Terminal { .. }) {
            "released"
        } else {
            self.description.as_str()
        };
        Mirror::new(self.name).with_child("downstream", downstream)
    }
}
