#![forbid(unsafe_code)]

//! The set of live conduits behind a multicast publisher.
//!
//! # Design
//!
//! Conduits are keyed by their [`Identifier`]. Because identifiers come from
//! a monotonic counter, iteration order is registration order, which keeps
//! fan-out deterministic.
//!
//! A broadcast copies the current set under the lock, releases it, then
//! delivers to the copy. So:
//!
//! - a conduit that cancels itself from inside its own callback cannot
//!   corrupt the iteration;
//! - a conduit registered concurrently is either in the snapshot or not,
//!   never half-visited.
//!
//! # Invariants
//!
//! 1. A conduit is present iff it is initialized or active.
//! 2. Once [`ConnectionRegistry::close`] runs, nothing is ever inserted again.
//! 3. Removed conduits are dropped outside the lock, so subscriber `Drop`
//!    code never runs while the registry is locked.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::conduit::Conduit;
use crate::{Completion, Identifier};

type SharedConduit<O, F> = Arc<dyn Conduit<O, F>>;

struct RegistryState<O, F> {
    connections: BTreeMap<Identifier, SharedConduit<O, F>>,
    closed: bool,
}

/// Lock-guarded set of conduits, owned by one publisher.
pub struct ConnectionRegistry<O, F> {
    state: Mutex<RegistryState<O, F>>,
}

impl<O, F> ConnectionRegistry<O, F> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(RegistryState {
                connections: BTreeMap::new(),
                closed: false,
            }),
        }
    }

    /// Register `conduit`. Hands it back if the registry is closed.
    pub fn insert(&self, conduit: SharedConduit<O, F>) -> Result<(), SharedConduit<O, F>> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(conduit);
        }
        state.connections.insert(conduit.identifier(), conduit);
        Ok(())
    }

    /// Unregister the conduit with `id`. Returns whether it was present.
    pub fn remove(&self, id: Identifier) -> bool {
        let removed = self.state.lock().connections.remove(&id);
        removed.is_some()
    }

    /// Copy of the current set, in registration order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<SharedConduit<O, F>> {
        self.state.lock().connections.values().cloned().collect()
    }

    /// Deliver `value` to every conduit registered at the time of the call.
    pub fn broadcast(&self, value: O)
    where
        O: Clone,
    {
        let connections = self.snapshot();
        tracing::trace!(conduits = connections.len(), "broadcast");
        if let Some((last, rest)) = connections.split_last() {
            for connection in rest {
                connection.send(value.clone());
            }
            last.send(value);
        }
    }

    /// Close the registry and complete every conduit it held.
    ///
    /// Returns `false` if it was already closed (and does nothing).
    pub fn close(&self, completion: Completion<F>) -> bool
    where
        F: Clone,
    {
        let drained = {
            let mut state = self.state.lock();
            if state.closed {
                return false;
            }
            state.closed = true;
            std::mem::take(&mut state.connections)
        };
        tracing::debug!(conduits = drained.len(), "registry closed");
        for connection in drained.values() {
            connection.complete(completion.clone());
        }
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().connections.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Descriptions of the registered conduits, in registration order.
    #[must_use]
    pub fn descriptions(&self) -> Vec<String> {
        self.snapshot().iter().map(|c| c.to_string()).collect()
    }
}

impl<O, F> Default for ConnectionRegistry<O, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O, F> fmt::Debug for ConnectionRegistry<O, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ConnectionRegistry")
            .field("connections", &state.connections.len())
            .field("closed", &state.closed)
            .finish()
    }
}
