#![forbid(unsafe_code)]

//! Cancellation tokens.
//!
//! [`AnyCancellable`] is an RAII guard in the spirit of a subscription
//! handle: dropping it cancels whatever it wraps. Cancelling is idempotent;
//! the wrapped action runs at most once no matter how many threads race to
//! cancel or drop.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::Identifier;

/// Something that can be torn down.
///
/// Implementations must treat every call after the first as a no-op.
pub trait Cancellable: Send + Sync {
    fn cancel(&self);
}

impl<C: Cancellable + ?Sized> Cancellable for Arc<C> {
    fn cancel(&self) {
        (**self).cancel();
    }
}

type CancelFn = Box<dyn FnOnce() + Send>;

/// Type-erased cancellation guard that cancels on drop.
pub struct AnyCancellable {
    identifier: Identifier,
    action: Mutex<Option<CancelFn>>,
}

impl AnyCancellable {
    /// Wrap a closure run on the first `cancel` (or on drop).
    #[must_use = "dropping an AnyCancellable cancels it immediately"]
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            identifier: Identifier::new(),
            action: Mutex::new(Some(Box::new(cancel))),
        }
    }

    /// Wrap a shared cancellable.
    #[must_use = "dropping an AnyCancellable cancels it immediately"]
    pub fn from_cancellable<C: Cancellable + 'static>(cancellable: Arc<C>) -> Self {
        Self::new(move || cancellable.cancel())
    }

    /// Move this guard into `set`, tying its lifetime to the collection.
    pub fn store(self, set: &mut Vec<AnyCancellable>) {
        set.push(self);
    }

    /// True once the wrapped action has run.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.action.lock().is_none()
    }

    #[must_use]
    pub fn identifier(&self) -> Identifier {
        self.identifier
    }
}

impl Cancellable for AnyCancellable {
    fn cancel(&self) {
        // Take under the lock, run outside it.
        let action = self.action.lock().take();
        if let Some(action) = action {
            action();
        }
    }
}

impl Drop for AnyCancellable {
    fn drop(&mut self) {
        if let Some(action) = self.action.get_mut().take() {
            action();
        }
    }
}

impl PartialEq for AnyCancellable {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for AnyCancellable {}

impl Hash for AnyCancellable {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identifier.hash(state);
    }
}

impl fmt::Debug for AnyCancellable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyCancellable")
            .field("identifier", &self.identifier)
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
