#![forbid(unsafe_code)]

//! The per-link capability handed from a publisher to a subscriber.

use std::fmt;

use crate::{Cancellable, Demand, Identifier};

/// One active producer-to-consumer link.
///
/// # Contract
///
/// - `request` adds to the standing request window (saturating). It may be
///   called from any thread, any number of times, including from inside the
///   subscriber's own `receive` callback.
/// - `cancel` (from [`Cancellable`]) is idempotent. After the first call
///   returns, no new delivery starts through this subscription.
/// - Calls after termination are silent no-ops, never errors.
pub trait Subscription: Cancellable {
    fn request(&self, demand: Demand);

    /// Identity of this link, stable for its whole lifetime.
    fn identifier(&self) -> Identifier;
}

/// A subscription that does nothing.
///
/// Handed to subscribers of a publisher that has already completed, so the
/// subscription-before-completion ordering still holds.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmptySubscription {
    identifier: Identifier,
}

impl EmptySubscription {
    #[must_use]
    pub fn new() -> Self {
        Self {
            identifier: Identifier::new(),
        }
    }
}

impl Default for EmptySubscription {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancellable for EmptySubscription {
    fn cancel(&self) {}
}

impl Subscription for EmptySubscription {
    fn request(&self, _demand: Demand) {}

    fn identifier(&self) -> Identifier {
        self.identifier
    }
}

impl fmt::Debug for EmptySubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Empty")
    }
}

impl fmt::Display for EmptySubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Empty")
    }
}
