#![forbid(unsafe_code)]

//! The consuming side of the protocol.
//!
//! # Call order
//!
//! ```text
//! receive_subscription ──► receive* ──► receive_completion?
//!        (exactly once)     (≤ demand)     (at most once, last)
//! ```
//!
//! Each `receive` consumes one unit of outstanding demand and returns any
//! additional demand to add to the window (usually `Demand::NONE`).

use std::sync::Arc;

use crate::mirror::short_type_name;
use crate::{Demand, Subscription};

/// Failure type for publishers that cannot fail.
pub type Never = std::convert::Infallible;

/// Terminal signal of a subscription.
///
/// Failures are ordinary data: they are delivered, never thrown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Completion<E> {
    /// The publisher ended normally.
    Finished,
    /// The publisher ended with an error.
    Failure(E),
}

impl<E> Completion<E> {
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished)
    }

    /// The failure payload, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&E> {
        match self {
            Self::Finished => None,
            Self::Failure(err) => Some(err),
        }
    }

    /// Transform the failure payload, keeping `Finished` as is.
    pub fn map_failure<F>(self, f: impl FnOnce(E) -> F) -> Completion<F> {
        match self {
            Self::Finished => Completion::Finished,
            Self::Failure(err) => Completion::Failure(f(err)),
        }
    }
}

impl<E> From<Result<(), E>> for Completion<E> {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::Finished,
            Err(err) => Self::Failure(err),
        }
    }
}

/// A consumer of values.
///
/// Methods take `&self`: a subscriber may be re-entered from its own
/// callbacks (a `request` or `cancel` issued inside `receive`), so any state
/// it keeps needs interior mutability.
pub trait Subscriber: Send + Sync {
    type Input;
    type Failure;

    /// Called once, before any value. Store `subscription` to request demand
    /// later, or request right here.
    fn receive_subscription(&self, subscription: Arc<dyn Subscription>);

    /// Called once per value while demand is outstanding. Returns demand to
    /// add to the window.
    fn receive(&self, input: Self::Input) -> Demand;

    /// Called at most once; nothing follows it.
    fn receive_completion(&self, completion: Completion<Self::Failure>);

    /// Human-readable name for tooling.
    fn description(&self) -> String {
        short_type_name::<Self>().to_string()
    }
}

impl<S: Subscriber + ?Sized> Subscriber for Arc<S> {
    type Input = S::Input;
    type Failure = S::Failure;

    fn receive_subscription(&self, subscription: Arc<dyn Subscription>) {
        (**self).receive_subscription(subscription);
    }

    fn receive(&self, input: Self::Input) -> Demand {
        (**self).receive(input)
    }

    fn receive_completion(&self, completion: Completion<Self::Failure>) {
        (**self).receive_completion(completion);
    }

    fn description(&self) -> String {
        (**self).description()
    }
}
