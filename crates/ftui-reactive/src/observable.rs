#![forbid(unsafe_code)]

//! Objects that announce changes before they happen.
//!
//! # Design
//!
//! An [`ObservableObject`] owns one [`NotifierSlot`], shared through an `Arc`
//! with each of its [`Published<T>`] fields. Fields are registered by
//! construction: passing the object's slot to [`Published::new`] is the whole
//! wiring step, no field enumeration involved.
//!
//! The notifier is installed lazily, the first time anyone asks for
//! [`ObservableObject::object_will_change`]. Until then, mutations are silent.
//! Once installed, every field mutation sends one notification *before* the
//! new value is stored.
//!
//! # Invariants
//!
//! 1. All fields of one object share exactly one notifier.
//! 2. `version` increments by exactly 1 on each `set` / `update`.
//! 3. The notification for a mutation is sent before the mutation is visible.
//!
//! # Failure Modes
//!
//! - **Re-entrant set**: a subscriber may read (`get`, `with`) any field
//!   from its callback; the field lock is not held while notifying.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::notifier::{HasChangeNotifier, NotifierSlot, ObservableObjectPublisher};

/// A type that publishes a notification before any of its state changes.
pub trait ObservableObject {
    /// The slot holding this object's notifier.
    fn notifier_slot(&self) -> &NotifierSlot;

    /// The object's will-change publisher, installed on first use.
    fn object_will_change(&self) -> ObservableObjectPublisher {
        self.notifier_slot()
            .get_or_install(ObservableObjectPublisher::new)
    }
}

struct PublishedInner<T> {
    value: T,
    version: u64,
}

/// A field of an [`ObservableObject`] whose mutations trigger the object's
/// will-change notifier.
pub struct Published<T> {
    inner: RwLock<PublishedInner<T>>,
    slot: Arc<NotifierSlot>,
}

impl<T> Published<T> {
    /// Create a field owned by the object whose slot is `slot`.
    #[must_use]
    pub fn new(value: T, slot: &Arc<NotifierSlot>) -> Self {
        Self {
            inner: RwLock::new(PublishedInner { value, version: 0 }),
            slot: Arc::clone(slot),
        }
    }

    /// Access the current value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.read().value)
    }

    /// Replace the value, announcing the change first.
    pub fn set(&self, value: T) {
        self.will_change();
        let mut inner = self.inner.write();
        inner.value = value;
        inner.version += 1;
    }

    /// Modify the value in place, announcing the change first.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.will_change();
        let mut inner = self.inner.write();
        f(&mut inner.value);
        inner.version += 1;
    }

    /// Number of mutations so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.read().version
    }

    fn will_change(&self) {
        if let Some(notifier) = self.slot.installed() {
            notifier.send();
        }
    }
}

impl<T: Clone> Published<T> {
    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.read().value.clone()
    }
}

impl<T: fmt::Debug> fmt::Debug for Published<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("Published")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
