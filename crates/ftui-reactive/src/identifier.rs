#![forbid(unsafe_code)]

//! Process-unique tokens naming subscriptions and conduits.
//!
//! Two sources feed the same type:
//!
//! - [`Identifier::new`] draws from a single process-wide atomic counter.
//!   Tokens are handed out in increasing order and never repeat.
//! - [`Identifier::of`] derives a token from the address of a live `Arc`,
//!   for entities whose identity is already their allocation.
//!
//! Identifiers are pure values: holding one keeps nothing alive.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Next counter value. Zero is never handed out.
static NEXT_IDENTIFIER: AtomicU64 = AtomicU64::new(1);

/// Opaque 64-bit identity token used for equality, hashing and debugging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Identifier(u64);

impl Identifier {
    /// Allocate a fresh token from the process-wide counter.
    #[must_use]
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        Self(NEXT_IDENTIFIER.fetch_add(1, Ordering::Relaxed))
    }

    /// Token derived from the address of `obj`'s allocation.
    ///
    /// Stable for as long as the allocation lives; may be reused by a later
    /// allocation once every strong reference is gone.
    #[must_use]
    pub fn of<T: ?Sized>(obj: &Arc<T>) -> Self {
        Self(Arc::as_ptr(obj).cast::<()>() as usize as u64)
    }

    /// Raw token value.
    #[inline]
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::thread;

    #[test]
    fn counter_tokens_are_monotonic() {
        let a = Identifier::new();
        let b = Identifier::new();
        assert!(b > a);
        assert_ne!(a.get(), 0);
    }

    #[test]
    fn concurrent_allocation_never_repeats() {
        let handles: Vec<_> = (0..8)
            .map(|_| thread::spawn(|| (0..1000).map(|_| Identifier::new()).collect::<Vec<_>>()))
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            for id in handle.join().unwrap() {
                assert!(seen.insert(id), "duplicate identifier {id}");
            }
        }
        assert_eq!(seen.len(), 8000);
    }

    #[test]
    fn pointer_identity_is_stable_and_distinct() {
        let a = Arc::new(1u8);
        let b = Arc::new(1u8);
        assert_eq!(Identifier::of(&a), Identifier::of(&Arc::clone(&a)));
        assert_ne!(Identifier::of(&a), Identifier::of(&b));
    }

    #[test]
    fn display_is_hex() {
        assert_eq!(Identifier(255).to_string(), "0xff");
    }
}
