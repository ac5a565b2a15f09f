#![forbid(unsafe_code)]

//! Saturating request window carried between subscribers and subscriptions.
//!
//! # Invariants
//!
//! 1. `Unlimited` absorbs addition: `Unlimited + x == Unlimited`.
//! 2. Finite addition saturates at [`Demand::MAX_FINITE`]; it never wraps.
//! 3. Subtraction never goes below `Finite(0)`. `Unlimited - Finite(n)` stays
//!    `Unlimited`; anything minus `Unlimited` is `Finite(0)`.
//! 4. Ordering treats `Unlimited` as greater than every finite value.
//!
//! `Finite(0)` is a legal value: "nothing more right now", not "closed".

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};

/// How many more values a subscriber is prepared to accept.
///
/// Variant order matters: the derived `Ord` places every `Finite` below
/// `Unlimited` and compares finite values numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Demand {
    /// A bounded number of further values.
    Finite(u64),
    /// No bound; the producer may send as fast as it likes.
    Unlimited,
}

impl Demand {
    /// Largest representable finite demand. Finite sums saturate here.
    pub const MAX_FINITE: u64 = u64::MAX;

    /// Demand for no further values.
    pub const NONE: Self = Self::Finite(0);

    /// Unbounded demand.
    #[inline]
    #[must_use]
    pub const fn unlimited() -> Self {
        Self::Unlimited
    }

    /// Bounded demand for `n` values.
    #[inline]
    #[must_use]
    pub const fn finite(n: u64) -> Self {
        Self::Finite(n)
    }

    /// `Finite(0)`.
    #[inline]
    #[must_use]
    pub const fn none() -> Self {
        Self::NONE
    }

    #[inline]
    #[must_use]
    pub const fn is_unlimited(self) -> bool {
        matches!(self, Self::Unlimited)
    }

    /// True for `Finite(0)` only.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        matches!(self, Self::Finite(0))
    }

    /// The finite count, or `None` when unlimited.
    #[inline]
    #[must_use]
    pub const fn as_finite(self) -> Option<u64> {
        match self {
            Self::Finite(n) => Some(n),
            Self::Unlimited => None,
        }
    }

    /// Consume a single unit. Returns `false` (and leaves `self` at zero)
    /// when there was nothing to consume.
    #[inline]
    pub fn take_one(&mut self) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Finite(0) => false,
            Self::Finite(n) => {
                *n -= 1;
                true
            }
        }
    }
}

impl Default for Demand {
    fn default() -> Self {
        Self::NONE
    }
}

impl From<u64> for Demand {
    fn from(n: u64) -> Self {
        Self::Finite(n)
    }
}

impl fmt::Display for Demand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Finite(n) => write!(f, "max({n})"),
            Self::Unlimited => f.write_str("unlimited"),
        }
    }
}

impl Add for Demand {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Finite(a), Self::Finite(b)) => Self::Finite(a.saturating_add(b)),
            _ => Self::Unlimited,
        }
    }
}

impl Add<u64> for Demand {
    type Output = Self;

    fn add(self, rhs: u64) -> Self {
        self + Self::Finite(rhs)
    }
}

impl AddAssign for Demand {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl AddAssign<u64> for Demand {
    fn add_assign(&mut self, rhs: u64) {
        *self = *self + rhs;
    }
}

impl Sub for Demand {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Unlimited, Self::Unlimited) => Self::NONE,
            (Self::Unlimited, Self::Finite(_)) => Self::Unlimited,
            (Self::Finite(_), Self::Unlimited) => Self::NONE,
            (Self::Finite(a), Self::Finite(b)) => Self::Finite(a.saturating_sub(b)),
        }
    }
}

impl Sub<u64> for Demand {
    type Output = Self;

    fn sub(self, rhs: u64) -> Self {
        self - Self::Finite(rhs)
    }
}

impl SubAssign for Demand {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl SubAssign<u64> for Demand {
    fn sub_assign(&mut self, rhs: u64) {
        *self = *self - rhs;
    }
}

impl PartialEq<u64> for Demand {
    fn eq(&self, other: &u64) -> bool {
        matches!(self, Self::Finite(n) if n == other)
    }
}

impl PartialOrd<u64> for Demand {
    fn partial_cmp(&self, other: &u64) -> Option<Ordering> {
        Some(match self {
            Self::Finite(n) => n.cmp(other),
            Self::Unlimited => Ordering::Greater,
        })
    }
}
