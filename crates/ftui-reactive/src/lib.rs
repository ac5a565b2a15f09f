#![forbid(unsafe_code)]

//! Reactive streams with explicit backpressure for FrankenTUI.
//!
//! # Role in FrankenTUI
//! `ftui-reactive` is the publish/subscribe substrate. A [`Publisher`] never
//! sends a [`Subscriber`] more values than it asked for; the request window
//! is a saturating [`Demand`] carried over a [`Subscription`].
//!
//! # Primary responsibilities
//! - **Protocol**: [`Publisher`], [`Subscriber`], [`Subscription`] and the
//!   terminal [`Completion`] signal.
//! - **Demand arithmetic**: saturating, possibly unlimited request windows.
//! - **Multicast**: [`ConduitSubscription`] and [`ConnectionRegistry`] fan one
//!   producer event out to many independently paced subscribers.
//! - **Change notification**: [`ObservableObjectPublisher`], [`Published`]
//!   fields and the [`ObservableObject`] capability.
//!
//! # How it fits in the system
//! Every type here is `Send + Sync`. Models that share state across threads
//! expose it through [`ObservableObject`]; views subscribe with a
//! [`Sink`] or their own [`Subscriber`] and pace themselves with demand.
//!
//! # Protocol
//!
//! ```text
//! subscriber ──subscribe──► publisher
//!                             │ build conduit, register it
//! subscriber ◄─receive_subscription── conduit
//! subscriber ──request(n)──► conduit            Initialized ─► Active
//! publisher  ──send──► registry snapshot ──► conduit ──receive──► subscriber
//! subscriber ──cancel──► conduit ──remove──► registry   ─► Terminal
//! ```
//!
//! Everything runs synchronously on the caller's thread. No operation
//! blocks on another subscriber, and no lock is held while user code runs
//! except the per-subscriber (reentrant) delivery lock.
//!
//! # Example
//! ```rust
//! use ftui_reactive::{ObservableObjectPublisher, PublisherExt};
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let publisher = ObservableObjectPublisher::new();
//! let count = Arc::new(AtomicUsize::new(0));
//! let seen = Arc::clone(&count);
//! let token = publisher.sink_values(move |()| {
//!     seen.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! publisher.send();
//! drop(token); // cancels
//! publisher.send();
//! assert_eq!(count.load(Ordering::SeqCst), 1);
//! ```

pub mod cancellable;
pub mod conduit;
pub mod config;
pub mod demand;
pub mod error;
pub mod identifier;
pub mod mirror;
pub mod notifier;
pub mod observable;
pub mod publisher;
pub mod registry;
pub mod sink;
pub mod subscriber;
pub mod subscription;

pub use cancellable::{AnyCancellable, Cancellable};
pub use conduit::{Conduit, ConduitSubscription};
pub use config::{ProtocolPolicy, ReactiveConfig};
pub use demand::Demand;
pub use error::{ConfigError, ProtocolViolation};
pub use identifier::Identifier;
pub use mirror::{Mirror, MirrorChild, Reflect};
pub use notifier::{HasChangeNotifier, NotifierSlot, ObservableObjectPublisher};
pub use observable::{ObservableObject, Published};
pub use publisher::{Publisher, PublisherExt};
pub use registry::ConnectionRegistry;
pub use sink::Sink;
pub use subscriber::{Completion, Never, Subscriber};
pub use subscription::{EmptySubscription, Subscription};
