//! Shared change-feed subscriptions.
//!
//! Many back-office surfaces watch the same live queries (recent clock
//! events, recent archived items). Opening one store subscription per
//! surface would multiply reads, so the [`FeedRegistry`] multiplexes: it
//! keeps at most one underlying subscription per logical feed no matter how
//! many local observers exist, hydrates new observers from an in-memory or
//! persisted cache, and re-broadcasts every delta with a canonically sorted
//! materialized view.
//!
//! The registry is an explicit, constructible object — whoever wires the
//! application owns it and injects it, so tests can create isolated
//! instances.

mod multiplexer;
mod page;

pub use multiplexer::{FeedOptions, FeedRegistry, FeedSubscription, FeedUpdate, ObserverHandle};
pub use page::{Page, PageRequest};
