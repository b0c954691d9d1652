//! Store and cache ports.
//!
//! The document store backing the suite is an external collaborator; this
//! module models it as the [`AttendanceStore`] trait so the scan, feed, and
//! payroll components stay independent of any particular client. Change
//! feeds are explicit: [`subscribe`](AttendanceStore::subscribe) hands back a
//! cancellable [`SubscriptionHandle`] plus a channel of [`StoreDelta`]s
//! rather than hiding the lifecycle inside callbacks.
//!
//! The best-effort local cache used for feed rehydration is the separate
//! [`CachePort`]; its write failures are always swallowed by callers.

mod memory;

pub use memory::{MemoryCache, MemoryStore};

use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::mpsc;

use crate::error::AttendanceResult;

/// A store document: an id plus its persisted fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The document id, unique within its collection.
    pub id: String,
    /// The persisted fields as raw JSON.
    pub fields: Value,
}

/// Options for a bounded page read.
#[derive(Debug, Clone)]
pub struct QueryOptions {
    /// Field to order by on the store side.
    pub order_by: String,
    /// Whether the store orders descending (most recent first).
    pub descending: bool,
    /// Maximum number of documents to return.
    pub limit: usize,
    /// Resume after this document id (exclusive), for cursor pagination.
    pub start_after_id: Option<String>,
}

/// Options for a live subscription.
#[derive(Debug, Clone)]
pub struct SubscribeOptions {
    /// Field to order by on the store side.
    pub order_by: String,
    /// Page limit for the live window.
    pub limit: usize,
}

/// One change-feed delivery: the full current snapshot plus the ids that
/// changed since the previous delivery. The first delivery after subscribing
/// reports every snapshot document as added.
#[derive(Debug, Clone)]
pub struct StoreDelta {
    /// The full query window after this change.
    pub snapshot: Vec<Document>,
    /// Ids of documents added since the last delivery.
    pub added: Vec<String>,
    /// Ids of documents modified since the last delivery.
    pub modified: Vec<String>,
    /// Ids of documents removed since the last delivery.
    pub removed: Vec<String>,
}

/// Cancellation handle for a live subscription.
///
/// `close` is idempotent; dropping the handle also closes. The handle is the
/// only thing that ever tears a subscription down.
pub struct SubscriptionHandle {
    close: Mutex<Option<Box<dyn FnOnce() + Send>>>,
}

impl SubscriptionHandle {
    /// Wraps a close action.
    pub fn new(close: impl FnOnce() + Send + 'static) -> Self {
        Self {
            close: Mutex::new(Some(Box::new(close))),
        }
    }

    /// Closes the subscription. Calling again is a no-op.
    pub fn close(&self) {
        let action = self.close.lock().expect("subscription close lock").take();
        if let Some(action) = action {
            action();
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let open = self.close.lock().map(|slot| slot.is_some()).unwrap_or(false);
        f.debug_struct("SubscriptionHandle").field("open", &open).finish()
    }
}

/// A live change feed: the cancellation handle and the delta channel.
///
/// Deltas stop arriving when the handle closes or the store disconnects;
/// the receiver then drains and yields `None`.
#[derive(Debug)]
pub struct StoreSubscription {
    /// Cancellation handle.
    pub handle: SubscriptionHandle,
    /// Incoming deltas, in store delivery order.
    pub deltas: mpsc::UnboundedReceiver<StoreDelta>,
}

/// The attendance document store.
///
/// Mutating and batch-read operations surface store failures as
/// [`AttendanceError::StoreUnavailable`](crate::error::AttendanceError);
/// live subscriptions simply stop delivering until the client reconnects.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Returns every document in `collection` whose `field` equals `value`.
    async fn get_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> AttendanceResult<Vec<Document>>;

    /// Creates a document and returns its assigned id.
    async fn create(&self, collection: &str, fields: Value) -> AttendanceResult<String>;

    /// Merges `patch` into an existing document's top-level fields.
    async fn update(&self, collection: &str, id: &str, patch: Value) -> AttendanceResult<()>;

    /// Bounded page read with cursor support.
    async fn query(
        &self,
        collection: &str,
        options: QueryOptions,
    ) -> AttendanceResult<Vec<Document>>;

    /// Opens a live change feed over the collection's query window.
    ///
    /// Delivery starts with an initial snapshot delta. Setup is synchronous;
    /// deltas arrive asynchronously on the returned channel.
    fn subscribe(&self, collection: &str, options: SubscribeOptions) -> StoreSubscription;
}

/// Error from a best-effort cache write. Callers swallow it.
#[derive(Debug, Error)]
#[error("cache write failed: {0}")]
pub struct CacheError(pub String);

/// Best-effort local cache used to rehydrate feeds across subscriptions.
pub trait CachePort: Send + Sync {
    /// Returns the cached bytes for `key`, if any.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Stores bytes under `key`. Failures (e.g. storage quota) are reported
    /// but must never fail the caller's subscription path.
    fn set(&self, key: &str, bytes: Vec<u8>) -> Result<(), CacheError>;
}
