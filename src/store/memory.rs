//! In-memory implementations of the store and cache ports.
//!
//! [`MemoryStore`] keeps collections in insertion order, assigns sequential
//! ids, and pushes a [`StoreDelta`] to every live subscription on each
//! mutation, mirroring the remote store's snapshot-plus-deltas contract.
//! Used by the test suites and for local development; `set_offline` lets
//! tests exercise the outage paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::error::{AttendanceError, AttendanceResult};
use crate::timeparse;

use super::{
    AttendanceStore, CacheError, CachePort, Document, QueryOptions, StoreDelta, StoreSubscription,
    SubscribeOptions, SubscriptionHandle,
};

#[derive(Default)]
struct Inner {
    collections: HashMap<String, Vec<Document>>,
    subscribers: HashMap<String, Vec<Subscriber>>,
    next_id: u64,
    next_subscriber: u64,
}

struct Subscriber {
    id: u64,
    order_by: String,
    limit: usize,
    sender: mpsc::UnboundedSender<StoreDelta>,
}

/// An in-memory [`AttendanceStore`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    offline: Arc<AtomicBool>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a store outage: while offline, every trait operation fails
    /// with `StoreUnavailable` and live feeds stop delivering.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Removes a document, delivering a removal delta to live feeds.
    ///
    /// The attendance core never deletes; this exists so tests can exercise
    /// the removed path of the change feed.
    pub fn remove(&self, collection: &str, id: &str) {
        let mut inner = self.inner.lock().expect("memory store lock");
        if let Some(docs) = inner.collections.get_mut(collection) {
            docs.retain(|doc| doc.id != id);
        }
        Self::notify(&mut inner, collection, vec![], vec![], vec![id.to_string()]);
    }

    /// Number of live subscriptions currently open on a collection.
    pub fn subscriber_count(&self, collection: &str) -> usize {
        let inner = self.inner.lock().expect("memory store lock");
        inner
            .subscribers
            .get(collection)
            .map(|subscribers| subscribers.len())
            .unwrap_or(0)
    }

    /// Seeds a document with a caller-chosen id, without notifying feeds.
    pub fn seed(&self, collection: &str, id: &str, fields: Value) {
        let mut inner = self.inner.lock().expect("memory store lock");
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(Document {
                id: id.to_string(),
                fields,
            });
    }

    fn check_online(&self) -> AttendanceResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AttendanceError::StoreUnavailable {
                message: "memory store is offline".to_string(),
            });
        }
        Ok(())
    }

    /// The subscription window: documents ordered most-recent-first by the
    /// requested field, truncated to the page limit.
    fn window(docs: &[Document], order_by: &str, limit: usize) -> Vec<Document> {
        let mut window: Vec<Document> = docs.to_vec();
        window.sort_by(|a, b| {
            let ka = a.fields.get(order_by).and_then(timeparse::parse_json);
            let kb = b.fields.get(order_by).and_then(timeparse::parse_json);
            match (ka, kb) {
                (Some(ka), Some(kb)) => kb.cmp(&ka),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => std::cmp::Ordering::Equal,
            }
        });
        window.truncate(limit);
        window
    }

    fn notify(
        inner: &mut Inner,
        collection: &str,
        added: Vec<String>,
        modified: Vec<String>,
        removed: Vec<String>,
    ) {
        let docs = inner.collections.get(collection).cloned().unwrap_or_default();
        if let Some(subscribers) = inner.subscribers.get_mut(collection) {
            subscribers.retain(|subscriber| {
                let delta = StoreDelta {
                    snapshot: Self::window(&docs, &subscriber.order_by, subscriber.limit),
                    added: added.clone(),
                    modified: modified.clone(),
                    removed: removed.clone(),
                };
                subscriber.sender.send(delta).is_ok()
            });
        }
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn get_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> AttendanceResult<Vec<Document>> {
        self.check_online()?;
        let inner = self.inner.lock().expect("memory store lock");
        Ok(inner
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|doc| doc.fields.get(field).and_then(Value::as_str) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn create(&self, collection: &str, fields: Value) -> AttendanceResult<String> {
        self.check_online()?;
        let mut inner = self.inner.lock().expect("memory store lock");
        inner.next_id += 1;
        let id = format!("{}_{:04}", collection, inner.next_id);
        inner
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(Document {
                id: id.clone(),
                fields,
            });
        Self::notify(&mut inner, collection, vec![id.clone()], vec![], vec![]);
        Ok(id)
    }

    async fn update(&self, collection: &str, id: &str, patch: Value) -> AttendanceResult<()> {
        self.check_online()?;
        let mut inner = self.inner.lock().expect("memory store lock");
        let doc = inner
            .collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| doc.id == id))
            .ok_or_else(|| AttendanceError::InvalidRecord {
                collection: collection.to_string(),
                id: id.to_string(),
                message: "document not found".to_string(),
            })?;

        if let (Some(fields), Some(patch)) = (doc.fields.as_object_mut(), patch.as_object()) {
            for (key, value) in patch {
                fields.insert(key.clone(), value.clone());
            }
        }
        Self::notify(&mut inner, collection, vec![], vec![id.to_string()], vec![]);
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        options: QueryOptions,
    ) -> AttendanceResult<Vec<Document>> {
        self.check_online()?;
        let inner = self.inner.lock().expect("memory store lock");
        let docs = inner.collections.get(collection).cloned().unwrap_or_default();

        let mut ordered = Self::window(&docs, &options.order_by, docs.len());
        if !options.descending {
            ordered.reverse();
        }

        let start = match &options.start_after_id {
            Some(cursor) => ordered
                .iter()
                .position(|doc| &doc.id == cursor)
                .map(|index| index + 1)
                .unwrap_or(ordered.len()),
            None => 0,
        };

        Ok(ordered.into_iter().skip(start).take(options.limit).collect())
    }

    fn subscribe(&self, collection: &str, options: SubscribeOptions) -> StoreSubscription {
        let (sender, deltas) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock().expect("memory store lock");
        inner.next_subscriber += 1;
        let subscriber_id = inner.next_subscriber;

        // Initial snapshot delivery: everything in the window counts as added.
        let docs = inner.collections.get(collection).cloned().unwrap_or_default();
        let snapshot = Self::window(&docs, &options.order_by, options.limit);
        let added = snapshot.iter().map(|doc| doc.id.clone()).collect();
        let _ = sender.send(StoreDelta {
            snapshot,
            added,
            modified: vec![],
            removed: vec![],
        });

        inner
            .subscribers
            .entry(collection.to_string())
            .or_default()
            .push(Subscriber {
                id: subscriber_id,
                order_by: options.order_by,
                limit: options.limit,
                sender,
            });

        let registry = self.inner.clone();
        let feed = collection.to_string();
        let handle = SubscriptionHandle::new(move || {
            let mut inner = registry.lock().expect("memory store lock");
            if let Some(subscribers) = inner.subscribers.get_mut(&feed) {
                subscribers.retain(|subscriber| subscriber.id != subscriber_id);
            }
        });

        StoreSubscription { handle, deltas }
    }
}

/// An in-memory [`CachePort`] with togglable write failures.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent writes fail, as a full session-storage quota would.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl CachePort for MemoryCache {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.entries.lock().expect("memory cache lock").get(key).cloned()
    }

    fn set(&self, key: &str, bytes: Vec<u8>) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError("write quota exceeded".to_string()));
        }
        self.entries
            .lock()
            .expect("memory cache lock")
            .insert(key.to_string(), bytes);
        Ok(())
    }
}
