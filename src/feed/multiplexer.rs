//! The change-feed multiplexer.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::store::{
    AttendanceStore, CachePort, Document, StoreDelta, SubscribeOptions, SubscriptionHandle,
};
use crate::timeparse;

/// The store field used for the underlying subscription's window ordering.
const FEED_ORDER_FIELD: &str = "timeIn";

/// Options for observing a feed.
#[derive(Debug, Clone)]
pub struct FeedOptions {
    /// Page limit for the live query window.
    pub limit: usize,
}

impl Default for FeedOptions {
    fn default() -> Self {
        Self { limit: 25 }
    }
}

/// An update delivered to a feed observer. Observers receive their own copy
/// of the materialized list; the shared list is never handed out by
/// reference.
#[derive(Debug, Clone)]
pub enum FeedUpdate {
    /// Initial hydration from the in-memory or persisted cache.
    Snapshot {
        /// The materialized list at subscription time.
        items: Vec<Document>,
    },
    /// A live store delta, re-broadcast with the rebuilt list.
    Delta {
        /// Ids added since the previous delivery.
        added: Vec<String>,
        /// Ids modified since the previous delivery.
        modified: Vec<String>,
        /// Ids removed since the previous delivery.
        removed: Vec<String>,
        /// The full materialized list after this delta.
        items: Vec<Document>,
    },
}

impl FeedUpdate {
    /// The materialized list carried by this update.
    pub fn items(&self) -> &[Document] {
        match self {
            FeedUpdate::Snapshot { items } => items,
            FeedUpdate::Delta { items, .. } => items,
        }
    }
}

struct LiveFeed {
    handle: SubscriptionHandle,
    pump: JoinHandle<()>,
}

struct FeedEntry {
    observers: HashMap<u64, mpsc::UnboundedSender<FeedUpdate>>,
    materialized: Vec<Document>,
    live: Option<LiveFeed>,
}

type FeedMap = Arc<Mutex<HashMap<String, FeedEntry>>>;

/// One observer's view of a feed: the update channel plus its handle.
#[derive(Debug)]
pub struct FeedSubscription {
    /// Updates, starting with a snapshot, then one delta per store delivery.
    pub updates: mpsc::UnboundedReceiver<FeedUpdate>,
    /// Handle that detaches this observer when closed or dropped.
    pub handle: ObserverHandle,
}

/// Detaches one observer from a feed. Closing the last observer closes the
/// underlying store subscription; the cached materialized list is kept for
/// the next subscriber. `close` is idempotent and also runs on drop.
pub struct ObserverHandle {
    feeds: FeedMap,
    feed: String,
    id: u64,
    closed: AtomicBool,
}

impl ObserverHandle {
    /// Detaches the observer. Calling again is a no-op.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut feeds = self.feeds.lock().expect("feed registry lock");
        if let Some(entry) = feeds.get_mut(&self.feed) {
            entry.observers.remove(&self.id);
            if entry.observers.is_empty() {
                if let Some(live) = entry.live.take() {
                    live.handle.close();
                    live.pump.abort();
                    info!(feed = %self.feed, "closed underlying feed subscription");
                }
            }
        }
    }
}

impl Drop for ObserverHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for ObserverHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverHandle")
            .field("feed", &self.feed)
            .field("id", &self.id)
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}

/// The subscription multiplexer.
///
/// Invariant: for any feed, observer count ≥ 1 implies exactly one
/// underlying store subscription, and observer count 0 implies none.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use attendance_engine::feed::{FeedOptions, FeedRegistry};
/// use attendance_engine::store::{MemoryCache, MemoryStore};
///
/// # async fn demo() {
/// let registry = FeedRegistry::new(
///     Arc::new(MemoryStore::new()),
///     Arc::new(MemoryCache::new()),
/// );
/// let mut subscription = registry.subscribe("attendance", FeedOptions::default());
/// while let Some(update) = subscription.updates.recv().await {
///     println!("{} rows", update.items().len());
/// }
/// # }
/// ```
#[derive(Clone)]
pub struct FeedRegistry {
    store: Arc<dyn AttendanceStore>,
    cache: Arc<dyn CachePort>,
    feeds: FeedMap,
    next_observer: Arc<AtomicU64>,
}

impl FeedRegistry {
    /// Creates a registry over the given store and cache ports.
    pub fn new(store: Arc<dyn AttendanceStore>, cache: Arc<dyn CachePort>) -> Self {
        Self {
            store,
            cache,
            feeds: Arc::new(Mutex::new(HashMap::new())),
            next_observer: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Attaches an observer to a feed.
    ///
    /// The observer is hydrated immediately — from the in-memory list when
    /// the feed is already known, else from the persisted cache — and the
    /// underlying store subscription is opened only if the feed has none.
    /// Must be called within a Tokio runtime (the delta pump is a task).
    pub fn subscribe(&self, feed: &str, options: FeedOptions) -> FeedSubscription {
        let id = self.next_observer.fetch_add(1, Ordering::SeqCst);
        let (sender, updates) = mpsc::unbounded_channel();

        let mut feeds = self.feeds.lock().expect("feed registry lock");
        let entry = feeds.entry(feed.to_string()).or_insert_with(|| FeedEntry {
            observers: HashMap::new(),
            materialized: self.hydrate_from_cache(feed),
            live: None,
        });

        let _ = sender.send(FeedUpdate::Snapshot {
            items: entry.materialized.clone(),
        });
        entry.observers.insert(id, sender);

        if entry.live.is_none() {
            let subscription = self.store.subscribe(
                feed,
                SubscribeOptions {
                    order_by: FEED_ORDER_FIELD.to_string(),
                    limit: options.limit,
                },
            );
            let pump = tokio::spawn(pump_deltas(
                feed.to_string(),
                subscription.deltas,
                self.feeds.clone(),
                self.cache.clone(),
            ));
            entry.live = Some(LiveFeed {
                handle: subscription.handle,
                pump,
            });
            info!(feed, limit = options.limit, "opened underlying feed subscription");
        }

        FeedSubscription {
            updates,
            handle: ObserverHandle {
                feeds: self.feeds.clone(),
                feed: feed.to_string(),
                id,
                closed: AtomicBool::new(false),
            },
        }
    }

    /// Number of observers currently attached to a feed.
    pub fn observer_count(&self, feed: &str) -> usize {
        let feeds = self.feeds.lock().expect("feed registry lock");
        feeds.get(feed).map(|entry| entry.observers.len()).unwrap_or(0)
    }

    pub(super) fn store(&self) -> &Arc<dyn AttendanceStore> {
        &self.store
    }

    fn hydrate_from_cache(&self, feed: &str) -> Vec<Document> {
        match self.cache.get(&cache_key(feed)) {
            Some(bytes) => match serde_json::from_slice(&bytes) {
                Ok(items) => {
                    debug!(feed, "hydrated feed from persisted cache");
                    items
                }
                Err(error) => {
                    warn!(feed, %error, "discarding undecodable feed cache entry");
                    Vec::new()
                }
            },
            None => {
                debug!(feed, "no persisted cache for feed");
                Vec::new()
            }
        }
    }
}

fn cache_key(feed: &str) -> String {
    format!("feed:{feed}")
}

/// Sorts documents by the canonical feed ordering: time-in, else time-out,
/// else the parsed fallback date; descending, unknown instants last.
pub(super) fn sort_canonical(docs: &mut [Document]) {
    docs.sort_by(|a, b| match (canonical_instant(a), canonical_instant(b)) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
}

fn canonical_instant(doc: &Document) -> Option<chrono::DateTime<chrono::Utc>> {
    ["timeIn", "timeOut", "date"]
        .iter()
        .find_map(|field| doc.fields.get(*field).and_then(timeparse::parse_json))
}

/// Drains one feed's store deltas into the registry. Runs until the
/// subscription closes or the store stops delivering; observers keep their
/// last materialized view either way.
async fn pump_deltas(
    feed: String,
    mut deltas: mpsc::UnboundedReceiver<StoreDelta>,
    feeds: FeedMap,
    cache: Arc<dyn CachePort>,
) {
    while let Some(delta) = deltas.recv().await {
        apply_delta(&feed, delta, &feeds, &cache);
    }
    debug!(feed, "feed delta pump stopped");
}

fn apply_delta(feed: &str, delta: StoreDelta, feeds: &FeedMap, cache: &Arc<dyn CachePort>) {
    let mut feeds = feeds.lock().expect("feed registry lock");
    let Some(entry) = feeds.get_mut(feed) else {
        return;
    };

    let StoreDelta {
        mut snapshot,
        added,
        modified,
        removed,
    } = delta;
    sort_canonical(&mut snapshot);
    entry.materialized = snapshot;

    match serde_json::to_vec(&entry.materialized) {
        Ok(bytes) => {
            if let Err(error) = cache.set(&cache_key(feed), bytes) {
                debug!(feed, %error, "feed cache write failed");
            }
        }
        Err(error) => debug!(feed, %error, "feed cache encode failed"),
    }

    let update = FeedUpdate::Delta {
        added,
        modified,
        removed,
        items: entry.materialized.clone(),
    };
    // A dead observer must not block delivery to the rest; prune it instead.
    entry
        .observers
        .retain(|_, sender| sender.send(update.clone()).is_ok());
}
