use std::collections::{HashMap, VecDeque};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, trace};

use crate::models::ContextKey;

/// Default number of contexts kept per controller.
pub const DEFAULT_CACHE_CAPACITY: usize = 20;

/// Snapshot of a context's pagination state taken when the user left it.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<T> {
    pub items: Vec<T>,
    pub current_page: u32,
    pub total_items: usize,
    pub has_more: bool,
    /// Vertical scroll offset at capture time.
    pub scroll_position: f64,
    /// Milliseconds since the Unix epoch.
    pub captured_at: i64,
}

/// Bounded per-context snapshot store.
///
/// Eviction is by insertion order: when a new key pushes the size over
/// capacity, the key inserted first goes. Lookups never change that order,
/// and re-saving an existing key replaces its snapshot in place in the order.
#[derive(Debug)]
pub struct ContextCache<T> {
    capacity: usize,
    entries: HashMap<ContextKey, CacheEntry<T>>,
    order: VecDeque<ContextKey>,
}

impl<T> ContextCache<T> {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: HashMap::with_capacity(capacity + 1),
            order: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Stores `entry` under `key` and returns the evicted key, if any.
    pub fn insert(&mut self, key: ContextKey, entry: CacheEntry<T>) -> Option<ContextKey> {
        if self.entries.insert(key.clone(), entry).is_some() {
            trace!(context = %key, "Replaced cached snapshot");
            return None;
        }
        self.order.push_back(key);

        if self.entries.len() > self.capacity {
            let oldest = self.order.pop_front()?;
            self.entries.remove(&oldest);
            debug!(context = %oldest, capacity = self.capacity, "Evicted oldest context");
            return Some(oldest);
        }
        None
    }

    pub fn get(&self, key: &ContextKey) -> Option<&CacheEntry<T>> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &ContextKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &ContextKey) -> Option<CacheEntry<T>> {
        let removed = self.entries.remove(key)?;
        self.order.retain(|k| k != key);
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Cached keys, oldest insertion first.
    pub fn keys(&self) -> impl Iterator<Item = &ContextKey> {
        self.order.iter()
    }
}

impl<T> Default for ContextCache<T> {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
