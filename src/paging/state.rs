//! Pagination state for the context a controller is currently showing.

use super::cache::CacheEntry;

/// Where the state machine is, derived from its flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No context has been started yet.
    Uninitialized,
    Ready,
    Loading,
    /// The last fetch failed; a retry re-requests the same page.
    Failed,
    /// Everything the server reported has been loaded.
    Exhausted,
}

#[derive(Debug, Clone)]
pub struct PaginationState<T> {
    is_loading: bool,
    has_more: bool,
    current_page: u32,
    total_items: usize,
    loaded_items: Vec<T>,
    load_failed: bool,
    /// Set between `expect_first_page` and the arrival of page 1.
    awaiting_first_page: bool,
}

impl<T: Clone> PaginationState<T> {
    pub fn new() -> Self {
        Self {
            is_loading: false,
            has_more: true,
            current_page: 1,
            total_items: 0,
            loaded_items: Vec::new(),
            load_failed: false,
            awaiting_first_page: false,
        }
    }

    /// Drops everything and goes back to an empty first page.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Starts a context from an already-fetched first page.
    pub fn seed(&mut self, items: Vec<T>, total_items: usize) {
        self.is_loading = false;
        self.load_failed = false;
        self.awaiting_first_page = false;
        self.current_page = 1;
        self.loaded_items = items;
        self.total_items = total_items;
        self.recompute_has_more();
    }

    /// Empties the state so that the next `begin_load` asks for page 1
    /// rather than page 2. Stays that way across failed attempts.
    pub fn expect_first_page(&mut self) {
        self.reset();
        self.awaiting_first_page = true;
    }

    /// Copies every pagination field out of a snapshot. The snapshot keeps
    /// its own list.
    pub fn restore(&mut self, entry: &CacheEntry<T>) {
        self.is_loading = false;
        self.load_failed = false;
        self.awaiting_first_page = false;
        self.current_page = entry.current_page;
        self.total_items = entry.total_items;
        self.has_more = entry.has_more;
        self.loaded_items = entry.items.clone();
    }

    /// Claims the single fetch slot. Returns the page to request, or `None`
    /// when a fetch is already outstanding or nothing is left.
    pub fn begin_load(&mut self) -> Option<u32> {
        if self.is_loading || !self.has_more {
            return None;
        }
        self.is_loading = true;
        if self.awaiting_first_page {
            Some(1)
        } else {
            Some(self.current_page + 1)
        }
    }

    pub fn complete_load(&mut self, items: Vec<T>, total_items: usize) {
        self.loaded_items.extend(items);
        self.total_items = total_items;
        if self.awaiting_first_page {
            self.awaiting_first_page = false;
        } else {
            self.current_page += 1;
        }
        self.recompute_has_more();
        self.load_failed = false;
        self.is_loading = false;
    }

    pub fn fail_load(&mut self) {
        self.load_failed = true;
        self.is_loading = false;
    }

    /// Releases the fetch slot without recording anything; the outstanding
    /// result will be dropped by its caller.
    pub fn abandon_load(&mut self) {
        self.is_loading = false;
    }

    pub fn clear_failure(&mut self) {
        self.load_failed = false;
    }

    /// Independent copy for the context cache; `None` for an empty context.
    pub fn snapshot(&self, scroll_position: f64, captured_at: i64) -> Option<CacheEntry<T>> {
        if self.loaded_items.is_empty() {
            return None;
        }
        Some(CacheEntry {
            items: self.loaded_items.clone(),
            current_page: self.current_page,
            total_items: self.total_items,
            has_more: self.has_more,
            scroll_position,
            captured_at,
        })
    }

    fn recompute_has_more(&mut self) {
        self.has_more = self.loaded_items.len() < self.total_items;
    }

    pub fn phase(&self) -> Phase {
        if self.is_loading {
            Phase::Loading
        } else if self.load_failed {
            Phase::Failed
        } else if self.has_more {
            Phase::Ready
        } else {
            Phase::Exhausted
        }
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_items(&self) -> usize {
        self.total_items
    }

    pub fn load_failed(&self) -> bool {
        self.load_failed
    }

    pub fn loaded_items(&self) -> &[T] {
        &self.loaded_items
    }

    pub fn loaded_items_mut(&mut self) -> &mut Vec<T> {
        &mut self.loaded_items
    }

    pub fn loaded_count(&self) -> usize {
        self.loaded_items.len()
    }
}

impl<T: Clone> Default for PaginationState<T> {
    fn default() -> Self {
        Self::new()
    }
}
