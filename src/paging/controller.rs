//! Scroll/load orchestration for one paginated list.
//!
//! A `ListController` owns the pagination state of the context it is
//! showing and a bounded cache of contexts it has left. Everything runs on
//! one thread: methods take `&self`, mutable parts live in `Cell`/`RefCell`,
//! and no borrow is held across an `.await`, so intersection callbacks,
//! button clicks and context switches can all be dispatched while a page
//! fetch is outstanding.
//!
//! Every context activation bumps `generation`. A fetch remembers the
//! generation it started under and drops its result if that has moved on.

use std::cell::{Cell, Ref, RefCell, RefMut};

use tracing::{debug, trace, warn};

use super::cache::{now_millis, CacheEntry, ContextCache};
use super::collaborators::{ItemRenderer, PageSource, SentinelObserver, StatusSink, Surface};
use super::config::PagerConfig;
use super::state::{PaginationState, Phase};
use super::stats::StatsLabel;
use crate::error::FetchError;
use crate::layout::estimate_items_per_row;
use crate::models::{ContextKey, ContextKind, ListItem, PageRequest, SortSpec};

/// What a load trigger ended up doing.
#[derive(Debug)]
pub enum LoadOutcome {
    /// A page arrived and was appended.
    Loaded { page: u32, added: usize },
    /// The context was restored from the cache without a fetch.
    Restored,
    /// Nothing was requested.
    Skipped(SkipReason),
    /// The fetch failed; state is unchanged apart from the failure flag.
    Failed(FetchError),
    /// The fetch finished after the context changed and was discarded.
    Stale,
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoContext,
    AlreadyLoading,
    Exhausted,
    NotObserving,
    NothingToRetry,
}

#[derive(Debug, Clone)]
struct ActiveContext {
    key: ContextKey,
    sort: SortSpec,
}

pub struct ListController<T, R, S> {
    kind: ContextKind,
    config: PagerConfig,
    source: Box<dyn PageSource<T>>,
    renderer: R,
    surface: RefCell<S>,
    observer: RefCell<Option<Box<dyn SentinelObserver>>>,
    status: RefCell<Option<Box<dyn StatusSink>>>,
    commit: Option<String>,
    state: RefCell<PaginationState<T>>,
    cache: RefCell<ContextCache<T>>,
    active: RefCell<Option<ActiveContext>>,
    generation: Cell<u64>,
    observing: Cell<bool>,
    /// Whether the last failure may clear up once connectivity returns.
    failure_transient: Cell<bool>,
}

impl<T, R, S> ListController<T, R, S>
where
    T: ListItem,
    R: ItemRenderer<T>,
    S: Surface<R::Unit>,
{
    pub fn builder(
        kind: ContextKind,
        source: Box<dyn PageSource<T>>,
        renderer: R,
        surface: S,
    ) -> ListControllerBuilder<T, R, S> {
        ListControllerBuilder::new(kind, source, renderer, surface)
    }

    // =========================================================================
    // Context lifecycle
    // =========================================================================

    /// Activates `key` with a first page the caller already fetched.
    ///
    /// A cached snapshot of `key` wins over the seed: the cached pages are
    /// replayed and the scroll offset restored without touching the source.
    pub fn start_for_context(
        &self,
        key: ContextKey,
        seed_items: Vec<T>,
        total_items: usize,
        sort: SortSpec,
    ) -> LoadOutcome {
        let generation = self.activate(key.clone(), sort);
        if self.restore_cached(&key) {
            return LoadOutcome::Restored;
        }

        self.state.borrow_mut().seed(seed_items, total_items);
        debug!(
            kind = self.kind.as_str(),
            context = %key,
            generation,
            total_items,
            "Seeded context"
        );
        self.replay_loaded();
        LoadOutcome::Loaded {
            page: 1,
            added: self.loaded_count(),
        }
    }

    /// Activates `key`, restoring it from the cache or fetching page 1.
    pub async fn open_context(&self, key: ContextKey, sort: SortSpec) -> LoadOutcome {
        let generation = self.activate(key.clone(), sort);
        if self.restore_cached(&key) {
            return LoadOutcome::Restored;
        }

        self.state.borrow_mut().expect_first_page();
        self.surface.borrow_mut().clear();
        debug!(
            kind = self.kind.as_str(),
            context = %key,
            generation,
            "Cache miss, fetching first page"
        );
        self.load_next_page().await
    }

    /// Drops the current context's pages without caching them. Nothing can
    /// be loaded until the next `start_for_context` or `open_context`.
    pub fn reset_state(&self) {
        self.bump_generation();
        self.state.borrow_mut().reset();
        *self.active.borrow_mut() = None;
        self.disarm_observer();
        {
            let mut surface = self.surface.borrow_mut();
            surface.hide_skeletons();
            surface.set_retry_visible(false);
        }
        self.update_load_more_visibility();
        debug!(kind = self.kind.as_str(), "Pagination state reset");
    }

    /// Snapshots the active context and detaches from it before the caller
    /// shows something else. A fetch still in flight for it is discarded
    /// when it completes.
    pub fn leave_context(&self) -> bool {
        let saved = self.save_current_to_cache();
        let generation = self.bump_generation();
        self.state.borrow_mut().abandon_load();
        self.disarm_observer();
        self.surface.borrow_mut().hide_skeletons();
        debug!(kind = self.kind.as_str(), generation, saved, "Left context");
        saved
    }

    /// Forced refresh after a mutation made the loaded pages unreliable.
    pub async fn refresh(&self) -> LoadOutcome {
        let Some(active) = self.active.borrow().clone() else {
            return LoadOutcome::Skipped(SkipReason::NoContext);
        };
        self.clear_cache(Some(&active.key));
        self.reset_state();
        self.open_context(active.key, active.sort).await
    }

    /// Applies a new global sort/filter. Every cached page set was fetched
    /// under the old ordering, so the whole cache goes.
    pub async fn set_sort(&self, sort: SortSpec) -> LoadOutcome {
        self.clear_cache(None);
        let key = match self.active.borrow().as_ref() {
            Some(active) => active.key.clone(),
            None => return LoadOutcome::Skipped(SkipReason::NoContext),
        };
        self.open_context(key, sort).await
    }

    fn activate(&self, key: ContextKey, sort: SortSpec) -> u64 {
        let generation = self.bump_generation();
        *self.active.borrow_mut() = Some(ActiveContext { key, sort });
        {
            let mut surface = self.surface.borrow_mut();
            surface.hide_skeletons();
            surface.set_retry_visible(false);
        }
        generation
    }

    fn bump_generation(&self) -> u64 {
        let generation = self.generation.get().wrapping_add(1);
        self.generation.set(generation);
        generation
    }

    fn restore_cached(&self, key: &ContextKey) -> bool {
        let scroll = {
            let cache = self.cache.borrow();
            let Some(entry) = cache.get(key) else {
                return false;
            };
            self.state.borrow_mut().restore(entry);
            entry.scroll_position
        };

        debug!(
            kind = self.kind.as_str(),
            context = %key,
            loaded = self.loaded_count(),
            "Restored context from cache"
        );
        self.replay_loaded();
        self.surface.borrow_mut().set_scroll_offset(scroll);
        true
    }

    /// Renders every loaded item in one pass and re-arms the sentinel.
    fn replay_loaded(&self) {
        {
            let state = self.state.borrow();
            self.render_items(state.loaded_items(), false);
        }
        self.sync_observer();
        self.update_load_more_visibility();
    }

    // =========================================================================
    // Page loading
    // =========================================================================

    /// Fetches page `current_page + 1` of the active context.
    ///
    /// No-op while a fetch is outstanding or once everything is loaded.
    pub async fn load_next_page(&self) -> LoadOutcome {
        let Some(active) = self.active.borrow().clone() else {
            return LoadOutcome::Skipped(SkipReason::NoContext);
        };

        let page = {
            let mut state = self.state.borrow_mut();
            if state.is_loading() {
                trace!(context = %active.key, "Load already in flight");
                return LoadOutcome::Skipped(SkipReason::AlreadyLoading);
            }
            match state.begin_load() {
                Some(page) => page,
                None => return LoadOutcome::Skipped(SkipReason::Exhausted),
            }
        };
        let generation = self.generation.get();
        self.show_loading();

        let request = PageRequest {
            context: active.key,
            page,
            page_size: self.config.page_size,
            sort: active.sort,
        };
        trace!(
            kind = self.kind.as_str(),
            context = %request.context,
            page,
            generation,
            "Requesting page"
        );

        let result = self.source.fetch_page(&request).await;

        if generation != self.generation.get() {
            debug!(
                context = %request.context,
                page,
                generation,
                current = self.generation.get(),
                "Discarding page for a context that is no longer active"
            );
            return LoadOutcome::Stale;
        }

        self.surface.borrow_mut().hide_skeletons();

        match result {
            Ok(fetched) => {
                let added = fetched.items.len();
                let start = {
                    let mut state = self.state.borrow_mut();
                    let start = state.loaded_count();
                    state.complete_load(fetched.items, fetched.total_items);
                    start
                };
                {
                    let state = self.state.borrow();
                    self.render_items(&state.loaded_items()[start..], page > 1);
                }
                self.surface.borrow_mut().set_retry_visible(false);
                self.sync_observer();
                self.update_load_more_visibility();
                debug!(
                    context = %request.context,
                    page,
                    added,
                    loaded = self.loaded_count(),
                    total = self.total_items(),
                    "Page loaded"
                );
                LoadOutcome::Loaded { page, added }
            }
            Err(err) => {
                warn!(
                    context = %request.context,
                    page,
                    error = %err,
                    transient = err.is_transient(),
                    "Page fetch failed"
                );
                self.failure_transient.set(err.is_transient());
                self.state.borrow_mut().fail_load();
                self.surface.borrow_mut().set_retry_visible(true);
                self.update_load_more_visibility();
                LoadOutcome::Failed(err)
            }
        }
    }

    /// Intersection callback: the sentinel came within the trigger margin.
    pub async fn on_sentinel_visible(&self) -> LoadOutcome {
        if !self.observing.get() {
            return LoadOutcome::Skipped(SkipReason::NotObserving);
        }
        self.load_next_page().await
    }

    /// Explicit retry after a failed fetch; re-requests the same page.
    pub async fn retry_load(&self) -> LoadOutcome {
        self.state.borrow_mut().clear_failure();
        self.load_next_page().await
    }

    /// Connectivity came back. Retries only if the last fetch failed with
    /// an error that connectivity can fix; anything else waits for an
    /// explicit `retry_load`.
    pub async fn on_connectivity_restored(&self) -> LoadOutcome {
        if !self.state.borrow().load_failed() || !self.failure_transient.get() {
            return LoadOutcome::Skipped(SkipReason::NothingToRetry);
        }
        debug!(kind = self.kind.as_str(), "Connectivity restored, retrying");
        self.retry_load().await
    }

    fn show_loading(&self) {
        let mut surface = self.surface.borrow_mut();
        let per_row = estimate_items_per_row(surface.viewport_width());
        surface.set_load_more_visible(false);
        surface.set_retry_visible(false);
        surface.show_skeletons(self.config.skeleton_count, per_row);
    }

    // =========================================================================
    // Context cache
    // =========================================================================

    /// Snapshots the live state under `key`. Empty contexts are not cached.
    pub fn save_to_cache(&self, key: &ContextKey) -> bool {
        let scroll = self.surface.borrow().scroll_offset();
        let Some(entry) = self.state.borrow().snapshot(scroll, now_millis()) else {
            trace!(context = %key, "Not caching empty context");
            return false;
        };
        let items = entry.items.len();
        self.cache.borrow_mut().insert(key.clone(), entry);
        debug!(kind = self.kind.as_str(), context = %key, items, "Cached context");
        true
    }

    /// Saves the active context, if any, before the caller switches away.
    pub fn save_current_to_cache(&self) -> bool {
        let key = match self.active.borrow().as_ref() {
            Some(active) => active.key.clone(),
            None => return false,
        };
        self.save_to_cache(&key)
    }

    /// Copy of the cached snapshot for `key`. Does not reorder the cache.
    pub fn restore_from_cache(&self, key: &ContextKey) -> Option<CacheEntry<T>> {
        self.cache.borrow().get(key).cloned()
    }

    /// Drops one cached context, or all of them with `None`.
    pub fn clear_cache(&self, key: Option<&ContextKey>) {
        let mut cache = self.cache.borrow_mut();
        match key {
            Some(key) => {
                cache.remove(key);
                debug!(kind = self.kind.as_str(), context = %key, "Cleared cached context");
            }
            None => {
                cache.clear();
                debug!(kind = self.kind.as_str(), "Cleared context cache");
            }
        }
    }

    pub fn cache_len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn cache_contains(&self, key: &ContextKey) -> bool {
        self.cache.borrow().contains(key)
    }

    /// Cached keys, oldest insertion first.
    pub fn cached_keys(&self) -> Vec<ContextKey> {
        self.cache.borrow().keys().cloned().collect()
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// Pushes `items` to the surface. A non-append call replaces what is
    /// shown and, if it leaves nothing, shows the empty-state placeholder.
    pub fn render_items(&self, items: &[T], append: bool) {
        {
            let mut surface = self.surface.borrow_mut();
            if !append {
                surface.clear();
                if items.is_empty() {
                    let message = match self.active.borrow().as_ref() {
                        Some(active) => self.kind.empty_message(&active.key),
                        None => self.kind.empty_message(&ContextKey::from("")),
                    };
                    surface.show_empty(&message);
                }
            }
            for item in items {
                surface.append(self.renderer.render(item));
            }
            surface.refresh_icons();
            surface.reconcile_selection();
        }
        self.push_stats();
    }

    /// The manual "load more" control is shown iff there is more to load and
    /// nothing is loading.
    pub fn update_load_more_visibility(&self) {
        let visible = {
            let state = self.state.borrow();
            self.active.borrow().is_some() && state.has_more() && !state.is_loading()
        };
        self.surface.borrow_mut().set_load_more_visible(visible);
    }

    fn disarm_observer(&self) {
        if !self.observing.replace(false) {
            return;
        }
        if let Some(observer) = self.observer.borrow_mut().as_mut() {
            observer.unobserve();
        }
    }

    fn sync_observer(&self) {
        let wanted = self.state.borrow().has_more();
        if wanted == self.observing.get() {
            return;
        }
        self.observing.set(wanted);
        if let Some(observer) = self.observer.borrow_mut().as_mut() {
            if wanted {
                observer.observe(self.config.trigger_margin_px);
            } else {
                observer.unobserve();
            }
        }
    }

    fn push_stats(&self) {
        let label = self.stats();
        if let Some(status) = self.status.borrow_mut().as_mut() {
            status.show(&label);
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn stats(&self) -> StatsLabel {
        let state = self.state.borrow();
        StatsLabel::new(state.loaded_count(), state.total_items()).with_commit(self.commit.as_deref())
    }

    pub fn all_loaded_items(&self) -> Vec<T> {
        self.state.borrow().loaded_items().to_vec()
    }

    /// The loaded item after (or before) the one keyed `key`, skipping items
    /// `accept` rejects. Used for next/previous in the media viewer.
    pub fn adjacent_item<F>(&self, key: &str, forward: bool, accept: F) -> Option<T>
    where
        F: Fn(&T) -> bool,
    {
        let state = self.state.borrow();
        let items = state.loaded_items();
        let index = items.iter().position(|item| item.key() == key)?;
        if forward {
            items[index + 1..].iter().find(|item| accept(item)).cloned()
        } else {
            items[..index].iter().rev().find(|item| accept(item)).cloned()
        }
    }

    pub fn total_items(&self) -> usize {
        self.state.borrow().total_items()
    }

    pub fn loaded_count(&self) -> usize {
        self.state.borrow().loaded_count()
    }

    pub fn current_page(&self) -> u32 {
        self.state.borrow().current_page()
    }

    pub fn has_more(&self) -> bool {
        self.state.borrow().has_more()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().is_loading()
    }

    pub fn load_failed(&self) -> bool {
        self.state.borrow().load_failed()
    }

    pub fn is_observing(&self) -> bool {
        self.observing.get()
    }

    pub fn phase(&self) -> Phase {
        if self.active.borrow().is_none() {
            return Phase::Uninitialized;
        }
        self.state.borrow().phase()
    }

    pub fn current_key(&self) -> Option<ContextKey> {
        self.active.borrow().as_ref().map(|a| a.key.clone())
    }

    pub fn current_sort(&self) -> Option<SortSpec> {
        self.active.borrow().as_ref().map(|a| a.sort)
    }

    pub fn kind(&self) -> ContextKind {
        self.kind
    }

    pub fn surface(&self) -> Ref<'_, S> {
        self.surface.borrow()
    }

    pub fn surface_mut(&self) -> RefMut<'_, S> {
        self.surface.borrow_mut()
    }
}

/// Builder for [`ListController`]; the renderer, surface and page source are
/// required, everything else has a fallback.
pub struct ListControllerBuilder<T, R, S> {
    kind: ContextKind,
    source: Box<dyn PageSource<T>>,
    renderer: R,
    surface: S,
    config: PagerConfig,
    observer: Option<Box<dyn SentinelObserver>>,
    status: Option<Box<dyn StatusSink>>,
    commit: Option<String>,
}

impl<T, R, S> ListControllerBuilder<T, R, S>
where
    T: ListItem,
    R: ItemRenderer<T>,
    S: Surface<R::Unit>,
{
    pub fn new(kind: ContextKind, source: Box<dyn PageSource<T>>, renderer: R, surface: S) -> Self {
        Self {
            kind,
            source,
            renderer,
            surface,
            config: PagerConfig::default(),
            observer: None,
            status: None,
            commit: None,
        }
    }

    pub fn config(mut self, config: PagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Without an observer, the manual "load more" control is the only
    /// trigger.
    pub fn observer(mut self, observer: Box<dyn SentinelObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn status(mut self, status: Box<dyn StatusSink>) -> Self {
        self.status = Some(status);
        self
    }

    pub fn commit(mut self, commit: Option<String>) -> Self {
        self.commit = commit;
        self
    }

    pub fn build(self) -> ListController<T, R, S> {
        debug!(
            kind = self.kind.as_str(),
            page_size = self.config.page_size,
            cache_capacity = self.config.cache_capacity,
            observer = self.observer.is_some(),
            "Built list controller"
        );
        ListController {
            kind: self.kind,
            cache: RefCell::new(ContextCache::new(self.config.cache_capacity)),
            config: self.config,
            source: self.source,
            renderer: self.renderer,
            surface: RefCell::new(self.surface),
            observer: RefCell::new(self.observer),
            status: RefCell::new(self.status),
            commit: self.commit,
            state: RefCell::new(PaginationState::new()),
            active: RefCell::new(None),
            generation: Cell::new(0),
            observing: Cell::new(false),
            failure_transient: Cell::new(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use tokio::sync::Notify;

    use super::*;
    use crate::models::{MediaItem, SortField, SortOrder};
    use crate::paging::testing::{media, media_range, FixtureBuilder, ObserverEvent};

    fn dir(path: &str) -> ContextKey {
        ContextKey::directory(path)
    }

    #[tokio::test]
    async fn test_scroll_to_end_of_small_folder() {
        let fx = FixtureBuilder::new(ContextKind::Directory).build();
        let c = &fx.controller;

        let outcome = c.start_for_context(
            dir("/photos"),
            vec![media("/photos/a.jpg"), media("/photos/b.jpg")],
            10,
            SortSpec::default(),
        );
        assert!(outcome.is_loaded());
        assert_eq!(c.loaded_count(), 2);
        assert!(c.has_more());
        assert!(c.surface().load_more_visible);

        fx.source.push_page(media_range("/photos", 2..10), 10);
        let outcome = c.on_sentinel_visible().await;

        assert!(matches!(outcome, LoadOutcome::Loaded { page: 2, added: 8 }));
        assert_eq!(c.loaded_count(), 10);
        assert!(!c.has_more());
        assert_eq!(c.phase(), Phase::Exhausted);
        assert!(!c.surface().load_more_visible);
        assert_eq!(c.surface().units.len(), 10);
        assert_eq!(c.surface().clears, 1);
        assert_eq!(fx.source.requests()[0].page, 2);
    }

    #[tokio::test]
    async fn test_has_more_tracks_counts_across_pages() {
        let fx = FixtureBuilder::new(ContextKind::Directory)
            .context(dir("/big"), media_range("/big", 0..120))
            .build();
        let c = &fx.controller;

        assert!(c.open_context(dir("/big"), SortSpec::default()).await.is_loaded());
        while c.has_more() {
            assert!(c.load_next_page().await.is_loaded());
            assert_eq!(c.has_more(), c.loaded_count() < c.total_items());
        }
        assert_eq!(c.loaded_count(), 120);
        assert_eq!(c.current_page(), 3);
        let pages: Vec<u32> = fx.source.requests().iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![1, 2, 3]);
        assert!(matches!(
            c.load_next_page().await,
            LoadOutcome::Skipped(SkipReason::Exhausted)
        ));
    }

    #[tokio::test]
    async fn test_cache_keeps_the_newest_contexts() {
        let fx = FixtureBuilder::new(ContextKind::Directory).build();
        let c = &fx.controller;

        for i in 0..25 {
            let key = dir(&format!("/ctx/{}", i));
            c.start_for_context(key.clone(), vec![media("/x.jpg")], 1, SortSpec::default());
            assert!(c.save_to_cache(&key));
        }

        assert_eq!(c.cache_len(), 20);
        assert!(!c.cache_contains(&dir("/ctx/0")));
        assert!(!c.cache_contains(&dir("/ctx/4")));
        assert!(c.cache_contains(&dir("/ctx/24")));
        assert_eq!(c.cached_keys().first(), Some(&dir("/ctx/5")));
    }

    #[tokio::test]
    async fn test_small_cache_evicts_first_inserted() {
        let fx = FixtureBuilder::new(ContextKind::Directory)
            .config(PagerConfig::default().with_cache_capacity(3))
            .build();
        let c = &fx.controller;

        for i in 0..21 {
            let key = dir(&format!("/{}", i));
            c.start_for_context(key.clone(), vec![media("/one.jpg")], 1, SortSpec::default());
            c.save_to_cache(&key);
        }

        assert_eq!(c.cache_len(), 3);
        assert!(!c.cache_contains(&dir("/0")));
        assert_eq!(c.cached_keys(), vec![dir("/18"), dir("/19"), dir("/20")]);
    }

    #[tokio::test]
    async fn test_lookup_does_not_refresh_eviction_order() {
        let fx = FixtureBuilder::new(ContextKind::Directory)
            .config(PagerConfig::default().with_cache_capacity(2))
            .build();
        let c = &fx.controller;

        for name in ["/a", "/b"] {
            c.start_for_context(dir(name), vec![media("/f.jpg")], 1, SortSpec::default());
            c.save_to_cache(&dir(name));
        }
        assert!(c.restore_from_cache(&dir("/a")).is_some());

        c.start_for_context(dir("/c"), vec![media("/f.jpg")], 1, SortSpec::default());
        c.save_to_cache(&dir("/c"));
        assert!(!c.cache_contains(&dir("/a")));
        assert!(c.cache_contains(&dir("/b")));
    }

    #[tokio::test]
    async fn test_empty_context_is_not_cached() {
        let fx = FixtureBuilder::new(ContextKind::Directory)
            .context(dir("/empty"), Vec::new())
            .build();
        let c = &fx.controller;

        assert!(!c.save_current_to_cache());
        c.open_context(dir("/empty"), SortSpec::default()).await;
        assert!(!c.save_to_cache(&dir("/empty")));
        assert!(!c.cache_contains(&dir("/empty")));
        assert_eq!(c.cache_len(), 0);
    }

    #[tokio::test]
    async fn test_snapshot_survives_later_loads() {
        let fx = FixtureBuilder::new(ContextKind::Directory).build();
        let c = &fx.controller;

        c.start_for_context(
            dir("/photos"),
            media_range("/photos", 0..2),
            10,
            SortSpec::default(),
        );
        c.save_current_to_cache();

        fx.source.push_page(media_range("/photos", 2..10), 10);
        c.load_next_page().await;
        assert_eq!(c.loaded_count(), 10);

        let entry = c.restore_from_cache(&dir("/photos")).unwrap();
        assert_eq!(entry.items.len(), 2);
        assert!(entry.has_more);
    }

    #[tokio::test]
    async fn test_restore_skips_the_source() {
        let fx = FixtureBuilder::new(ContextKind::Directory)
            .context(dir("/big"), media_range("/big", 0..150))
            .context(dir("/other"), media_range("/other", 0..5))
            .build();
        let c = &fx.controller;

        c.open_context(dir("/big"), SortSpec::default()).await;
        c.load_next_page().await;
        assert_eq!(c.loaded_count(), 100);
        c.surface_mut().scroll = 640.0;
        assert!(c.save_current_to_cache());

        c.open_context(dir("/other"), SortSpec::default()).await;
        c.surface_mut().scroll = 0.0;
        let calls = fx.source.calls();
        assert_eq!(calls, 3);

        let outcome = c.open_context(dir("/big"), SortSpec::default()).await;
        assert!(matches!(outcome, LoadOutcome::Restored));
        assert_eq!(fx.source.calls(), calls);
        assert_eq!(c.current_page(), 2);
        assert_eq!(c.total_items(), 150);
        assert!(c.has_more());
        assert_eq!(c.loaded_count(), 100);
        assert_eq!(c.surface().units.len(), 100);
        assert_eq!(c.surface().scroll, 640.0);
    }

    #[tokio::test]
    async fn test_cached_snapshot_wins_over_seed() {
        let fx = FixtureBuilder::new(ContextKind::Directory).build();
        let c = &fx.controller;

        c.start_for_context(dir("/a"), media_range("/a", 0..4), 40, SortSpec::default());
        c.save_current_to_cache();
        let outcome = c.start_for_context(dir("/a"), media_range("/a", 0..1), 40, SortSpec::default());

        assert!(matches!(outcome, LoadOutcome::Restored));
        assert_eq!(c.loaded_count(), 4);
    }

    #[tokio::test]
    async fn test_second_trigger_while_loading_is_ignored() {
        let gate = Rc::new(Notify::new());
        let fx = FixtureBuilder::new(ContextKind::Directory)
            .context(dir("/p"), media_range("/p", 0..100))
            .gate(Rc::clone(&gate))
            .build();
        let c = &fx.controller;
        c.start_for_context(dir("/p"), media_range("/p", 0..50), 100, SortSpec::default());

        let (first, second, _) = tokio::join!(c.load_next_page(), c.load_next_page(), async {
            tokio::task::yield_now().await;
            assert!(c.is_loading());
            assert_eq!(c.current_page(), 1);
            assert_eq!(c.surface().skeletons, Some((12, 6)));
            assert!(!c.surface().load_more_visible);
            gate.notify_one();
        });

        assert!(matches!(first, LoadOutcome::Loaded { page: 2, added: 50 }));
        assert!(matches!(
            second,
            LoadOutcome::Skipped(SkipReason::AlreadyLoading)
        ));
        assert_eq!(fx.source.calls(), 1);
        assert_eq!(c.current_page(), 2);
        assert_eq!(c.surface().skeletons, None);
        assert_eq!(c.surface().skeleton_shows, 1);
    }

    #[tokio::test]
    async fn test_completion_after_context_switch_is_discarded() {
        let gate = Rc::new(Notify::new());
        let fx = FixtureBuilder::new(ContextKind::Directory)
            .context(dir("/slow"), media_range("/slow", 0..120))
            .gate(Rc::clone(&gate))
            .build();
        let c = &fx.controller;
        c.start_for_context(dir("/slow"), media_range("/slow", 0..50), 120, SortSpec::default());

        let (outcome, _) = tokio::join!(c.load_next_page(), async {
            tokio::task::yield_now().await;
            c.start_for_context(dir("/fast"), media_range("/fast", 0..3), 3, SortSpec::default());
            gate.notify_one();
        });

        assert!(matches!(outcome, LoadOutcome::Stale));
        assert_eq!(c.current_key(), Some(dir("/fast")));
        assert_eq!(c.loaded_count(), 3);
        assert!(!c.is_loading());
        let surface = c.surface();
        assert_eq!(surface.units.len(), 3);
        assert!(surface.units.iter().all(|u| u.starts_with("/fast")));
    }

    #[tokio::test]
    async fn test_failed_completion_after_context_switch_is_discarded() {
        let gate = Rc::new(Notify::new());
        let fx = FixtureBuilder::new(ContextKind::Directory)
            .gate(Rc::clone(&gate))
            .build();
        let c = &fx.controller;
        c.start_for_context(dir("/slow"), media_range("/slow", 0..50), 120, SortSpec::default());
        fx.source.push_error(FetchError::Timeout);

        let (outcome, _) = tokio::join!(c.load_next_page(), async {
            tokio::task::yield_now().await;
            c.start_for_context(dir("/fast"), media_range("/fast", 0..3), 3, SortSpec::default());
            gate.notify_one();
        });

        assert!(matches!(outcome, LoadOutcome::Stale));
        assert!(!c.load_failed());
        assert!(!c.surface().retry_visible);
        assert_eq!(c.phase(), Phase::Exhausted);
        assert_eq!(c.loaded_count(), 3);
        assert!(matches!(
            c.on_connectivity_restored().await,
            LoadOutcome::Skipped(SkipReason::NothingToRetry)
        ));
    }

    #[tokio::test]
    async fn test_retry_requests_the_failed_page_again() {
        let fx = FixtureBuilder::new(ContextKind::Directory)
            .context(dir("/p"), media_range("/p", 0..120))
            .build();
        let c = &fx.controller;
        c.start_for_context(dir("/p"), media_range("/p", 0..50), 120, SortSpec::default());

        fx.source.push_error(FetchError::Timeout);
        let outcome = c.load_next_page().await;
        assert!(matches!(outcome, LoadOutcome::Failed(FetchError::Timeout)));
        assert!(c.load_failed());
        assert_eq!(c.phase(), Phase::Failed);
        assert_eq!(c.loaded_count(), 50);
        assert_eq!(c.current_page(), 1);
        assert!(c.surface().retry_visible);
        assert_eq!(c.surface().skeletons, None);

        let outcome = c.retry_load().await;
        assert!(matches!(outcome, LoadOutcome::Loaded { page: 2, added: 50 }));
        assert!(!c.load_failed());
        assert!(!c.surface().retry_visible);
        let pages: Vec<u32> = fx.source.requests().iter().map(|r| r.page).collect();
        assert_eq!(pages, vec![2, 2]);
    }

    #[tokio::test]
    async fn test_failed_first_page_can_be_retried() {
        let fx = FixtureBuilder::new(ContextKind::Directory)
            .context(dir("/p"), media_range("/p", 0..10))
            .build();
        let c = &fx.controller;

        fx.source.push_error(FetchError::Network("connection reset".into()));
        assert!(matches!(
            c.open_context(dir("/p"), SortSpec::default()).await,
            LoadOutcome::Failed(_)
        ));
        assert_eq!(c.loaded_count(), 0);
        assert_eq!(c.current_page(), 1);
        assert_eq!(c.phase(), Phase::Failed);

        assert!(c.retry_load().await.is_loaded());
        assert_eq!(c.loaded_count(), 10);
        assert_eq!(c.current_page(), 1);
        assert!(!c.has_more());
    }

    #[tokio::test]
    async fn test_connectivity_restored_only_retries_after_failure() {
        let fx = FixtureBuilder::new(ContextKind::Directory)
            .context(dir("/p"), media_range("/p", 0..100))
            .build();
        let c = &fx.controller;
        c.start_for_context(dir("/p"), media_range("/p", 0..50), 100, SortSpec::default());

        assert!(matches!(
            c.on_connectivity_restored().await,
            LoadOutcome::Skipped(SkipReason::NothingToRetry)
        ));
        assert_eq!(fx.source.calls(), 0);

        fx.source.push_error(FetchError::Status(503));
        c.load_next_page().await;
        assert!(c.on_connectivity_restored().await.is_loaded());
        assert_eq!(c.loaded_count(), 100);
    }

    #[tokio::test]
    async fn test_connectivity_does_not_retry_a_missing_context() {
        let fx = FixtureBuilder::new(ContextKind::Directory)
            .context(dir("/p"), media_range("/p", 0..100))
            .build();
        let c = &fx.controller;
        c.start_for_context(dir("/p"), media_range("/p", 0..50), 100, SortSpec::default());

        fx.source.push_error(FetchError::NotFound("/p".into()));
        c.load_next_page().await;
        assert!(c.load_failed());
        assert!(matches!(
            c.on_connectivity_restored().await,
            LoadOutcome::Skipped(SkipReason::NothingToRetry)
        ));
        assert_eq!(fx.source.calls(), 1);

        assert!(c.retry_load().await.is_loaded());
    }

    #[tokio::test]
    async fn test_empty_state_messages() {
        let search = FixtureBuilder::new(ContextKind::Search)
            .context(ContextKey::search("cats"), Vec::new())
            .build();
        search
            .controller
            .open_context(ContextKey::search("  Cats "), SortSpec::default())
            .await;
        assert_eq!(
            search.controller.surface().empty_message.as_deref(),
            Some("No results for \"cats\"")
        );

        let folder = FixtureBuilder::new(ContextKind::Directory)
            .context(dir("/empty"), Vec::new())
            .build();
        folder
            .controller
            .open_context(dir("/empty/"), SortSpec::default())
            .await;
        assert_eq!(
            folder.controller.surface().empty_message.as_deref(),
            Some("This folder is empty")
        );
        assert!(!folder.controller.has_more());
        assert!(!folder.controller.surface().load_more_visible);
    }

    #[tokio::test]
    async fn test_observer_armed_with_margin_until_exhausted() {
        let fx = FixtureBuilder::new(ContextKind::Directory).build();
        let c = &fx.controller;

        c.start_for_context(dir("/photos"), media_range("/photos", 0..2), 10, SortSpec::default());
        assert!(c.is_observing());

        fx.source.push_page(media_range("/photos", 2..10), 10);
        c.on_sentinel_visible().await;

        assert!(!c.is_observing());
        assert_eq!(
            *fx.observer.borrow(),
            vec![ObserverEvent::Observe(800), ObserverEvent::Unobserve]
        );
        assert!(matches!(
            c.on_sentinel_visible().await,
            LoadOutcome::Skipped(SkipReason::NotObserving)
        ));
    }

    #[tokio::test]
    async fn test_load_more_without_observer() {
        let fx = FixtureBuilder::new(ContextKind::Directory)
            .context(dir("/p"), media_range("/p", 0..60))
            .without_observer()
            .build();
        let c = &fx.controller;

        c.open_context(dir("/p"), SortSpec::default()).await;
        assert!(c.surface().load_more_visible);
        assert!(c.load_next_page().await.is_loaded());
        assert_eq!(c.loaded_count(), 60);
        assert!(fx.observer.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_status_line_carries_commit() {
        let fx = FixtureBuilder::new(ContextKind::Directory)
            .commit("abcdef1234567890")
            .build();
        let c = &fx.controller;

        c.start_for_context(dir("/photos"), media_range("/photos", 0..2), 10, SortSpec::default());
        assert_eq!(
            fx.status.borrow().last().map(String::as_str),
            Some("Showing 2 of 10 · abcdef1")
        );
        assert_eq!(c.stats().commit.as_deref(), Some("abcdef1"));
    }

    #[tokio::test]
    async fn test_every_render_refreshes_icons_and_selection() {
        let fx = FixtureBuilder::new(ContextKind::Directory).build();
        let c = &fx.controller;

        c.start_for_context(dir("/p"), media_range("/p", 0..2), 4, SortSpec::default());
        fx.source.push_page(media_range("/p", 2..4), 4);
        c.load_next_page().await;

        assert_eq!(c.surface().icon_refreshes, 2);
        assert_eq!(c.surface().selection_reconciles, 2);
    }

    #[tokio::test]
    async fn test_set_sort_clears_cache_and_reloads() {
        let fx = FixtureBuilder::new(ContextKind::Directory)
            .context(dir("/b"), media_range("/b", 0..8))
            .build();
        let c = &fx.controller;

        for name in ["/a", "/b"] {
            c.start_for_context(dir(name), vec![media("/f.jpg")], 1, SortSpec::default());
            c.save_current_to_cache();
        }
        assert_eq!(c.cache_len(), 2);

        let sort = SortSpec::new(SortField::Size, SortOrder::Descending);
        assert!(c.set_sort(sort).await.is_loaded());

        assert_eq!(c.cache_len(), 0);
        assert_eq!(c.current_sort(), Some(sort));
        assert_eq!(c.loaded_count(), 8);
        let request = &fx.source.requests()[0];
        assert_eq!(request.page, 1);
        assert_eq!(request.sort, sort);
    }

    #[tokio::test]
    async fn test_refresh_drops_the_cached_copy() {
        let fx = FixtureBuilder::new(ContextKind::Directory)
            .context(dir("/a"), media_range("/a", 0..3))
            .build();
        let c = &fx.controller;

        assert!(matches!(
            c.refresh().await,
            LoadOutcome::Skipped(SkipReason::NoContext)
        ));

        c.open_context(dir("/a"), SortSpec::default()).await;
        c.save_current_to_cache();
        assert!(c.refresh().await.is_loaded());

        assert!(!c.cache_contains(&dir("/a")));
        assert_eq!(fx.source.calls(), 2);
        assert_eq!(c.loaded_count(), 3);
    }

    #[tokio::test]
    async fn test_reset_state() {
        let fx = FixtureBuilder::new(ContextKind::Directory).build();
        let c = &fx.controller;

        c.start_for_context(dir("/p"), media_range("/p", 0..5), 50, SortSpec::default());
        c.reset_state();

        assert_eq!(c.loaded_count(), 0);
        assert_eq!(c.total_items(), 0);
        assert_eq!(c.current_page(), 1);
        assert!(!c.is_loading());
        assert_eq!(c.phase(), Phase::Uninitialized);
    }

    #[tokio::test]
    async fn test_nothing_loads_after_reset_until_reopened() {
        let fx = FixtureBuilder::new(ContextKind::Directory)
            .context(dir("/p"), media_range("/p", 0..120))
            .build();
        let c = &fx.controller;

        c.start_for_context(dir("/p"), media_range("/p", 0..50), 120, SortSpec::default());
        c.reset_state();

        assert!(!c.surface().load_more_visible);
        assert_eq!(c.surface().skeletons, None);
        assert!(!c.is_observing());
        assert_eq!(
            *fx.observer.borrow(),
            vec![ObserverEvent::Observe(800), ObserverEvent::Unobserve]
        );
        assert!(matches!(
            c.on_sentinel_visible().await,
            LoadOutcome::Skipped(SkipReason::NotObserving)
        ));
        assert!(matches!(
            c.load_next_page().await,
            LoadOutcome::Skipped(SkipReason::NoContext)
        ));
        assert_eq!(fx.source.calls(), 0);

        c.open_context(dir("/p"), SortSpec::default()).await;
        assert_eq!(fx.source.requests()[0].page, 1);
        assert_eq!(c.all_loaded_items()[0].path, "/p/0000.jpg");
    }

    #[tokio::test]
    async fn test_leaving_drops_the_page_in_flight() {
        let gate = Rc::new(Notify::new());
        let fx = FixtureBuilder::new(ContextKind::Directory)
            .context(dir("/p"), media_range("/p", 0..120))
            .gate(Rc::clone(&gate))
            .build();
        let c = &fx.controller;
        c.start_for_context(dir("/p"), media_range("/p", 0..50), 120, SortSpec::default());

        let (outcome, saved) = tokio::join!(c.load_next_page(), async {
            tokio::task::yield_now().await;
            let saved = c.leave_context();
            gate.notify_one();
            saved
        });

        assert!(saved);
        assert!(matches!(outcome, LoadOutcome::Stale));
        assert_eq!(c.loaded_count(), 50);
        assert!(!c.is_loading());
        assert!(!c.is_observing());
        assert_eq!(c.surface().units.len(), 50);
        assert_eq!(c.surface().skeletons, None);
        assert_eq!(c.restore_from_cache(&dir("/p")).unwrap().items.len(), 50);

        gate.notify_one();
        let outcome = c.open_context(dir("/p"), SortSpec::default()).await;
        assert!(matches!(outcome, LoadOutcome::Restored));
        assert!(c.on_sentinel_visible().await.is_loaded());
        assert_eq!(c.loaded_count(), 100);
    }

    #[tokio::test]
    async fn test_adjacent_item_skips_rejected() {
        let fx = FixtureBuilder::new(ContextKind::Directory).build();
        let c = &fx.controller;
        let items = vec![
            media("/p/a.jpg"),
            MediaItem::new_folder("/p/sub"),
            media("/p/b.jpg"),
        ];
        c.start_for_context(dir("/p"), items, 3, SortSpec::default());

        let not_folder = |item: &MediaItem| !item.is_folder();
        let next = c.adjacent_item("/p/a.jpg", true, not_folder).unwrap();
        assert_eq!(next.path, "/p/b.jpg");
        let prev = c.adjacent_item("/p/b.jpg", false, not_folder).unwrap();
        assert_eq!(prev.path, "/p/a.jpg");
        assert!(c.adjacent_item("/p/b.jpg", true, not_folder).is_none());
        assert!(c.adjacent_item("/missing", true, not_folder).is_none());
    }

    #[test]
    fn test_phase_before_any_context() {
        let fx = FixtureBuilder::new(ContextKind::Search).build();
        assert_eq!(fx.controller.phase(), Phase::Uninitialized);
        assert_eq!(fx.controller.current_key(), None);
    }
}
