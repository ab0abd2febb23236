//! Fakes for driving a controller in tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use async_trait::async_trait;
use tokio::sync::Notify;

use super::collaborators::{ItemRenderer, PageSource, SentinelObserver, StatusSink, Surface};
use super::config::PagerConfig;
use super::controller::ListController;
use super::stats::StatsLabel;
use crate::error::FetchError;
use crate::models::{ContextKey, ContextKind, MediaItem, MediaType, Page, PageRequest};

pub(crate) fn media(path: &str) -> MediaItem {
    MediaItem::new(path, MediaType::Image)
}

pub(crate) fn media_range(prefix: &str, range: std::ops::Range<usize>) -> Vec<MediaItem> {
    range.map(|i| media(&format!("{}/{:04}.jpg", prefix, i))).collect()
}

type Scripted = VecDeque<Result<Page<MediaItem>, FetchError>>;

/// Test-side view of what the fake source was asked and will answer.
#[derive(Clone, Default)]
pub(crate) struct SourceHandle {
    requests: Rc<RefCell<Vec<PageRequest>>>,
    scripted: Rc<RefCell<Scripted>>,
}

impl SourceHandle {
    pub(crate) fn push_page(&self, items: Vec<MediaItem>, total_items: usize) {
        self.scripted
            .borrow_mut()
            .push_back(Ok(Page::new(items, total_items)));
    }

    pub(crate) fn push_error(&self, err: FetchError) {
        self.scripted.borrow_mut().push_back(Err(err));
    }

    pub(crate) fn calls(&self) -> usize {
        self.requests.borrow().len()
    }

    pub(crate) fn requests(&self) -> Vec<PageRequest> {
        self.requests.borrow().clone()
    }
}

/// Answers scripted responses first, then slices of `catalog`.
pub(crate) struct FakeSource {
    handle: SourceHandle,
    catalog: HashMap<ContextKey, Vec<MediaItem>>,
    gate: Option<Rc<Notify>>,
}

#[async_trait(?Send)]
impl PageSource<MediaItem> for FakeSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<MediaItem>, FetchError> {
        self.handle.requests.borrow_mut().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        let scripted = self.handle.scripted.borrow_mut().pop_front();
        if let Some(response) = scripted {
            return response;
        }
        match self.catalog.get(&request.context) {
            Some(all) => Ok(Page::slice_of(all, request)),
            None => Err(FetchError::NotFound(request.context.to_string())),
        }
    }
}

pub(crate) struct PathRenderer;

impl ItemRenderer<MediaItem> for PathRenderer {
    type Unit = String;

    fn render(&self, item: &MediaItem) -> String {
        item.path.clone()
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingSurface {
    pub units: Vec<String>,
    pub empty_message: Option<String>,
    pub skeletons: Option<(usize, usize)>,
    pub skeleton_shows: usize,
    pub load_more_visible: bool,
    pub retry_visible: bool,
    pub scroll: f64,
    pub width: f64,
    pub clears: usize,
    pub icon_refreshes: usize,
    pub selection_reconciles: usize,
}

impl Surface<String> for RecordingSurface {
    fn clear(&mut self) {
        self.units.clear();
        self.empty_message = None;
        self.clears += 1;
    }

    fn append(&mut self, unit: String) {
        self.empty_message = None;
        self.units.push(unit);
    }

    fn show_empty(&mut self, message: &str) {
        self.empty_message = Some(message.to_string());
    }

    fn show_skeletons(&mut self, count: usize, per_row: usize) {
        self.skeletons = Some((count, per_row));
        self.skeleton_shows += 1;
    }

    fn hide_skeletons(&mut self) {
        self.skeletons = None;
    }

    fn set_load_more_visible(&mut self, visible: bool) {
        self.load_more_visible = visible;
    }

    fn set_retry_visible(&mut self, visible: bool) {
        self.retry_visible = visible;
    }

    fn refresh_icons(&mut self) {
        self.icon_refreshes += 1;
    }

    fn reconcile_selection(&mut self) {
        self.selection_reconciles += 1;
    }

    fn scroll_offset(&self) -> f64 {
        self.scroll
    }

    fn set_scroll_offset(&mut self, offset: f64) {
        self.scroll = offset;
    }

    fn viewport_width(&self) -> f64 {
        self.width
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ObserverEvent {
    Observe(u32),
    Unobserve,
}

pub(crate) struct RecordingObserver(Rc<RefCell<Vec<ObserverEvent>>>);

impl SentinelObserver for RecordingObserver {
    fn observe(&mut self, margin_px: u32) {
        self.0.borrow_mut().push(ObserverEvent::Observe(margin_px));
    }

    fn unobserve(&mut self) {
        self.0.borrow_mut().push(ObserverEvent::Unobserve);
    }
}

pub(crate) struct RecordingStatus(Rc<RefCell<Vec<String>>>);

impl StatusSink for RecordingStatus {
    fn show(&mut self, label: &StatsLabel) {
        self.0.borrow_mut().push(label.to_string());
    }
}

pub(crate) type TestController = ListController<MediaItem, PathRenderer, RecordingSurface>;

pub(crate) struct Fixture {
    pub controller: TestController,
    pub source: SourceHandle,
    pub observer: Rc<RefCell<Vec<ObserverEvent>>>,
    pub status: Rc<RefCell<Vec<String>>>,
}

pub(crate) struct FixtureBuilder {
    kind: ContextKind,
    config: PagerConfig,
    catalog: HashMap<ContextKey, Vec<MediaItem>>,
    gate: Option<Rc<Notify>>,
    commit: Option<String>,
    with_observer: bool,
}

impl FixtureBuilder {
    pub(crate) fn new(kind: ContextKind) -> Self {
        Self {
            kind,
            config: PagerConfig::default(),
            catalog: HashMap::new(),
            gate: None,
            commit: None,
            with_observer: true,
        }
    }

    pub(crate) fn config(mut self, config: PagerConfig) -> Self {
        self.config = config;
        self
    }

    pub(crate) fn context(mut self, key: ContextKey, items: Vec<MediaItem>) -> Self {
        self.catalog.insert(key, items);
        self
    }

    pub(crate) fn gate(mut self, gate: Rc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub(crate) fn commit(mut self, commit: &str) -> Self {
        self.commit = Some(commit.to_string());
        self
    }

    pub(crate) fn without_observer(mut self) -> Self {
        self.with_observer = false;
        self
    }

    pub(crate) fn build(self) -> Fixture {
        let source = SourceHandle::default();
        let observer = Rc::new(RefCell::new(Vec::new()));
        let status = Rc::new(RefCell::new(Vec::new()));

        let fake = FakeSource {
            handle: source.clone(),
            catalog: self.catalog,
            gate: self.gate,
        };
        let surface = RecordingSurface {
            width: 1280.0,
            ..Default::default()
        };

        let mut builder = ListController::builder(self.kind, Box::new(fake), PathRenderer, surface)
            .config(self.config)
            .status(Box::new(RecordingStatus(Rc::clone(&status))))
            .commit(self.commit);
        if self.with_observer {
            builder = builder.observer(Box::new(RecordingObserver(Rc::clone(&observer))));
        }

        Fixture {
            controller: builder.build(),
            source,
            observer,
            status,
        }
    }
}
