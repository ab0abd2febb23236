//! Seams between the pager and the outside world.
//!
//! All of these are resolved once, when a controller is built. The renderer
//! and surface are required; the observer and status sink are optional and
//! the controller degrades to the manual "load more" control and no status
//! line when they are absent.

use async_trait::async_trait;

use super::stats::StatsLabel;
use crate::error::FetchError;
use crate::models::{Page, PageRequest};

/// Backend that knows how to produce one page of a context.
///
/// Runs on the single control thread; futures need not be `Send`.
#[async_trait(?Send)]
pub trait PageSource<T> {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<T>, FetchError>;
}

/// Turns one item into something the surface can display.
pub trait ItemRenderer<T> {
    type Unit;

    fn render(&self, item: &T) -> Self::Unit;
}

/// The output area the rendered units live in, plus the loading affordances
/// around it.
pub trait Surface<U> {
    fn clear(&mut self);
    fn append(&mut self, unit: U);
    fn show_empty(&mut self, message: &str);

    /// Shows `count` placeholder tiles laid out `per_row` to a row.
    fn show_skeletons(&mut self, count: usize, per_row: usize);
    fn hide_skeletons(&mut self);

    fn set_load_more_visible(&mut self, visible: bool);
    fn set_retry_visible(&mut self, visible: bool);

    /// Called after every mutation of the rendered set.
    fn refresh_icons(&mut self) {}
    /// Called after every mutation of the rendered set.
    fn reconcile_selection(&mut self) {}

    fn scroll_offset(&self) -> f64;
    fn set_scroll_offset(&mut self, offset: f64);
    fn viewport_width(&self) -> f64;
}

/// Viewport-intersection primitive watching the sentinel below the last tile.
///
/// The host calls `ListController::on_sentinel_visible` when the sentinel
/// enters the viewport grown by `margin_px`.
pub trait SentinelObserver {
    fn observe(&mut self, margin_px: u32);
    fn unobserve(&mut self);
}

/// Receives the "Showing N of M" line.
pub trait StatusSink {
    fn show(&mut self, label: &StatsLabel);
}
