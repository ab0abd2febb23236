//! Line-oriented stand-ins for the gallery's grid, sentinel and status bar.
//!
//! The surface keeps its own notion of a viewport measured in pixels so that
//! scroll offsets and the sentinel margin mean the same thing they do in the
//! graphical grid: every printed row is [`ROW_HEIGHT_PX`] tall and the
//! viewport shows [`VIEWPORT_HEIGHT_PX`] of it.

use std::cell::Cell;
use std::io::Write;
use std::rc::Rc;

use crate::layout::skeleton_rows;
use crate::models::{MediaItem, MediaType};
use crate::paging::{ItemRenderer, SentinelObserver, StatsLabel, StatusSink, Surface};

pub const ROW_HEIGHT_PX: f64 = 40.0;
pub const VIEWPORT_HEIGHT_PX: f64 = 800.0;
pub const DEFAULT_VIEWPORT_WIDTH_PX: f64 = 1280.0;

/// One line per item: type tag, name, a star for favorites.
pub struct TextRenderer;

impl ItemRenderer<MediaItem> for TextRenderer {
    type Unit = String;

    fn render(&self, item: &MediaItem) -> String {
        let tag = match item.media_type {
            MediaType::Folder => "dir",
            MediaType::Image => "img",
            MediaType::Video => "vid",
            MediaType::Audio => "aud",
            MediaType::Other => "   ",
        };
        let mut line = format!("[{}] {}", tag, item.display_name());
        if item.is_folder() {
            line.push('/');
        }
        if item.favorite {
            line.push_str(" ★");
        }
        line
    }
}

pub struct TerminalSurface<W: Write> {
    out: W,
    rows: usize,
    scroll: f64,
    width: f64,
    skeletons_shown: bool,
    load_more_visible: bool,
}

impl<W: Write> TerminalSurface<W> {
    pub fn new(out: W) -> Self {
        Self::with_width(out, DEFAULT_VIEWPORT_WIDTH_PX)
    }

    pub fn with_width(out: W, width: f64) -> Self {
        Self {
            out,
            rows: 0,
            scroll: 0.0,
            width,
            skeletons_shown: false,
            load_more_visible: false,
        }
    }

    /// Moves the viewport down by one screen, clamped to the content.
    pub fn scroll_page(&mut self) {
        let content = self.rows as f64 * ROW_HEIGHT_PX;
        let max = (content - VIEWPORT_HEIGHT_PX).max(0.0);
        self.scroll = (self.scroll + VIEWPORT_HEIGHT_PX).min(max);
    }

    /// Whether the sentinel under the last row lies within the viewport
    /// grown by `margin_px` at the bottom.
    pub fn sentinel_within(&self, margin_px: u32) -> bool {
        let sentinel = self.rows as f64 * ROW_HEIGHT_PX;
        sentinel <= self.scroll + VIEWPORT_HEIGHT_PX + f64::from(margin_px)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn load_more_visible(&self) -> bool {
        self.load_more_visible
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Surface<String> for TerminalSurface<W> {
    fn clear(&mut self) {
        self.rows = 0;
        self.scroll = 0.0;
        let _ = writeln!(self.out, "{}", "─".repeat(40));
    }

    fn append(&mut self, unit: String) {
        self.rows += 1;
        let _ = writeln!(self.out, "{:>5}  {}", self.rows, unit);
    }

    fn show_empty(&mut self, message: &str) {
        let _ = writeln!(self.out, "       {}", message);
    }

    fn show_skeletons(&mut self, count: usize, per_row: usize) {
        self.skeletons_shown = true;
        let per_row = per_row.max(1);
        for row in 0..skeleton_rows(count, per_row) {
            let tiles = per_row.min(count - row * per_row);
            let _ = writeln!(self.out, "       {}", vec!["░░░"; tiles].join(" "));
        }
    }

    fn hide_skeletons(&mut self) {
        self.skeletons_shown = false;
    }

    fn set_load_more_visible(&mut self, visible: bool) {
        if visible && !self.load_more_visible {
            let _ = writeln!(self.out, "       ── more: scroll or type `more` ──");
        }
        self.load_more_visible = visible;
    }

    fn set_retry_visible(&mut self, visible: bool) {
        if visible {
            let _ = writeln!(self.out, "       !! loading failed, type `retry`");
        }
    }

    fn scroll_offset(&self) -> f64 {
        self.scroll
    }

    fn set_scroll_offset(&mut self, offset: f64) {
        self.scroll = offset.max(0.0);
        let row = (self.scroll / ROW_HEIGHT_PX) as usize + 1;
        let _ = writeln!(self.out, "       (back at item {})", row.min(self.rows.max(1)));
    }

    fn viewport_width(&self) -> f64 {
        self.width
    }
}

/// Remembers whether the sentinel is being watched, and with which margin.
/// The input loop asks it after every scroll.
#[derive(Clone, Default)]
pub struct TerminalObserver {
    margin: Rc<Cell<Option<u32>>>,
}

impl TerminalObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn margin(&self) -> Option<u32> {
        self.margin.get()
    }
}

impl SentinelObserver for TerminalObserver {
    fn observe(&mut self, margin_px: u32) {
        self.margin.set(Some(margin_px));
    }

    fn unobserve(&mut self) {
        self.margin.set(None);
    }
}

pub struct TerminalStatus<W: Write> {
    out: W,
}

impl<W: Write> TerminalStatus<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }
}

impl<W: Write> StatusSink for TerminalStatus<W> {
    fn show(&mut self, label: &StatsLabel) {
        let _ = writeln!(self.out, "  [{}]", label);
    }
}
