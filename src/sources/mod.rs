//! Page sources bundled with the pager: a local directory lister, a local
//! filename search and a client for the gallery's HTTP listing API.

pub mod directory;
pub mod http;
pub mod search;

use std::cmp::Ordering;
use std::path::Path;
use std::sync::Arc;
use std::time::UNIX_EPOCH;

use parking_lot::Mutex;
use walkdir::DirEntry;

use crate::models::{ContextKey, MediaFilter, MediaItem, MediaType, SortField, SortOrder, SortSpec};

pub use crate::paging::PageSource;
pub use directory::DirectoryPageSource;
pub use http::HttpPageSource;
pub use search::SearchPageSource;

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .map(|name| name.starts_with('.'))
            .unwrap_or(false)
}

/// Builds an item for a walked entry. Files with an extension we don't know
/// are skipped.
fn item_for_entry(entry: &DirEntry) -> Option<MediaItem> {
    let path = entry.path();
    let path_str = path.to_str()?;

    let mut item = if entry.file_type().is_dir() {
        MediaItem::new_folder(path_str)
    } else {
        let media_type = path
            .extension()
            .and_then(|e| e.to_str())
            .and_then(MediaType::from_extension)?;
        MediaItem::new(path_str, media_type)
    };
    item.name = file_name(path);

    if let Ok(metadata) = entry.metadata() {
        item.mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0);
        if !item.is_folder() {
            item.size = metadata.len() as i64;
        }
    }
    Some(item)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

/// Applies `sort` to a listing: folders first, then files. Both groups use
/// the same ordering, ties broken by name. Folders survive every filter so
/// the tree stays navigable.
pub(crate) fn arrange(items: &mut Vec<MediaItem>, sort: SortSpec) {
    items.retain(|item| item.is_folder() || passes_filter(item, sort.filter));
    items.sort_by(|a, b| {
        b.is_folder()
            .cmp(&a.is_folder())
            .then_with(|| compare(a, b, sort))
    });
}

fn passes_filter(item: &MediaItem, filter: MediaFilter) -> bool {
    match filter {
        MediaFilter::All => true,
        MediaFilter::Images => item.media_type == MediaType::Image,
        MediaFilter::Videos => item.media_type == MediaType::Video,
        MediaFilter::Favorites => item.favorite,
    }
}

fn compare(a: &MediaItem, b: &MediaItem, sort: SortSpec) -> Ordering {
    let by_name = || {
        a.display_name()
            .to_lowercase()
            .cmp(&b.display_name().to_lowercase())
    };
    let ordering = match sort.field {
        SortField::Name => by_name(),
        SortField::Modified => a.mtime.cmp(&b.mtime).then_with(by_name),
        SortField::Size => a.size.cmp(&b.size).then_with(by_name),
    };
    match sort.order {
        SortOrder::Ascending => ordering,
        SortOrder::Descending => ordering.reverse(),
    }
}

/// The last arranged listing a source produced, so pages past the first
/// are cut from it instead of walking the filesystem again.
#[derive(Default)]
pub(crate) struct ListingMemo {
    last: Mutex<Option<(ContextKey, SortSpec, Arc<Vec<MediaItem>>)>>,
}

impl ListingMemo {
    pub(crate) fn get(&self, context: &ContextKey, sort: SortSpec) -> Option<Arc<Vec<MediaItem>>> {
        let last = self.last.lock();
        match last.as_ref() {
            Some((key, s, items)) if key == context && *s == sort => Some(Arc::clone(items)),
            _ => None,
        }
    }

    pub(crate) fn store(&self, context: ContextKey, sort: SortSpec, items: Vec<MediaItem>) -> Arc<Vec<MediaItem>> {
        let items = Arc::new(items);
        *self.last.lock() = Some((context, sort, Arc::clone(&items)));
        items
    }
}
