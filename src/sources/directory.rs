//! Lists one local directory a page at a time.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::task;
use tracing::{debug, trace};
use walkdir::WalkDir;

use super::{arrange, is_hidden, item_for_entry, ListingMemo};
use crate::error::FetchError;
use crate::models::{MediaItem, Page, PageRequest, SortSpec};
use crate::paging::PageSource;

/// Page source over the local filesystem; the context key is the directory
/// path.
///
/// Page 1 always re-reads the directory, later pages are cut from the
/// listing page 1 produced.
#[derive(Default)]
pub struct DirectoryPageSource {
    memo: ListingMemo,
}

impl DirectoryPageSource {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait(?Send)]
impl PageSource<MediaItem> for DirectoryPageSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<MediaItem>, FetchError> {
        if request.page > 1 {
            if let Some(listing) = self.memo.get(&request.context, request.sort) {
                trace!(context = %request.context, page = request.page, "Serving page from memoized listing");
                return Ok(Page::slice_of(&listing, request));
            }
        }

        let dir = PathBuf::from(request.context.as_str());
        if !dir.is_dir() {
            return Err(FetchError::NotFound(request.context.to_string()));
        }

        let sort = request.sort;
        let items = task::spawn_blocking(move || list_directory(&dir, sort))
            .await
            .context("Directory listing task panicked")??;
        debug!(context = %request.context, items = items.len(), "Listed directory");

        let listing = self.memo.store(request.context.clone(), sort, items);
        Ok(Page::slice_of(&listing, request))
    }
}

/// Immediate children of `dir`, hidden entries skipped, arranged by `sort`.
fn list_directory(dir: &Path, sort: SortSpec) -> Result<Vec<MediaItem>> {
    let mut items = Vec::new();
    let walker = WalkDir::new(dir)
        .follow_links(false)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry));

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to read {}", dir.display()))?;
        if let Some(item) = item_for_entry(&entry) {
            items.push(item);
        }
    }

    arrange(&mut items, sort);
    Ok(items)
}
