//! Filename search below a root directory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::task;
use tracing::{debug, trace};
use walkdir::WalkDir;

use super::{arrange, is_hidden, item_for_entry, ListingMemo};
use crate::error::FetchError;
use crate::models::{normalize_query, MediaItem, Page, PageRequest, SortSpec};
use crate::paging::PageSource;

/// Page source for search contexts. The context key is the normalized query;
/// an item matches when every query term occurs in its lowercased file name.
/// Only media files are returned, never folders.
pub struct SearchPageSource {
    root: PathBuf,
    memo: ListingMemo,
}

impl SearchPageSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            memo: ListingMemo::default(),
        }
    }
}

#[async_trait(?Send)]
impl PageSource<MediaItem> for SearchPageSource {
    async fn fetch_page(&self, request: &PageRequest) -> Result<Page<MediaItem>, FetchError> {
        if request.page > 1 {
            if let Some(listing) = self.memo.get(&request.context, request.sort) {
                trace!(query = %request.context, page = request.page, "Serving page from memoized results");
                return Ok(Page::slice_of(&listing, request));
            }
        }

        if !self.root.is_dir() {
            return Err(FetchError::NotFound(self.root.display().to_string()));
        }

        let root = self.root.clone();
        let terms: Vec<String> = normalize_query(request.context.as_str())
            .split(' ')
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect();
        let sort = request.sort;
        let items = task::spawn_blocking(move || search_tree(&root, &terms, sort))
            .await
            .context("Search task panicked")??;
        debug!(query = %request.context, matches = items.len(), "Search finished");

        let listing = self.memo.store(request.context.clone(), sort, items);
        Ok(Page::slice_of(&listing, request))
    }
}

fn search_tree(root: &Path, terms: &[String], sort: SortSpec) -> Result<Vec<MediaItem>> {
    if terms.is_empty() {
        return Ok(Vec::new());
    }

    let mut items = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| !is_hidden(entry));

    for entry in walker {
        let entry = entry.with_context(|| format!("Failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Some(name) = entry.file_name().to_str() else {
            continue;
        };
        let name = name.to_lowercase();
        if !terms.iter().all(|term| name.contains(term.as_str())) {
            continue;
        }
        if let Some(item) = item_for_entry(&entry) {
            items.push(item);
        }
    }

    arrange(&mut items, sort);
    Ok(items)
}
