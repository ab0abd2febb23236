use super::context::{ContextKey, SortSpec};

/// Anything the pager can sequence: a cloneable descriptor with a stable key.
pub trait ListItem: Clone {
    fn key(&self) -> &str;
}

/// One request to a page source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub context: ContextKey,
    /// 1-based page number.
    pub page: u32,
    pub page_size: usize,
    pub sort: SortSpec,
}

impl PageRequest {
    /// Index of the first item of this page within the whole context.
    pub fn offset(&self) -> usize {
        (self.page.saturating_sub(1) as usize).saturating_mul(self.page_size)
    }
}

/// One batch of items plus the authoritative total for the context.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: usize,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_items: usize) -> Self {
        Self { items, total_items }
    }

    /// Cuts page `request.page` out of a fully materialized listing.
    pub fn slice_of(all: &[T], request: &PageRequest) -> Self
    where
        T: Clone,
    {
        let start = request.offset().min(all.len());
        let end = start.saturating_add(request.page_size).min(all.len());
        Self {
            items: all[start..end].to_vec(),
            total_items: all.len(),
        }
    }
}
