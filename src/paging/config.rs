use super::cache::DEFAULT_CACHE_CAPACITY;

/// Items requested per page.
pub const DEFAULT_PAGE_SIZE: usize = 50;

/// How far below the viewport edge the sentinel counts as visible, in pixels.
pub const DEFAULT_TRIGGER_MARGIN_PX: u32 = 800;

/// Placeholder tiles shown while a page is in flight.
pub const DEFAULT_SKELETON_COUNT: usize = 12;

/// Tunables of one controller instance. The defaults are what the gallery
/// ships with; tests shrink the cache to exercise eviction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagerConfig {
    pub page_size: usize,
    pub trigger_margin_px: u32,
    pub skeleton_count: usize,
    pub cache_capacity: usize,
}

impl Default for PagerConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            trigger_margin_px: DEFAULT_TRIGGER_MARGIN_PX,
            skeleton_count: DEFAULT_SKELETON_COUNT,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl PagerConfig {
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PagerConfig::default();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.trigger_margin_px, 800);
        assert_eq!(config.skeleton_count, 12);
        assert_eq!(config.cache_capacity, 20);
    }
}
