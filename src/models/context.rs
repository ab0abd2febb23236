use std::fmt;

/// Identifies one browsing context: a directory path or a normalized query.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContextKey(String);

impl ContextKey {
    /// Key for a directory listing. Trailing slashes are dropped so `/a/` and
    /// `/a` share one cache slot.
    pub fn directory(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        if trimmed.is_empty() {
            Self("/".to_string())
        } else {
            Self(trimmed.to_string())
        }
    }

    /// Key for a search query; see [`normalize_query`].
    pub fn search(query: &str) -> Self {
        Self(normalize_query(query))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContextKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContextKey {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ContextKey {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Lowercases, trims and collapses inner whitespace.
pub fn normalize_query(query: &str) -> String {
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Which of the two pager instantiations a controller serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    Directory,
    Search,
}

impl ContextKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Directory => "directory",
            Self::Search => "search",
        }
    }

    /// Placeholder text for a context with no items at all.
    pub fn empty_message(self, key: &ContextKey) -> String {
        match self {
            Self::Directory => "This folder is empty".to_string(),
            Self::Search => format!("No results for \"{}\"", key),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortField {
    #[default]
    Name,
    Modified,
    Size,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Modified => "date",
            Self::Size => "size",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "name" => Some(Self::Name),
            "date" | "mtime" | "modified" => Some(Self::Modified),
            "size" => Some(Self::Size),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ascending => "asc",
            Self::Descending => "desc",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "asc" | "ascending" => Some(Self::Ascending),
            "desc" | "descending" => Some(Self::Descending),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum MediaFilter {
    #[default]
    All,
    Images,
    Videos,
    Favorites,
}

impl MediaFilter {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Images => "images",
            Self::Videos => "videos",
            Self::Favorites => "favorites",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "all" => Some(Self::All),
            "images" | "image" => Some(Self::Images),
            "videos" | "video" => Some(Self::Videos),
            "favorites" | "favourites" | "fav" => Some(Self::Favorites),
            _ => None,
        }
    }
}

/// Sort and filter parameters forwarded with every page request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
    pub filter: MediaFilter,
}

impl SortSpec {
    pub fn new(field: SortField, order: SortOrder) -> Self {
        Self {
            field,
            order,
            filter: MediaFilter::All,
        }
    }

    pub fn with_filter(mut self, filter: MediaFilter) -> Self {
        self.filter = filter;
        self
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})",
            self.field.as_str(),
            self.order.as_str(),
            self.filter.as_str()
        )
    }
}
