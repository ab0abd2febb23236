//! Paginated list controller for the idxd media gallery: incremental page
//! loading on scroll, a per-context snapshot cache, and the page sources the
//! gallery browses with.

pub mod error;
pub mod layout;
pub mod models;
pub mod paging;
pub mod sources;
pub mod ui;

pub use error::FetchError;
pub use models::{ContextKey, ContextKind, MediaItem, SortSpec};
pub use paging::{ListController, LoadOutcome, PagerConfig};
