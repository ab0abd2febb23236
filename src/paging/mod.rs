//! Paginated list controller: state machine, context cache and the
//! orchestrator that ties them to a page source and a surface.

pub mod cache;
pub mod collaborators;
pub mod config;
pub mod controller;
pub mod state;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use cache::{CacheEntry, ContextCache};
pub use collaborators::{ItemRenderer, PageSource, SentinelObserver, StatusSink, Surface};
pub use config::PagerConfig;
pub use controller::{ListController, ListControllerBuilder, LoadOutcome, SkipReason};
pub use state::{PaginationState, Phase};
pub use stats::StatsLabel;
