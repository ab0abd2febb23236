pub mod context;
pub mod media_item;
pub mod page;

pub use context::*;
pub use media_item::*;
pub use page::*;
