pub mod commands;
pub mod terminal;

pub use commands::*;
pub use terminal::*;
